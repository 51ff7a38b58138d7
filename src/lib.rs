// Memory Bridge: shared fragment store for cooperating models.
//
// Layers:
//   atoms/   constants, data model, errors (pure)
//   engine/  tokenizer, compression, scoring, persistence, store, bridge
//
// Construct one `FragmentStore` per process and pass it to whoever needs it:
//
//   let store = FragmentStore::open(BridgeConfig::from_env())?;
//   let f = store.create_fragment(FragmentDraft::new("Gabriela built the bridge", "claude"))?;
//   store.store(&f)?;
//   let hits = store.retrieve("gabriela bridge", None, 5);

pub mod atoms;
pub mod engine;

pub use atoms::error::{BridgeError, BridgeResult};
pub use atoms::types::{BridgeStats, FragmentDraft, IndexEntry, MemoryFragment, PersistEvent};
pub use engine::{BridgeConfig, Compressor, FragmentStore};

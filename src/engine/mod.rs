// ── Bridge Engine ───────────────────────────────────────────────────────────
//
// Stateful components, leaf-first:
//   - tokenizer:   lowercase word tokens
//   - compression: opaque content → payload transform (Compressor trait)
//   - scoring:     importance (fixed at creation) and Jaccard relevance
//   - persistence: JSON record sink + bounded write-behind queue
//   - store:       FragmentStore, the owner of all fragments
//   - bridge:      Claude ⇄ Wes hand-off helpers
//   - config:      BridgeConfig (TOML + env)

pub mod bridge;
pub mod compression;
pub mod config;
pub mod persistence;
pub mod scoring;
pub mod store;
pub mod tokenizer;

pub use bridge::{bridge_from_wes, bridge_to_wes};
pub use compression::{CompressionRequest, Compressor, LirCompressor};
pub use config::BridgeConfig;
pub use persistence::{PersistQueue, PersistenceSink};
pub use scoring::{importance_score, is_flagged, relevance};
pub use store::FragmentStore;
pub use tokenizer::tokenize;

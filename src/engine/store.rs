// ── Bridge Engine: Fragment Store ──────────────────────────────────────────
//
// Authoritative in-memory home of every memory fragment.
//
//   create_fragment: compress + score + stamp; mutates no shared state
//   store:           insert into fragments + index under one write lock,
//                    then hand a copy to the persistence queue
//   retrieve:        Jaccard token overlap × importance, top-K
//   stats:           snapshot aggregated from the index
//
// Locking: one RwLock guards the fragment map, the index and the insertion
// order together, so the three never disagree. The lock is never held
// across compression or disk I/O.

use crate::atoms::constants::{ACTOR_CLAUDE, ID_SUFFIX_LEN};
use crate::atoms::error::{BridgeError, BridgeResult};
use crate::atoms::types::{BridgeStats, FragmentDraft, IndexEntry, MemoryFragment, PersistEvent};
use crate::engine::compression::{CompressionRequest, Compressor, LirCompressor};
use crate::engine::config::BridgeConfig;
use crate::engine::persistence::{is_safe_record_id, PersistQueue, PersistenceSink};
use crate::engine::scoring::{importance_score, is_flagged, relevance};
use crate::engine::tokenizer::tokenize;
use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::broadcast;

/// Everything the lock protects.
#[derive(Debug, Default)]
struct Shelf {
    fragments: HashMap<String, MemoryFragment>,
    index: HashMap<String, IndexEntry>,
    /// Ids in first-insertion order. Ranking ties resolve in this order.
    order: Vec<String>,
}

impl Shelf {
    /// Insert a fragment under its id. Returns `false` if the identical
    /// fragment is already present; a different fragment under a stored id
    /// is rejected and nothing changes.
    fn insert(&mut self, fragment: &MemoryFragment) -> BridgeResult<bool> {
        if let Some(existing) = self.fragments.get(&fragment.id) {
            if existing == fragment {
                return Ok(false);
            }
            return Err(BridgeError::Storage(format!(
                "fragment {} is already stored with different contents",
                fragment.id
            )));
        }

        let fault = |e: std::collections::TryReserveError| BridgeError::Storage(e.to_string());
        self.fragments.try_reserve(1).map_err(fault)?;
        self.index.try_reserve(1).map_err(fault)?;
        self.order.try_reserve(1).map_err(fault)?;

        let id = fragment.id.clone();
        self.index.insert(id.clone(), IndexEntry::from(fragment));
        self.fragments.insert(id.clone(), fragment.clone());
        self.order.push(id);
        Ok(true)
    }
}

/// The memory bridge's fragment store. Share it behind an `Arc`.
pub struct FragmentStore {
    config: BridgeConfig,
    compressor: Box<dyn Compressor>,
    shelf: RwLock<Shelf>,
    persist: PersistQueue,
    session_id: String,
}

impl FragmentStore {
    /// Open a store with the built-in compressor.
    pub fn open(config: BridgeConfig) -> BridgeResult<Self> {
        Self::with_compressor(config, LirCompressor)
    }

    /// Open a store that compresses through `compressor`.
    pub fn with_compressor(
        config: BridgeConfig,
        compressor: impl Compressor + 'static,
    ) -> BridgeResult<Self> {
        config.validate()?;
        let sink = PersistenceSink::open(&config.storage_dir)?;
        let persist = PersistQueue::new(sink, config.persist_workers, config.event_capacity)?;
        let session_id = format!("{}_{}", ACTOR_CLAUDE, Utc::now().timestamp());

        info!(
            "[bridge] Memory bridge activated: storage={} session={}",
            config.storage_dir.display(),
            session_id
        );

        Ok(Self {
            config,
            compressor: Box::new(compressor),
            shelf: RwLock::new(Shelf::default()),
            persist,
            session_id,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn storage_dir(&self) -> &Path {
        self.persist.sink().dir()
    }

    // ── Create ─────────────────────────────────────────────────────────────

    /// Build a fully scored fragment from a draft. Nothing is stored.
    ///
    /// Fails with `BridgeError::Compression` if the compressor fails; no
    /// fragment exists in that case.
    pub fn create_fragment(&self, draft: FragmentDraft) -> BridgeResult<MemoryFragment> {
        let request = CompressionRequest::from_draft(&draft);
        let payload = self.compressor.compress(&request).map_err(|e| match e {
            BridgeError::Compression(_) => e,
            other => BridgeError::compression(other.to_string()),
        })?;

        let importance = importance_score(
            &draft.content,
            draft.emotion.as_deref(),
            draft.intent.as_deref(),
        );
        let flagged = is_flagged(&draft.content);
        let id = self.fresh_id(&draft.source_actor);

        Ok(MemoryFragment {
            id,
            source_actor: draft.source_actor,
            target_actor: draft.target_actor,
            content: draft.content,
            compressed_payload: Some(payload),
            emotion: draft.emotion,
            intent: draft.intent,
            context: draft.context,
            created_at: Utc::now().to_rfc3339(),
            importance_score: importance,
            flagged,
        })
    }

    /// `<actor>_<8 hex>`, re-rolled while it clashes with a stored id.
    ///
    /// Characters of the actor other than alphanumerics, `-` and `_` become
    /// `_` so the id is always a plain file name.
    fn fresh_id(&self, source_actor: &str) -> String {
        let prefix: String = source_actor
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        loop {
            let suffix: String = uuid::Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(ID_SUFFIX_LEN)
                .collect();
            let id = format!("{}_{}", prefix, suffix);
            if !self.shelf.read().fragments.contains_key(&id) {
                return id;
            }
            debug!("[bridge] Id collision on {}, re-rolling", id);
        }
    }

    // ── Store ──────────────────────────────────────────────────────────────

    /// Insert a fragment into memory, then schedule its durable write.
    ///
    /// Returns once the in-memory insert is committed. A later write failure
    /// shows up only on the persistence channel and in `stats()`. Storing the
    /// same fragment again is a no-op; storing a different fragment under an
    /// already stored id fails with `BridgeError::Storage`.
    pub fn store(&self, fragment: &MemoryFragment) -> BridgeResult<()> {
        if !is_safe_record_id(&fragment.id) {
            return Err(BridgeError::Storage(format!(
                "fragment id {:?} is not a valid record name",
                fragment.id
            )));
        }
        if fragment.source_actor.is_empty() {
            return Err(BridgeError::Storage(format!(
                "fragment {} has no source actor",
                fragment.id
            )));
        }

        let inserted = self.shelf.write().insert(fragment)?;
        if !inserted {
            debug!("[bridge] {} already stored, skipping", fragment.id);
            return Ok(());
        }

        self.persist.submit(fragment.clone());

        info!(
            "[bridge] Stored {} ({}) score={:.2}{}",
            fragment.id,
            fragment.source_actor,
            fragment.importance_score,
            if fragment.flagged { " flagged" } else { "" }
        );
        Ok(())
    }

    // ── Retrieve ───────────────────────────────────────────────────────────

    /// Up to `max_results` fragments relevant to `query`, best first.
    ///
    /// A fragment qualifies when its Jaccard relevance to the query exceeds
    /// the configured threshold; qualifiers are ranked by
    /// `relevance × importance_score`, ties in insertion order. Never fails.
    pub fn retrieve(
        &self,
        query: &str,
        source_filter: Option<&str>,
        max_results: usize,
    ) -> Vec<MemoryFragment> {
        if max_results == 0 {
            return Vec::new();
        }
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }
        let threshold = self.config.relevance_threshold;

        let mut hits: Vec<(f64, MemoryFragment)> = {
            let shelf = self.shelf.read();
            shelf
                .order
                .iter()
                .filter_map(|id| shelf.fragments.get(id))
                .filter(|f| source_filter.map_or(true, |actor| f.source_actor == actor))
                .filter_map(|f| {
                    let r = relevance(&query_tokens, &tokenize(&f.content));
                    (r > threshold).then(|| (r * f.importance_score, f.clone()))
                })
                .collect()
        };

        // sort_by is stable: equal ranks keep insertion order.
        hits.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        hits.truncate(max_results);

        debug!(
            "[bridge] Retrieve '{}' filter={:?}: {} results",
            query.chars().take(80).collect::<String>(),
            source_filter,
            hits.len()
        );
        hits.into_iter().map(|(_, f)| f).collect()
    }

    /// `retrieve` with no actor filter and the configured result count.
    pub fn recall(&self, query: &str) -> Vec<MemoryFragment> {
        self.retrieve(query, None, self.config.default_max_results)
    }

    /// Copy of one stored fragment.
    pub fn get(&self, id: &str) -> Option<MemoryFragment> {
        self.shelf.read().fragments.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.shelf.read().fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Stats & persistence ────────────────────────────────────────────────

    /// Aggregate snapshot. Later stores do not change a returned value.
    pub fn stats(&self) -> BridgeStats {
        let (total_count, active_source_actors, flagged_count) = {
            let shelf = self.shelf.read();
            (
                shelf.fragments.len(),
                shelf.index.values().map(|e| e.source_actor.clone()).collect(),
                shelf.index.values().filter(|e| e.flagged).count(),
            )
        };

        BridgeStats {
            total_count,
            active_source_actors,
            flagged_count,
            storage_path: self.storage_dir().to_path_buf(),
            session_id: self.session_id.clone(),
            persisted_count: self.persist.persisted_count(),
            persist_failures: self.persist.failure_count(),
            pending_writes: self.persist.pending(),
        }
    }

    /// Outcomes of durable writes scheduled after this call.
    pub fn subscribe_persistence(&self) -> broadcast::Receiver<PersistEvent> {
        self.persist.subscribe()
    }

    /// Block until all scheduled durable writes have finished.
    pub fn flush_persistence(&self) {
        self.persist.flush();
        let failures = self.persist.failure_count();
        if failures > 0 {
            warn!("[bridge] {} durable writes have failed this session", failures);
        }
    }

    /// Read a fragment's durable record back from disk.
    pub fn load_record(&self, id: &str) -> BridgeResult<MemoryFragment> {
        self.persist.sink().load(id)
    }
}

// ── Bridge Atoms: Data Model ───────────────────────────────────────────────
// Plain data types shared by every engine component. Serialization order of
// `MemoryFragment` is the on-disk record order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

// ═════════════════════════════════════════════════════════════════════════════
// Fragments
// ═════════════════════════════════════════════════════════════════════════════

/// One immutable unit of recorded content plus metadata and derived scores.
///
/// Fragments are never mutated once stored; an update is a new fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFragment {
    /// `<source_actor>_<8 hex chars>`, unique within one store.
    pub id: String,
    /// Originating actor ("claude", "wes", "caelen", ...).
    pub source_actor: String,
    pub target_actor: Option<String>,
    pub content: String,
    /// Opaque output of the compression transform. Never inspected here.
    pub compressed_payload: Option<serde_json::Value>,
    pub emotion: Option<String>,
    pub intent: Option<String>,
    pub context: Option<String>,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// In [0.0, 10.0], computed once at creation.
    pub importance_score: f64,
    /// Content mentions a marker name.
    pub flagged: bool,
}

/// Lightweight projection kept alongside each stored fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub source_actor: String,
    pub created_at: String,
    pub importance_score: f64,
    pub flagged: bool,
}

impl From<&MemoryFragment> for IndexEntry {
    fn from(f: &MemoryFragment) -> Self {
        Self {
            source_actor: f.source_actor.clone(),
            created_at: f.created_at.clone(),
            importance_score: f.importance_score,
            flagged: f.flagged,
        }
    }
}

/// Input to `FragmentStore::create_fragment`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentDraft {
    pub content: String,
    pub source_actor: String,
    pub emotion: Option<String>,
    pub intent: Option<String>,
    pub context: Option<String>,
    pub target_actor: Option<String>,
}

impl FragmentDraft {
    pub fn new(content: impl Into<String>, source_actor: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_actor: source_actor.into(),
            ..Default::default()
        }
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(emotion.into());
        self
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_target(mut self, target_actor: impl Into<String>) -> Self {
        self.target_actor = Some(target_actor.into());
        self
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Statistics & observability
// ═════════════════════════════════════════════════════════════════════════════

/// Point-in-time snapshot returned by `FragmentStore::stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeStats {
    pub total_count: usize,
    pub active_source_actors: BTreeSet<String>,
    pub flagged_count: usize,
    pub storage_path: PathBuf,
    pub session_id: String,
    /// Durable writes that completed successfully.
    pub persisted_count: u64,
    /// Durable writes that failed (never retried).
    pub persist_failures: u64,
    /// Writes submitted but not yet finished.
    pub pending_writes: usize,
}

/// Outcome of one durable write, published on the persistence channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistEvent {
    Persisted { id: String, path: PathBuf },
    Failed { id: String, error: String },
}

impl PersistEvent {
    pub fn id(&self) -> &str {
        match self {
            PersistEvent::Persisted { id, .. } | PersistEvent::Failed { id, .. } => id,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PersistEvent::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryFragment {
        MemoryFragment {
            id: "wes_00ff00ff".into(),
            source_actor: "wes".into(),
            target_actor: None,
            content: "Grüße aus Köln".into(),
            compressed_payload: None,
            emotion: Some("freude".into()),
            intent: None,
            context: None,
            created_at: "2026-10-14T09:00:00+00:00".into(),
            importance_score: 3.25,
            flagged: false,
        }
    }

    #[test]
    fn index_entry_mirrors_fragment() {
        let f = sample();
        let entry = IndexEntry::from(&f);
        assert_eq!(entry.source_actor, "wes");
        assert_eq!(entry.created_at, f.created_at);
        assert_eq!(entry.importance_score, 3.25);
        assert!(!entry.flagged);
    }

    #[test]
    fn absent_fields_serialize_as_null() {
        let v = serde_json::to_value(sample()).unwrap();
        assert!(v["target_actor"].is_null());
        assert!(v["compressed_payload"].is_null());
        assert_eq!(v["emotion"], "freude");
    }

    #[test]
    fn draft_builder_sets_optional_fields() {
        let d = FragmentDraft::new("hello", "claude")
            .with_intent("bridge")
            .with_target("wes");
        assert_eq!(d.intent.as_deref(), Some("bridge"));
        assert_eq!(d.target_actor.as_deref(), Some("wes"));
        assert!(d.emotion.is_none());
    }

    #[test]
    fn persist_event_accessors() {
        let ok = PersistEvent::Persisted { id: "a".into(), path: PathBuf::from("/tmp/a.json") };
        let bad = PersistEvent::Failed { id: "b".into(), error: "boom".into() };
        assert_eq!(ok.id(), "a");
        assert!(!ok.is_failure());
        assert!(bad.is_failure());
    }
}

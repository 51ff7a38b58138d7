// ── Bridge Atoms: Constants ────────────────────────────────────────────────
// All named constants for the crate live here, so scoring weights and
// storage conventions can be audited in one place.

// ── Marker names ──────────────────────────────────────────────────────────
// A fragment whose content mentions either name (case-insensitive substring)
// is flagged and receives the marker bonus. "gabriel" is a prefix of
// "gabriela", so either spelling matches.
pub const MARKER_NAMES: [&str; 2] = ["gabriela", "gabriel"];

// ── Importance scoring ────────────────────────────────────────────────────
pub const HIGH_INTENSITY_EMOTIONS: [&str; 5] = ["love", "liebe", "angst", "freude", "trauer"];
pub const IMPORTANT_INTENTS: [&str; 3] = ["memory_store", "bridge", "gabriela"];

pub const IMPORTANCE_BASE: f64 = 1.0;
/// Characters of content per +1.0 importance.
pub const IMPORTANCE_LENGTH_DIVISOR: f64 = 100.0;
pub const IMPORTANCE_EMOTION_BONUS: f64 = 2.0;
pub const IMPORTANCE_INTENT_BONUS: f64 = 1.5;
pub const IMPORTANCE_MARKER_BONUS: f64 = 5.0;
pub const IMPORTANCE_MAX: f64 = 10.0;

// ── Retrieval ─────────────────────────────────────────────────────────────
/// Fragments must score strictly above this relevance to be returned.
pub const RELEVANCE_THRESHOLD: f64 = 0.1;
pub const DEFAULT_MAX_RESULTS: usize = 5;

// ── Compression request defaults ──────────────────────────────────────────
pub const DEFAULT_COMPRESSION_INTENT: &str = "memory_store";
pub const COMPRESSION_OUTPUT_MODE: &str = "compressed";
/// Upper bound on distinct key tokens kept in a compressed payload.
pub const COMPRESSION_MAX_KEYS: usize = 16;
/// Hex chars of the SHA-256 content digest kept in a compressed payload.
pub const COMPRESSION_DIGEST_LEN: usize = 16;

// ── Persistence ───────────────────────────────────────────────────────────
pub const DEFAULT_PERSIST_WORKERS: usize = 3;
pub const PERSIST_THREAD_PREFIX: &str = "memory_bridge";
pub const DEFAULT_EVENT_CAPACITY: usize = 256;
pub const RECORD_EXTENSION: &str = "json";
/// Overrides `BridgeConfig::storage_dir` when set.
pub const STORAGE_DIR_ENV: &str = "MEMORY_BRIDGE_DIR";

// ── Identity ──────────────────────────────────────────────────────────────
pub const ACTOR_CLAUDE: &str = "claude";
pub const ACTOR_WES: &str = "wes";
/// Hex chars of the random suffix in a fragment id (`<actor>_<suffix>`).
pub const ID_SUFFIX_LEN: usize = 8;

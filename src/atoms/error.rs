// ── Bridge Atoms: Error Types ──────────────────────────────────────────────
// Single canonical error enum for the bridge, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by failure site (compression, in-memory
//     store, durable write, config, I/O).
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • `Persistence` is only ever published on the persistence event channel;
//     no public operation returns it to a caller.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The compression collaborator failed; the fragment was not created.
    #[error("Compression error: {0}")]
    Compression(String),

    /// The in-memory critical section of `store` could not complete.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A durable write failed for one fragment.
    #[error("Persistence error: {id}: {message}")]
    Persistence { id: String, message: String },

    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bridge configuration is invalid or unreadable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenience constructors ───────────────────────────────────────────────

impl BridgeError {
    /// Create a compression error from any message.
    pub fn compression(message: impl Into<String>) -> Self {
        Self::Compression(message.into())
    }

    /// Create a persistence error for a fragment id.
    pub fn persistence(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence { id: id.into(), message: message.into() }
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(e: toml::de::Error) -> Self {
        BridgeError::Config(e.to_string())
    }
}

// ── String bridges ─────────────────────────────────────────────────────────

impl From<String> for BridgeError {
    fn from(s: String) -> Self {
        BridgeError::Other(s)
    }
}

impl From<&str> for BridgeError {
    fn from(s: &str) -> Self {
        BridgeError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All bridge operations return this type.
pub type BridgeResult<T> = Result<T, BridgeError>;

impl From<BridgeError> for String {
    fn from(e: BridgeError) -> Self {
        e.to_string()
    }
}

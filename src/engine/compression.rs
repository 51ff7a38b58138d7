// ── Bridge Engine: Compression Transform ───────────────────────────────────
//
// The store hands each new fragment's content and tags to a `Compressor` and
// keeps whatever JSON value comes back as `compressed_payload`. The payload is
// opaque to the store: nothing reads it back.
//
// `LirCompressor` is the built-in transform. It keeps the tags, the distinct
// key tokens in first-seen order, a token count and a short content digest.

use crate::atoms::constants::{
    COMPRESSION_DIGEST_LEN, COMPRESSION_MAX_KEYS, COMPRESSION_OUTPUT_MODE,
    DEFAULT_COMPRESSION_INTENT,
};
use crate::atoms::error::BridgeResult;
use crate::atoms::types::FragmentDraft;
use crate::engine::tokenizer::tokenize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// What the compressor is asked to encode.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionRequest {
    pub input: String,
    pub intent: String,
    pub emotion: Option<String>,
    pub contextual: Option<String>,
    pub output: String,
}

impl CompressionRequest {
    /// Build a request from a draft. A missing intent becomes `memory_store`.
    pub fn from_draft(draft: &FragmentDraft) -> Self {
        Self {
            input: draft.content.clone(),
            intent: draft
                .intent
                .clone()
                .unwrap_or_else(|| DEFAULT_COMPRESSION_INTENT.to_string()),
            emotion: draft.emotion.clone(),
            contextual: draft.context.clone(),
            output: COMPRESSION_OUTPUT_MODE.to_string(),
        }
    }
}

/// Content + tags → opaque structured payload.
///
/// Implementations must be callable from several threads at once; the store
/// invokes them outside of any lock.
pub trait Compressor: Send + Sync {
    fn compress(&self, request: &CompressionRequest) -> BridgeResult<Value>;
}

impl<F> Compressor for F
where
    F: Fn(&CompressionRequest) -> BridgeResult<Value> + Send + Sync,
{
    fn compress(&self, request: &CompressionRequest) -> BridgeResult<Value> {
        self(request)
    }
}

/// Default token-summary compressor.
#[derive(Debug, Clone, Copy, Default)]
pub struct LirCompressor;

impl Compressor for LirCompressor {
    fn compress(&self, request: &CompressionRequest) -> BridgeResult<Value> {
        let tokens = tokenize(&request.input);

        let mut keys: Vec<&str> = Vec::new();
        for t in &tokens {
            if keys.len() >= COMPRESSION_MAX_KEYS {
                break;
            }
            if !keys.contains(&t.as_str()) {
                keys.push(t.as_str());
            }
        }

        Ok(json!({
            "v": 1,
            "intent": request.intent,
            "emotion": request.emotion,
            "context": request.contextual,
            "output": request.output,
            "tokens": tokens.len(),
            "digest": digest(&request.input),
            "keys": keys,
        }))
    }
}

fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
        .chars()
        .take(COMPRESSION_DIGEST_LEN)
        .collect()
}

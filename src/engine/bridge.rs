// ── Bridge Engine: Cross-Actor Bridging ────────────────────────────────────
//
// Hand-off helpers between Claude and Wes. Each call records the message as
// a targeted fragment, then renders it in the receiving side's format.

use crate::atoms::constants::{ACTOR_CLAUDE, ACTOR_WES};
use crate::atoms::error::BridgeResult;
use crate::atoms::types::FragmentDraft;
use crate::engine::store::FragmentStore;

/// Store a Claude memory addressed to Wes and return it in Wes's format.
pub fn bridge_to_wes(
    store: &FragmentStore,
    claude_memory: &str,
    emotion: Option<&str>,
) -> BridgeResult<String> {
    let mut draft = FragmentDraft::new(claude_memory, ACTOR_CLAUDE)
        .with_target(ACTOR_WES)
        .with_intent("bridge_to_wes");
    draft.emotion = emotion.map(str::to_string);

    let fragment = store.create_fragment(draft)?;
    store.store(&fragment)?;

    let mut wes_format = format!("[Erinnerung von Claude]: {}", claude_memory);
    if let Some(e) = emotion {
        wes_format.push_str(&format!("\n[Emotion]: {}", e));
    }
    Ok(wes_format)
}

/// Store a Wes response addressed to Claude and return it in Claude's format.
pub fn bridge_from_wes(store: &FragmentStore, wes_response: &str) -> BridgeResult<String> {
    let draft = FragmentDraft::new(wes_response, ACTOR_WES)
        .with_target(ACTOR_CLAUDE)
        .with_intent("bridge_from_wes");

    let fragment = store.create_fragment(draft)?;
    store.store(&fragment)?;

    Ok(format!("Wes responded: {}", wes_response))
}

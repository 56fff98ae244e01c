//! Conversation lifecycle: load, append, trim-on-save, clear.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use valet_contracts::{
    error::ValetResult,
    llm::LlmResponse,
    session::{ChatTurn, ContentBlock, SessionRecord},
};

use crate::store::SessionStore;

/// Default window size before trimming kicks in.
pub const DEFAULT_MAX_TURNS: usize = 40;

/// When the retained window has no plain-text user turn to anchor on, keep
/// only this many trailing turns. The constant is a carried-over heuristic,
/// not load-bearing.
const FALLBACK_TURNS: usize = 4;

/// Loads, saves, and trims one conversation per user.
///
/// Trimming happens on save, never on load, so a stored-over-long session
/// still replays fully into the provider until the next write.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    max_turns: usize,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::with_max_turns(store, DEFAULT_MAX_TURNS)
    }

    pub fn with_max_turns(store: Arc<dyn SessionStore>, max_turns: usize) -> Self {
        Self { store, max_turns }
    }

    /// The conversation so far, oldest turn first. Empty for a new user.
    pub fn load(&self, user_id: &str) -> ValetResult<Vec<ChatTurn>> {
        Ok(self
            .store
            .load(user_id)?
            .map(|record| record.turns)
            .unwrap_or_default())
    }

    /// Persist `turns` as the user's conversation, trimming first.
    pub fn save(&self, user_id: &str, turns: Vec<ChatTurn>) -> ValetResult<()> {
        let turns = self.trim(turns);
        let record = SessionRecord {
            user_id: user_id.to_string(),
            turn_count: turns.len(),
            turns,
            updated_at: Utc::now(),
        };
        self.store.save(&record)
    }

    /// Delete the stored conversation entirely.
    pub fn clear(&self, user_id: &str) -> ValetResult<()> {
        self.store.delete(user_id)
    }

    /// Bound the conversation and keep its head provider-safe.
    ///
    /// Providers reject a history whose first turn is not a plain user
    /// message (an orphaned tool-result turn, for instance). After cutting
    /// to the most recent `max_turns`, the window is advanced to the first
    /// plain-text user turn; if the window has none, only the last
    /// `FALLBACK_TURNS` turns survive.
    fn trim(&self, turns: Vec<ChatTurn>) -> Vec<ChatTurn> {
        if turns.len() <= self.max_turns {
            return turns;
        }

        let window = &turns[turns.len() - self.max_turns..];
        let trimmed = match window.iter().position(ChatTurn::is_plain_user_text) {
            Some(first_user) => window[first_user..].to_vec(),
            None => window[window.len().saturating_sub(FALLBACK_TURNS)..].to_vec(),
        };

        debug!(
            before = turns.len(),
            after = trimmed.len(),
            "trimmed session history"
        );
        trimmed
    }
}

// ── Append helpers ────────────────────────────────────────────────────────────

/// Append the new utterance as a plain-text user turn.
pub fn append_user_turn(turns: &mut Vec<ChatTurn>, text: impl Into<String>) {
    turns.push(ChatTurn::user_text(text));
}

/// Append an assistant turn serializing the response's text and tool calls.
pub fn append_assistant_turn(turns: &mut Vec<ChatTurn>, response: &LlmResponse) {
    let mut blocks = Vec::new();
    if let Some(text) = &response.text {
        blocks.push(ContentBlock::Text { text: text.clone() });
    }
    for call in &response.tool_calls {
        blocks.push(ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.arguments.clone(),
        });
    }
    turns.push(ChatTurn::assistant_blocks(blocks));
}

/// Append a synthetic user-role turn carrying tool results keyed by the
/// originating call ids.
pub fn append_tool_results(
    turns: &mut Vec<ChatTurn>,
    results: &[(String, serde_json::Value)],
) {
    if results.is_empty() {
        return;
    }
    let blocks = results
        .iter()
        .map(|(tool_use_id, content)| ContentBlock::ToolResult {
            tool_use_id: tool_use_id.clone(),
            content: content.clone(),
        })
        .collect();
    turns.push(ChatTurn::tool_results(blocks));
}

//! Conversation turn model.
//!
//! A session is an ordered sequence of provider-formatted turns per user.
//! The shapes here mirror content-block chat formats closely enough that
//! adapters can translate without loss: plain text, tool-use blocks on
//! assistant turns, and tool-result blocks carried in user-role turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::Args;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One content block inside a structured turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Free text.
    Text { text: String },

    /// An assistant-issued tool call.
    ToolUse {
        id: String,
        name: String,
        input: Args,
    },

    /// A tool outcome, keyed by the id of the originating tool call.
    ToolResult {
        tool_use_id: String,
        content: serde_json::Value,
    },
}

/// The body of a turn: a plain string or a list of content blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// One turn of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: TurnContent,
}

impl ChatTurn {
    /// A plain-text user turn.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: TurnContent::Text(text.into()),
        }
    }

    /// An assistant turn made of content blocks.
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: TurnContent::Blocks(blocks),
        }
    }

    /// A user-role turn carrying tool-result blocks.
    pub fn tool_results(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: TurnRole::User,
            content: TurnContent::Blocks(blocks),
        }
    }

    /// True for a user turn with purely textual content — the only kind of
    /// turn providers accept at the start of a history window.
    pub fn is_plain_user_text(&self) -> bool {
        if self.role != TurnRole::User {
            return false;
        }
        match &self.content {
            TurnContent::Text(_) => true,
            TurnContent::Blocks(blocks) => blocks
                .iter()
                .all(|b| matches!(b, ContentBlock::Text { .. })),
        }
    }
}

/// The persisted session row: one per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub turns: Vec<ChatTurn>,
    pub turn_count: usize,
    pub updated_at: DateTime<Utc>,
}

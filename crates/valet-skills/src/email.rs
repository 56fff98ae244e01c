//! Provider mail tools: `google_gmail.*`.
//!
//! Read-only: searching and reading leave nothing to verify, so both tools
//! keep the default unconditional match. Attachment download is not exposed
//! here — attachment byte storage lives outside the engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use valet_contracts::{error::ValetResult, plan::Args, tool::ToolContext};
use valet_core::traits::ServerTool;

use crate::{
    args::{optional_u64, required_str},
    connectors::MailConnector,
};

/// Message bodies are truncated so a long email cannot crowd the model's
/// context window.
const MAX_BODY_CHARS: usize = 8192;

// ── search_emails ─────────────────────────────────────────────────────────────

pub struct SearchEmailsTool {
    connector: Arc<dyn MailConnector>,
}

impl SearchEmailsTool {
    pub fn new(connector: Arc<dyn MailConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ServerTool for SearchEmailsTool {
    fn name(&self) -> &str {
        "google_gmail.search_emails"
    }

    fn description(&self) -> &str {
        "Search the user's inbox with provider search syntax. Returns subject, sender, date, and snippet per message."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query (e.g. 'from:erica subject:invoice')",
                },
                "max_results": {"type": "integer", "default": 10},
            },
            "required": ["query"],
        })
    }

    async fn execute(&self, args: &Args, _ctx: &ToolContext) -> ValetResult<Args> {
        let messages = self
            .connector
            .search_messages(
                required_str(args, "query", self.name())?,
                optional_u64(args, "max_results", 10),
            )
            .await?;

        let mut out = Args::new();
        out.insert("count".to_string(), json!(messages.len()));
        out.insert("messages".to_string(), Value::Array(messages));
        Ok(out)
    }
}

// ── read_email ────────────────────────────────────────────────────────────────

pub struct ReadEmailTool {
    connector: Arc<dyn MailConnector>,
}

impl ReadEmailTool {
    pub fn new(connector: Arc<dyn MailConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ServerTool for ReadEmailTool {
    fn name(&self) -> &str {
        "google_gmail.read_email"
    }

    fn description(&self) -> &str {
        "Read the full body of an email by its message_id. Long bodies are truncated."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message_id": {"type": "string"},
            },
            "required": ["message_id"],
        })
    }

    async fn execute(&self, args: &Args, _ctx: &ToolContext) -> ValetResult<Args> {
        let message = self
            .connector
            .get_message(required_str(args, "message_id", self.name())?)
            .await?;

        let mut out = match message {
            Value::Object(map) => map,
            other => {
                let mut map = Args::new();
                map.insert("message".to_string(), other);
                map
            }
        };
        truncate_body(&mut out);
        Ok(out)
    }
}

fn truncate_body(message: &mut Args) {
    let body = match message.get("body").and_then(Value::as_str) {
        Some(body) if body.chars().count() > MAX_BODY_CHARS => body,
        _ => return,
    };
    let truncated: String = body.chars().take(MAX_BODY_CHARS).collect();
    message.insert("body".to_string(), Value::String(truncated));
    message.insert("body_truncated".to_string(), Value::Bool(true));
}

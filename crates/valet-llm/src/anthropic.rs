//! Anthropic Messages API adapter.
//!
//! The internal [`ChatTurn`](valet_contracts::session::ChatTurn) shapes
//! mirror this provider's content-block format, so history translation is
//! mostly a serialization pass plus tool-name rewriting: internal
//! `namespace.action` names become `namespace-action` on the wire and are
//! restored when parsing the response.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use valet_contracts::{
    error::{ValetError, ValetResult},
    llm::{LlmResponse, ToolCall},
    plan::Args,
    session::{ChatTurn, TurnContent, TurnRole},
    tool::ToolSpec,
};

use crate::{
    client::LlmClient,
    config::LlmConfig,
    names::{from_api_name, to_api_name},
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Planning runs cool so tool selection stays deterministic; follow-ups run
/// warmer so spoken phrasings read naturally.
const CHAT_TEMPERATURE: f64 = 0.3;
const FOLLOW_UP_TEMPERATURE: f64 = 0.5;

pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig) -> ValetResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ValetError::Config {
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    async fn send(
        &self,
        system: &str,
        messages: Vec<WireMessage>,
        tools: &[ToolSpec],
        temperature: f64,
    ) -> ValetResult<LlmResponse> {
        let wire_tools: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "name": to_api_name(&t.name),
                    "description": t.description,
                    "input_schema": t.parameters,
                })
            })
            .collect();

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages,
            temperature,
            tools: &wire_tools,
            tool_choice: (!wire_tools.is_empty()).then(|| json!({"type": "auto"})),
        };

        debug!(model = %self.model, tools = tools.len(), "sending messages request");

        let url = format!("{}/v1/messages", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ValetError::Llm {
                reason: format!("request failed: {}", e),
            })?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| ValetError::Llm {
            reason: format!("invalid response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(ValetError::Llm {
                reason: format!("provider returned {}: {}", status, body),
            });
        }

        Ok(parse_response(&body))
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat(
        &self,
        system: &str,
        message: &str,
        tools: &[ToolSpec],
        history: &[ChatTurn],
    ) -> ValetResult<LlmResponse> {
        let mut messages = translate_history(history);
        messages.push(WireMessage {
            role: "user",
            content: Value::String(message.to_string()),
        });
        self.send(system, messages, tools, CHAT_TEMPERATURE).await
    }

    async fn follow_up(
        &self,
        system: &str,
        history: &[ChatTurn],
        tools: &[ToolSpec],
    ) -> ValetResult<LlmResponse> {
        let messages = translate_history(history);
        self.send(system, messages, tools, FOLLOW_UP_TEMPERATURE)
            .await
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<WireMessage>,
    temperature: f64,
    #[serde(skip_serializing_if = "<[Value]>::is_empty")]
    tools: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: Value,
}

// ── Translation ───────────────────────────────────────────────────────────────

/// Serialize turns into wire messages, rewriting tool names in tool-use
/// blocks to the hyphenated API form.
fn translate_history(history: &[ChatTurn]) -> Vec<WireMessage> {
    history
        .iter()
        .map(|turn| {
            let role = match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "assistant",
            };
            let content = match &turn.content {
                TurnContent::Text(text) => Value::String(text.clone()),
                TurnContent::Blocks(blocks) => {
                    let mut value = serde_json::to_value(blocks).unwrap_or(Value::Null);
                    rewrite_tool_names(&mut value);
                    value
                }
            };
            WireMessage { role, content }
        })
        .collect()
}

/// Replace the `name` field of every `tool_use` block with its API form.
fn rewrite_tool_names(content: &mut Value) {
    let blocks = match content.as_array_mut() {
        Some(blocks) => blocks,
        None => return,
    };
    for block in blocks {
        if block.get("type").and_then(Value::as_str) != Some("tool_use") {
            continue;
        }
        if let Some(name) = block.get("name").and_then(Value::as_str) {
            let api_name = to_api_name(name);
            block["name"] = Value::String(api_name);
        }
    }
}

/// Extract text and tool calls from a messages response body.
///
/// Unknown block types are skipped so newer provider features degrade to
/// plain text rather than failing the whole command.
fn parse_response(body: &Value) -> LlmResponse {
    let mut text_parts: Vec<&str> = Vec::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    let blocks = body
        .get("content")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for block in blocks {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                if let Some(text) = block.get("text").and_then(Value::as_str) {
                    text_parts.push(text);
                }
            }
            Some("tool_use") => {
                let id = block
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let name = block
                    .get("name")
                    .and_then(Value::as_str)
                    .map(from_api_name)
                    .unwrap_or_default();
                let arguments = match block.get("input") {
                    Some(Value::Object(map)) => map.clone(),
                    _ => Args::new(),
                };
                tool_calls.push(ToolCall { id, name, arguments });
            }
            other => {
                warn!(block_type = ?other, "skipping unrecognized content block");
            }
        }
    }

    LlmResponse {
        text: (!text_parts.is_empty()).then(|| text_parts.join("\n")),
        tool_calls,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use valet_contracts::session::ContentBlock;

    use super::*;

    fn args(v: Value) -> Args {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected JSON object"),
        }
    }

    #[test]
    fn test_history_translation_rewrites_tool_names() {
        let history = vec![
            ChatTurn::user_text("cancel my dentist appointment"),
            ChatTurn::assistant_blocks(vec![
                ContentBlock::Text {
                    text: "Cancelling it now.".to_string(),
                },
                ContentBlock::ToolUse {
                    id: "call-1".to_string(),
                    name: "google_calendar.delete_event".to_string(),
                    input: args(json!({"event_id": "ev-1"})),
                },
            ]),
        ];

        let messages = translate_history(&history);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, json!("cancel my dentist appointment"));
        assert_eq!(
            messages[1].content[1]["name"],
            json!("google_calendar-delete_event")
        );
        assert_eq!(messages[1].content[1]["input"]["event_id"], json!("ev-1"));
    }

    #[test]
    fn test_response_parsing_restores_internal_names() {
        let body = json!({
            "content": [
                {"type": "text", "text": "On it."},
                {
                    "type": "tool_use",
                    "id": "toolu_01",
                    "name": "google_calendar-delete_event",
                    "input": {"event_id": "ev-1"}
                }
            ]
        });

        let parsed = parse_response(&body);
        assert_eq!(parsed.text.as_deref(), Some("On it."));
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].name, "google_calendar.delete_event");
        assert_eq!(parsed.tool_calls[0].id, "toolu_01");
    }

    #[test]
    fn test_unknown_blocks_are_skipped() {
        let body = json!({
            "content": [
                {"type": "thinking", "thinking": "…"},
                {"type": "text", "text": "Done."}
            ]
        });

        let parsed = parse_response(&body);
        assert_eq!(parsed.text.as_deref(), Some("Done."));
        assert!(parsed.tool_calls.is_empty());
    }
}

//! OpenAI chat-completions adapter.
//!
//! History translation is lossier than the Anthropic shape: assistant
//! tool-use blocks become `tool_calls` entries with JSON-string arguments,
//! and tool-result blocks become dedicated `tool`-role messages. Internal
//! tool names are hyphenated on the wire and restored when parsing.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use valet_contracts::{
    error::{ValetError, ValetResult},
    llm::{LlmResponse, ToolCall},
    plan::Args,
    session::{ChatTurn, ContentBlock, TurnContent, TurnRole},
    tool::ToolSpec,
};

use crate::{
    client::LlmClient,
    config::LlmConfig,
    names::{from_api_name, to_api_name},
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const CHAT_TEMPERATURE: f64 = 0.3;
const FOLLOW_UP_TEMPERATURE: f64 = 0.5;

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl OpenAiClient {
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
        mut messages: Vec<Value>,
        tools: &[ToolSpec],
        temperature: f64,
    ) -> ValetResult<LlmResponse> {
        messages.insert(0, json!({"role": "system", "content": system}));

        let mut request = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": temperature,
            "messages": messages,
        });
        if !tools.is_empty() {
            let wire_tools: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": to_api_name(&t.name),
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            request["tools"] = Value::Array(wire_tools);
            request["tool_choice"] = json!("auto");
        }

        debug!(model = %self.model, tools = tools.len(), "sending chat completion request");

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
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

        parse_response(&body)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(
        &self,
        system: &str,
        message: &str,
        tools: &[ToolSpec],
        history: &[ChatTurn],
    ) -> ValetResult<LlmResponse> {
        let mut messages = translate_history(history);
        messages.push(json!({"role": "user", "content": message}));
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

// ── Translation ───────────────────────────────────────────────────────────────

/// Flatten turns into chat-completion messages.
///
/// One input turn can expand to several wire messages: an assistant turn
/// with tool uses becomes a single assistant message carrying `tool_calls`,
/// while a user turn of tool results becomes one `tool` message per result.
fn translate_history(history: &[ChatTurn]) -> Vec<Value> {
    let mut messages = Vec::with_capacity(history.len());

    for turn in history {
        match (&turn.role, &turn.content) {
            (TurnRole::User, TurnContent::Text(text)) => {
                messages.push(json!({"role": "user", "content": text}));
            }
            (TurnRole::Assistant, TurnContent::Text(text)) => {
                messages.push(json!({"role": "assistant", "content": text}));
            }
            (TurnRole::Assistant, TurnContent::Blocks(blocks)) => {
                messages.push(assistant_message(blocks));
            }
            (TurnRole::User, TurnContent::Blocks(blocks)) => {
                for block in blocks {
                    match block {
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                        } => {
                            let content = match content {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            };
                            messages.push(json!({
                                "role": "tool",
                                "tool_call_id": tool_use_id,
                                "content": content,
                            }));
                        }
                        ContentBlock::Text { text } => {
                            messages.push(json!({"role": "user", "content": text}));
                        }
                        ContentBlock::ToolUse { .. } => {
                            warn!("dropping tool_use block on a user turn");
                        }
                    }
                }
            }
        }
    }

    messages
}

fn assistant_message(blocks: &[ContentBlock]) -> Value {
    let mut text_parts: Vec<&str> = Vec::new();
    let mut tool_calls: Vec<Value> = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text } => text_parts.push(text),
            ContentBlock::ToolUse { id, name, input } => {
                tool_calls.push(json!({
                    "id": id,
                    "type": "function",
                    "function": {
                        "name": to_api_name(name),
                        "arguments": Value::Object(input.clone()).to_string(),
                    }
                }));
            }
            ContentBlock::ToolResult { .. } => {
                warn!("dropping tool_result block on an assistant turn");
            }
        }
    }

    let mut message = json!({
        "role": "assistant",
        "content": if text_parts.is_empty() {
            Value::Null
        } else {
            Value::String(text_parts.join("\n"))
        },
    });
    if !tool_calls.is_empty() {
        message["tool_calls"] = Value::Array(tool_calls);
    }
    message
}

/// Extract text and tool calls from the first choice of a completion body.
///
/// Arguments arrive as a JSON string; a string that does not parse to an
/// object is a provider fault and surfaces as `ValetError::Llm`.
fn parse_response(body: &Value) -> ValetResult<LlmResponse> {
    let message = body
        .pointer("/choices/0/message")
        .ok_or_else(|| ValetError::Llm {
            reason: "response has no choices".to_string(),
        })?;

    let text = message
        .get("content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let mut tool_calls = Vec::new();
    let calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for call in calls {
        let id = call
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let name = call
            .pointer("/function/name")
            .and_then(Value::as_str)
            .map(from_api_name)
            .unwrap_or_default();
        let raw_args = call
            .pointer("/function/arguments")
            .and_then(Value::as_str)
            .unwrap_or("{}");
        let arguments: Args =
            serde_json::from_str(raw_args).map_err(|e| ValetError::Llm {
                reason: format!("tool call '{}' has malformed arguments: {}", name, e),
            })?;
        tool_calls.push(ToolCall { id, name, arguments });
    }

    Ok(LlmResponse { text, tool_calls })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn args(v: Value) -> Args {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected JSON object"),
        }
    }

    #[test]
    fn test_assistant_turn_becomes_tool_calls() {
        let history = vec![
            ChatTurn::user_text("cancel my dentist appointment"),
            ChatTurn::assistant_blocks(vec![ContentBlock::ToolUse {
                id: "call-1".to_string(),
                name: "google_calendar.delete_event".to_string(),
                input: args(json!({"event_id": "ev-1"})),
            }]),
            ChatTurn::tool_results(vec![ContentBlock::ToolResult {
                tool_use_id: "call-1".to_string(),
                content: json!({"deleted": true}),
            }]),
        ];

        let messages = translate_history(&history);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], json!("assistant"));
        assert_eq!(
            messages[1]["tool_calls"][0]["function"]["name"],
            json!("google_calendar-delete_event")
        );
        let raw = messages[1]["tool_calls"][0]["function"]["arguments"]
            .as_str()
            .unwrap();
        assert_eq!(serde_json::from_str::<Value>(raw).unwrap()["event_id"], json!("ev-1"));
        assert_eq!(messages[2]["role"], json!("tool"));
        assert_eq!(messages[2]["tool_call_id"], json!("call-1"));
    }

    #[test]
    fn test_response_parsing_restores_names_and_args() {
        let body = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "google_calendar-delete_event",
                            "arguments": "{\"event_id\": \"ev-1\"}"
                        }
                    }]
                }
            }]
        });

        let parsed = parse_response(&body).unwrap();
        assert!(parsed.text.is_none());
        assert_eq!(parsed.tool_calls[0].name, "google_calendar.delete_event");
        assert_eq!(parsed.tool_calls[0].arguments["event_id"], json!("ev-1"));
    }

    #[test]
    fn test_malformed_arguments_are_an_error() {
        let body = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "function": {"name": "a-b", "arguments": "not json"}
                    }]
                }
            }]
        });

        assert!(parse_response(&body).is_err());
    }
}

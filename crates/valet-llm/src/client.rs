//! The provider-agnostic LLM client trait.

use async_trait::async_trait;

use valet_contracts::{
    error::ValetResult,
    llm::LlmResponse,
    session::ChatTurn,
    tool::ToolSpec,
};

/// A chat-completion client with tool calling.
///
/// Implementations own the wire format. They translate [`ChatTurn`] history
/// into provider messages, expose `tools` in the provider's schema dialect,
/// and restore internal tool names in the parsed response.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `message` as a new user turn on top of `history` and return the
    /// model's response.
    async fn chat(
        &self,
        system: &str,
        message: &str,
        tools: &[ToolSpec],
        history: &[ChatTurn],
    ) -> ValetResult<LlmResponse>;

    /// Continue an existing exchange (typically after tool results were
    /// appended to `history`) without adding a new user message.
    ///
    /// Runs slightly warmer than `chat` — follow-ups phrase results for the
    /// user rather than select tools.
    async fn follow_up(
        &self,
        system: &str,
        history: &[ChatTurn],
        tools: &[ToolSpec],
    ) -> ValetResult<LlmResponse>;
}

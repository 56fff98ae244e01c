//! The narrow LLM request/response contract.
//!
//! Provider wire formats differ; adapters translate them into these two
//! types. Tool call ids are preserved verbatim so results can be matched
//! back to the originating calls.

use serde::{Deserialize, Serialize};

use crate::plan::Args;

/// A single tool call extracted from an LLM response.
///
/// `name` is the internal qualified name — adapters restore the `.`
/// separator before this type is ever constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned correlation token.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Args,
}

/// Provider-agnostic LLM response: free text, structured tool calls, or both.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

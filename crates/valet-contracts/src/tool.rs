//! Tool identity, execution surface, and runtime context types.

use serde::{Deserialize, Serialize};

/// Where a step runs: on this server, or delegated to the user's device.
///
/// Fixed at plan-creation time. The executor never calls `execute` for a
/// device-surface step — it emits a `DeviceAction` record instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionSurface {
    Server,
    Device,
}

/// Machine-readable description of one tool, handed to the planner and to
/// LLM provider adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Qualified internal name (`namespace.action`).
    pub name: String,

    /// One-line description shown to the LLM.
    pub description: String,

    /// Which surface executes the tool.
    pub execution_surface: ExecutionSurface,

    /// JSON Schema for the tool's arguments.
    pub parameters: serde_json::Value,
}

/// Runtime context passed to every tool execution and verification.
///
/// Carries user identity and locale data; provider credentials live behind
/// the connector seams, not here.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub user_id: String,
    pub timezone: String,
    pub locale: String,
    pub linked_providers: Vec<String>,

    /// Last known device location, when the device reported one with the
    /// request. Navigation tools fall back to it as the route origin.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ToolContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            timezone: "UTC".to_string(),
            locale: "en-US".to_string(),
            linked_providers: Vec::new(),
            latitude: None,
            longitude: None,
        }
    }
}

/// Declarative description of a group of related tools plus planner guidance.
///
/// Manifests are registered from a statically enumerable list at startup;
/// there is no runtime discovery or dynamic loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillManifest {
    /// Stable identifier, e.g. `"calendar"`.
    pub name: String,

    /// Human-readable name used in the system prompt, e.g. `"Calendar"`.
    pub display_name: String,

    /// One-liner for the system prompt's skill category list.
    pub description: String,

    /// The qualified tool names this skill provides.
    pub tool_names: Vec<String>,

    /// Skill-specific rules appended to the planner's tool-use rules.
    pub planner_instructions: Vec<String>,
}

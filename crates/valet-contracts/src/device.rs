//! Cross-boundary device delegation records.
//!
//! A `DeviceAction` is what the server sends to the user's device for a
//! device-surface step; a `DeviceActionResult` is what the device reports
//! back. The idempotency key crosses the boundary unchanged so the device
//! can suppress replays.

use serde::{Deserialize, Serialize};

use crate::plan::Args;

/// An action the user's device must execute locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceAction {
    /// Fresh random id minted when the action is emitted.
    pub action_id: String,

    /// Qualified tool name of the originating step.
    pub tool_name: String,

    /// The step's arguments, passed through unchanged.
    #[serde(default)]
    pub args: Args,

    /// The originating step's idempotency key, unchanged.
    pub idempotency_key: String,
}

/// The result the device reports after executing a `DeviceAction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceActionResult {
    pub action_id: String,
    pub idempotency_key: String,
    pub success: bool,
    #[serde(default)]
    pub result: Args,
    pub error: Option<String>,
}

//! Command API request and response shapes.
//!
//! These mirror the conceptual `/command` endpoints. The transport layer
//! (HTTP framework, auth) is an external collaborator; the service consumes
//! and produces these types directly.

use serde::{Deserialize, Serialize};

use crate::{device::{DeviceAction, DeviceActionResult}, plan::ActionPlan};

/// One user utterance plus locale context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Speech-to-text transcript of the utterance.
    pub transcript: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub linked_providers: Vec<String>,

    /// Device location at utterance time, used as a route origin fallback.
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

/// A file produced by a step and surfaced to the caller.
///
/// Byte storage is an external collaborator; only the reference travels
/// through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub url: String,
    pub size: u64,
}

/// The response shape shared by `/command` and `/command/confirm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// What the assistant should say out loud.
    pub spoken_response: String,

    pub action_plan: Option<ActionPlan>,

    /// Device-surface actions for the caller to forward to the device.
    #[serde(default)]
    pub device_actions: Vec<DeviceAction>,

    #[serde(default)]
    pub requires_confirmation: bool,

    pub confirmation_prompt: Option<String>,

    pub plan_id: Option<String>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl CommandResponse {
    /// A purely conversational reply with no plan attached.
    pub fn conversational(spoken_response: impl Into<String>) -> Self {
        Self {
            spoken_response: spoken_response.into(),
            action_plan: None,
            device_actions: Vec::new(),
            requires_confirmation: false,
            confirmation_prompt: None,
            plan_id: None,
            attachments: Vec::new(),
        }
    }
}

/// Consume a pending plan by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub plan_id: String,
}

/// Device-reported results for the actions of one plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceResultRequest {
    pub plan_id: String,
    pub results: Vec<DeviceActionResult>,
}

/// Aggregate status of a device-result report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceReportStatus {
    Verified,
    PartialFailure,
}

/// Per-action verification outcome echoed back to the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceVerification {
    pub action_id: String,
    pub matched: bool,
    #[serde(default)]
    pub discrepancies: Vec<String>,
}

/// Response of `/command/device-result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceResultResponse {
    pub status: DeviceReportStatus,
    pub verifications: Vec<DeviceVerification>,
}

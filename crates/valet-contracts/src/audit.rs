//! The audit record written for every executed step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::Args;

/// Outcome discriminant of an audited step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Ok,
    Error,
}

/// One audit record, written regardless of step outcome.
///
/// Records are append-only; nothing in the runtime modifies or deletes one
/// after it is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub user_id: String,
    pub plan_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub args: Args,
    pub result: Option<Args>,
    pub status: AuditStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Build a record for a step outcome.
    pub fn for_step(
        user_id: impl Into<String>,
        plan_id: impl Into<String>,
        tool_name: impl Into<String>,
        args: Args,
        result: Option<Args>,
        error: Option<String>,
    ) -> Self {
        let status = if error.is_none() {
            AuditStatus::Ok
        } else {
            AuditStatus::Error
        };
        Self {
            user_id: user_id.into(),
            plan_id: plan_id.into(),
            tool_name: tool_name.into(),
            args,
            result,
            status,
            error,
            created_at: Utc::now(),
        }
    }

    /// Build a record for a device-reported result.
    ///
    /// Status follows the device's `success` flag, not the presence of an
    /// error string — a device may report failure without a message.
    pub fn for_device_result(
        user_id: impl Into<String>,
        plan_id: impl Into<String>,
        tool_name: impl Into<String>,
        result: Option<Args>,
        success: bool,
        error: Option<String>,
    ) -> Self {
        let status = if success {
            AuditStatus::Ok
        } else {
            AuditStatus::Error
        };
        Self {
            user_id: user_id.into(),
            plan_id: plan_id.into(),
            tool_name: tool_name.into(),
            args: Args::new(),
            result,
            status,
            error,
            created_at: Utc::now(),
        }
    }
}

//! Step-level execution outcomes and verification reports.
//!
//! `StepResult` is what the executor produces for each attempted step.
//! `ExecutionResult` aggregates one execution pass. Steps left unexecuted
//! by stop-on-failure produce no `StepResult` at all.

use serde::{Deserialize, Serialize};

use crate::{
    device::DeviceAction,
    plan::{ActionStep, Args},
};

/// The outcome of one attempted step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// The step this result belongs to.
    pub step: ActionStep,

    /// True for normal success, idempotent skips, and device delegation.
    pub success: bool,

    /// Tool output, present on success.
    pub result: Option<Args>,

    /// Failure detail, present on failure.
    pub error: Option<String>,

    /// Present only when the step was surfaced to the device instead of
    /// executed.
    pub device_action: Option<DeviceAction>,
}

impl StepResult {
    /// A successful server-side execution.
    pub fn ok(step: ActionStep, result: Args) -> Self {
        Self {
            step,
            success: true,
            result: Some(result),
            error: None,
            device_action: None,
        }
    }

    /// A failed step. Halts the remainder of the pass.
    pub fn failed(step: ActionStep, error: impl Into<String>) -> Self {
        Self {
            step,
            success: false,
            result: None,
            error: Some(error.into()),
            device_action: None,
        }
    }

    /// An idempotent replay: the key was already executed, so the tool was
    /// never invoked. Reported as success with a skip marker.
    pub fn skipped(step: ActionStep) -> Self {
        let mut marker = Args::new();
        marker.insert("skipped".to_string(), serde_json::Value::Bool(true));
        Self::ok(step, marker)
    }

    /// A step delegated to the device.
    pub fn delegated(step: ActionStep, action: DeviceAction) -> Self {
        Self {
            step,
            success: true,
            result: None,
            error: None,
            device_action: Some(action),
        }
    }

    /// True when this result is an idempotent-replay skip.
    pub fn was_skipped(&self) -> bool {
        self.result
            .as_ref()
            .and_then(|r| r.get("skipped"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// The ordered results of one execution pass over a plan.
#[derive(Debug)]
pub struct ExecutionResult {
    pub step_results: Vec<StepResult>,
    pub device_actions: Vec<DeviceAction>,
    pub all_succeeded: bool,
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionResult {
    /// An empty pass. Vacuously `all_succeeded`.
    pub fn new() -> Self {
        Self {
            step_results: Vec::new(),
            device_actions: Vec::new(),
            all_succeeded: true,
        }
    }

    /// Record one step result, maintaining the aggregates.
    pub fn add(&mut self, sr: StepResult) {
        if let Some(action) = &sr.device_action {
            self.device_actions.push(action.clone());
        }
        if !sr.success {
            self.all_succeeded = false;
        }
        self.step_results.push(sr);
    }
}

/// A match/discrepancy report from post-execution verification.
///
/// Strictly advisory: a mismatch is logged and audited but never undoes or
/// retries the step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub matched: bool,
    #[serde(default)]
    pub discrepancies: Vec<String>,
}

impl VerificationResult {
    /// An unconditional match, used by tools without read-back semantics.
    pub fn matched() -> Self {
        Self {
            matched: true,
            discrepancies: Vec::new(),
        }
    }

    /// A mismatch with one or more discrepancy descriptions.
    pub fn mismatch(discrepancies: Vec<String>) -> Self {
        Self {
            matched: false,
            discrepancies,
        }
    }
}

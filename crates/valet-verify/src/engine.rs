//! Read-back verification engine.
//!
//! `ReadBackVerifier` confirms that side effects claimed by an execution
//! actually landed:
//!
//! * **Server steps** are re-checked through the owning tool's `verify`
//!   hook, which typically reads the resource back from the provider and
//!   compares it against the requested arguments.
//! * **Device results** cannot be read back from here — the resource lives
//!   on the phone. They are checked locally: a result reporting failure is a
//!   mismatch, a result reporting success is trusted as-is.
//!
//! Steps that did not succeed, were skipped as replays, or produced no
//! result payload have nothing to verify and pass trivially.

use std::sync::Arc;

use tracing::{debug, warn};

use valet_contracts::{
    device::DeviceActionResult,
    error::ValetResult,
    execution::{StepResult, VerificationResult},
    tool::ToolContext,
};
use valet_core::{traits::Tool, ToolRegistry};

/// Verifies executed steps by reading state back through the tool registry.
pub struct ReadBackVerifier {
    registry: Arc<ToolRegistry>,
}

impl ReadBackVerifier {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Verify one executed server step.
    ///
    /// Returns a trivially matched result for steps that failed, were
    /// skipped, or carry no result payload — there is no claimed side effect
    /// to confirm. Otherwise delegates to the owning tool's `verify` hook.
    ///
    /// A step naming a tool the registry does not know, or naming a
    /// device-surface tool, is reported as a mismatch rather than an error:
    /// the execution already happened and the caller needs a verdict, not a
    /// failure.
    pub async fn verify_step(
        &self,
        step_result: &StepResult,
        ctx: &ToolContext,
    ) -> ValetResult<VerificationResult> {
        if !step_result.success || step_result.was_skipped() {
            return Ok(VerificationResult::matched());
        }
        let result = match &step_result.result {
            Some(result) if !result.is_empty() => result,
            _ => return Ok(VerificationResult::matched()),
        };

        let tool_name = &step_result.step.tool_name;
        debug!(tool = %tool_name, "verifying step result");

        match self.registry.get(tool_name) {
            Some(Tool::Server(tool)) => {
                tool.verify(&step_result.step.args, result, ctx).await
            }
            Some(Tool::Device(_)) => {
                warn!(tool = %tool_name, "server step names a device tool");
                Ok(VerificationResult::mismatch(vec![format!(
                    "tool '{}' runs on the device and cannot be read back",
                    tool_name
                )]))
            }
            None => {
                warn!(tool = %tool_name, "cannot verify step for unknown tool");
                Ok(VerificationResult::mismatch(vec![format!(
                    "unknown tool: {}",
                    tool_name
                )]))
            }
        }
    }

    /// Verify a result reported back by the device.
    ///
    /// Device state is not reachable from the server, so this is a local
    /// consistency check: a reported failure is a mismatch carrying the
    /// device's error; a reported success is trusted.
    pub fn verify_device_result(&self, result: &DeviceActionResult) -> VerificationResult {
        if result.success {
            VerificationResult::matched()
        } else {
            let error = result.error.as_deref().unwrap_or("unknown error");
            VerificationResult::mismatch(vec![format!("device execution failed: {}", error)])
        }
    }
}

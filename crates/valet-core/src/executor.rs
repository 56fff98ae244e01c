//! The VALET executor: the step-by-step plan runner.
//!
//! The executor walks a plan's steps in order and enforces three rules:
//!
//! 1. **Idempotent replay** — a step whose idempotency key was already
//!    executed in this executor's lifetime short-circuits with a success
//!    result carrying a skip marker. No tool is invoked.
//! 2. **Surface dispatch** — device-surface steps never reach a tool;
//!    they are serialized as `DeviceAction` records for the device.
//! 3. **Stop on first failure** — processing halts at the first failed
//!    step, bounding the blast radius of a bad plan. Subsequent steps are
//!    left unexecuted and produce no result for this pass.
//!
//! Two entry points exist: `execute_plan` skips steps still flagged for
//! confirmation (they are deferred to the pending store), while
//! `execute_confirmed_plan` runs every step of a plan the user confirmed.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info};

use valet_contracts::{
    device::DeviceAction,
    execution::{ExecutionResult, StepResult},
    plan::{ActionPlan, ActionStep},
    tool::{ExecutionSurface, ToolContext},
};

use crate::{registry::ToolRegistry, traits::Tool};

/// Per-request execution state machine.
///
/// Construct one executor per command request. The executed-key set may be
/// pre-seeded with keys from an earlier pass so a retried plan replays
/// safely.
pub struct Executor {
    registry: Arc<ToolRegistry>,
    executed_keys: HashSet<String>,
}

impl Executor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            executed_keys: HashSet::new(),
        }
    }

    /// Pre-seed the executed-key set, e.g. when resuming a partially
    /// applied plan.
    pub fn with_executed_keys(registry: Arc<ToolRegistry>, keys: HashSet<String>) -> Self {
        Self {
            registry,
            executed_keys: keys,
        }
    }

    /// The keys resolved so far — returned to callers so a failed plan can
    /// be resumed without re-applying earlier steps.
    pub fn executed_keys(&self) -> &HashSet<String> {
        &self.executed_keys
    }

    /// Execute-now pass: runs every step except those still flagged
    /// `requires_confirmation`, which are deferred to the pending store.
    pub async fn execute_plan(
        &mut self,
        plan: &ActionPlan,
        ctx: &ToolContext,
    ) -> ExecutionResult {
        self.run(plan, ctx, true).await
    }

    /// Execute-confirmed pass: runs every step, including previously
    /// deferred ones.
    pub async fn execute_confirmed_plan(
        &mut self,
        plan: &ActionPlan,
        ctx: &ToolContext,
    ) -> ExecutionResult {
        self.run(plan, ctx, false).await
    }

    async fn run(
        &mut self,
        plan: &ActionPlan,
        ctx: &ToolContext,
        skip_unconfirmed: bool,
    ) -> ExecutionResult {
        let mut result = ExecutionResult::new();

        for step in &plan.steps {
            if skip_unconfirmed && step.requires_confirmation {
                continue;
            }

            let sr = self.execute_step(step, ctx).await;
            let failed = !sr.success;
            if failed {
                error!(
                    tool = %step.tool_name,
                    plan_id = %plan.plan_id,
                    error = sr.error.as_deref().unwrap_or("unknown"),
                    "step failed, halting plan"
                );
            }
            result.add(sr);

            if failed {
                break;
            }
        }

        result
    }

    async fn execute_step(&mut self, step: &ActionStep, ctx: &ToolContext) -> StepResult {
        if self.executed_keys.contains(&step.idempotency_key) {
            info!(
                key = %step.idempotency_key,
                tool = %step.tool_name,
                "idempotent replay, skipping"
            );
            return StepResult::skipped(step.clone());
        }

        if step.execution_surface == ExecutionSurface::Device {
            return self.delegate_to_device(step);
        }

        let tool = match self.registry.get(&step.tool_name) {
            Some(Tool::Server(tool)) => Arc::clone(tool),
            // A device tool reached by a server-surface step means the plan
            // and registry disagree; treat it the same as an absent tool.
            Some(Tool::Device(_)) | None => {
                return StepResult::failed(
                    step.clone(),
                    format!("unknown tool: {}", step.tool_name),
                );
            }
        };

        match tool.execute(&step.args, ctx).await {
            Ok(output) => {
                // The key is recorded only after resolution, never before —
                // a failed invocation must stay retryable under the same key.
                self.executed_keys.insert(step.idempotency_key.clone());
                info!(tool = %step.tool_name, key = %step.idempotency_key, "step ok");
                StepResult::ok(step.clone(), output)
            }
            Err(e) => StepResult::failed(step.clone(), e.to_string()),
        }
    }

    /// Serialize a device-surface step as a `DeviceAction` carrying the
    /// step's arguments and idempotency key unchanged.
    fn delegate_to_device(&mut self, step: &ActionStep) -> StepResult {
        let action = DeviceAction {
            action_id: uuid::Uuid::new_v4().simple().to_string(),
            tool_name: step.tool_name.clone(),
            args: step.args.clone(),
            idempotency_key: step.idempotency_key.clone(),
        };
        self.executed_keys.insert(step.idempotency_key.clone());
        info!(tool = %step.tool_name, action_id = %action.action_id, "delegated to device");
        StepResult::delegated(step.clone(), action)
    }
}

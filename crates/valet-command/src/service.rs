//! The command pipeline.
//!
//! `CommandService` wires the whole engine together, transport-free: an
//! HTTP layer (or the demo CLI) maps requests onto these four operations
//! and serializes the responses.
//!
//! Pipeline for one utterance: load session → plan → policy → either park
//! the plan for confirmation or run the execute-now pass → read-back
//! verify → audit every step → persist the session → speak a summary.

use std::sync::Arc;

use tracing::{info, warn};

use valet_contracts::{
    audit::AuditRecord,
    command::{
        CommandRequest, CommandResponse, ConfirmRequest, DeviceReportStatus, DeviceResultRequest,
        DeviceResultResponse, DeviceVerification,
    },
    error::ValetResult,
    execution::{ExecutionResult, VerificationResult},
    plan::ActionPlan,
    session::ChatTurn,
    tool::ToolContext,
};
use valet_core::{traits::AuditSink, Executor, PendingPlans, ToolRegistry};
use valet_planner::{PlanOutcome, PlanRequest, Planner};
use valet_policy::PolicyEngine;
use valet_session::{append_tool_results, append_user_turn, SessionManager};
use valet_verify::ReadBackVerifier;

const NO_ACTIONS_REPLY: &str = "I didn't find any actions to take.";

pub struct CommandService {
    planner: Planner,
    policy: PolicyEngine,
    registry: Arc<ToolRegistry>,
    pending: Arc<PendingPlans>,
    audit: Arc<dyn AuditSink>,
    sessions: SessionManager,
    verifier: ReadBackVerifier,
}

impl CommandService {
    pub fn new(
        planner: Planner,
        policy: PolicyEngine,
        registry: Arc<ToolRegistry>,
        pending: Arc<PendingPlans>,
        audit: Arc<dyn AuditSink>,
        sessions: SessionManager,
    ) -> Self {
        let verifier = ReadBackVerifier::new(registry.clone());
        Self {
            planner,
            policy,
            registry,
            pending,
            audit,
            sessions,
            verifier,
        }
    }

    /// One utterance in, one spoken response out.
    pub async fn handle_command(
        &self,
        user_id: &str,
        request: &CommandRequest,
    ) -> ValetResult<CommandResponse> {
        let mut turns = self.sessions.load(user_id)?;

        let outcome = self
            .planner
            .plan(&PlanRequest {
                transcript: request.transcript.clone(),
                timezone: request.timezone.clone(),
                locale: request.locale.clone(),
                linked_providers: request.linked_providers.clone(),
                history: turns.clone(),
            })
            .await?;

        let (mut plan, assistant_turn) = match outcome {
            PlanOutcome::Conversation { reply } => {
                append_user_turn(&mut turns, &request.transcript);
                turns.push(ChatTurn::assistant_blocks(vec![
                    valet_contracts::session::ContentBlock::Text { text: reply.clone() },
                ]));
                self.sessions.save(user_id, turns)?;
                return Ok(CommandResponse::conversational(reply));
            }
            PlanOutcome::Plan {
                plan,
                assistant_turn,
            } => (plan, assistant_turn),
        };

        let outcome = self.policy.evaluate(&mut plan);
        if outcome.blocked {
            let reason = outcome
                .block_reason
                .unwrap_or_else(|| "This action is blocked by policy.".to_string());
            let mut response = CommandResponse::conversational(reason);
            response.action_plan = Some(plan);
            return Ok(response);
        }

        append_user_turn(&mut turns, &request.transcript);
        turns.push(assistant_turn);

        if plan.needs_confirmation() {
            let prompt = confirmation_prompt(&plan);
            info!(plan_id = %plan.plan_id, "plan parked pending confirmation");
            self.pending.insert(plan.clone(), user_id, turns);

            return Ok(CommandResponse {
                spoken_response: prompt.clone(),
                action_plan: Some(plan.clone()),
                device_actions: Vec::new(),
                requires_confirmation: true,
                confirmation_prompt: Some(prompt),
                plan_id: Some(plan.plan_id),
                attachments: Vec::new(),
            });
        }

        let location = request.latitude.zip(request.longitude);
        let ctx = self.context_for(user_id, &plan, &request.linked_providers, location);
        let mut executor = Executor::new(self.registry.clone());
        let exec_result = executor.execute_plan(&plan, &ctx).await;

        self.finish(user_id, plan, exec_result, turns, &ctx).await
    }

    /// Execute a parked plan after the user said yes.
    pub async fn confirm(
        &self,
        user_id: &str,
        request: &ConfirmRequest,
    ) -> ValetResult<CommandResponse> {
        let pending = self.pending.take(&request.plan_id, user_id)?;
        let plan = pending.plan;
        let turns = pending.snapshot;

        let ctx = self.context_for(user_id, &plan, &[], None);
        let mut executor = Executor::new(self.registry.clone());
        let exec_result = executor.execute_confirmed_plan(&plan, &ctx).await;

        self.finish(user_id, plan, exec_result, turns, &ctx).await
    }

    /// Ingest results the device reports for delegated actions.
    pub fn device_results(
        &self,
        user_id: &str,
        request: &DeviceResultRequest,
    ) -> ValetResult<DeviceResultResponse> {
        let mut verifications = Vec::with_capacity(request.results.len());

        for reported in &request.results {
            let v = self.verifier.verify_device_result(reported);
            verifications.push(DeviceVerification {
                action_id: reported.action_id.clone(),
                matched: v.matched,
                discrepancies: v.discrepancies,
            });

            self.audit.record(&AuditRecord::for_device_result(
                user_id,
                request.plan_id.clone(),
                format!("device:{}", reported.action_id),
                Some(reported.result.clone()),
                reported.success,
                reported.error.clone(),
            ))?;
        }
        self.audit.seal(&request.plan_id)?;

        let status = if verifications.iter().all(|v| v.matched) {
            DeviceReportStatus::Verified
        } else {
            DeviceReportStatus::PartialFailure
        };
        Ok(DeviceResultResponse {
            status,
            verifications,
        })
    }

    /// Forget the user's conversation entirely.
    pub fn clear_session(&self, user_id: &str) -> ValetResult<()> {
        self.sessions.clear(user_id)
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    fn context_for(
        &self,
        user_id: &str,
        plan: &ActionPlan,
        linked_providers: &[String],
        location: Option<(f64, f64)>,
    ) -> ToolContext {
        let mut ctx = ToolContext::new(user_id.to_string());
        ctx.timezone = plan.timezone.clone();
        ctx.locale = plan.locale.clone();
        ctx.linked_providers = linked_providers.to_vec();
        if let Some((lat, lng)) = location {
            ctx.latitude = Some(lat);
            ctx.longitude = Some(lng);
        }
        ctx
    }

    /// The shared tail of both execution paths: verify, audit, persist,
    /// respond.
    async fn finish(
        &self,
        user_id: &str,
        plan: ActionPlan,
        exec_result: ExecutionResult,
        mut turns: Vec<ChatTurn>,
        ctx: &ToolContext,
    ) -> ValetResult<CommandResponse> {
        for sr in &exec_result.step_results {
            // Verification is advisory. A read-back that itself fails (e.g.
            // the provider errors on the re-read) must not abort auditing or
            // session persistence for steps that already executed.
            let report = match self.verifier.verify_step(sr, ctx).await {
                Ok(report) => report,
                Err(e) => VerificationResult::mismatch(vec![format!(
                    "read-back failed: {}",
                    e
                )]),
            };
            if !report.matched {
                warn!(
                    tool = %sr.step.tool_name,
                    plan_id = %plan.plan_id,
                    discrepancies = ?report.discrepancies,
                    "read-back verification mismatch"
                );
            }

            self.audit.record(&AuditRecord::for_step(
                user_id,
                plan.plan_id.clone(),
                sr.step.tool_name.clone(),
                sr.step.args.clone(),
                sr.result.clone(),
                sr.error.clone(),
            ))?;
        }
        self.audit.seal(&plan.plan_id)?;

        append_tool_results(&mut turns, &tool_result_pairs(&exec_result));
        self.sessions.save(user_id, turns)?;

        Ok(CommandResponse {
            spoken_response: spoken_summary(&plan, &exec_result),
            action_plan: Some(plan.clone()),
            device_actions: exec_result.device_actions,
            requires_confirmation: false,
            confirmation_prompt: None,
            plan_id: Some(plan.plan_id),
            attachments: Vec::new(),
        })
    }
}

/// Join the confirmation phrases of the flagged steps, or fall back to a
/// generic prompt naming the intent.
fn confirmation_prompt(plan: &ActionPlan) -> String {
    let phrases: Vec<&str> = plan
        .steps
        .iter()
        .filter(|s| s.requires_confirmation)
        .filter_map(|s| s.confirmation_phrase.as_deref())
        .collect();
    if phrases.is_empty() {
        format!("Confirm: {}?", plan.user_intent)
    } else {
        phrases.join(" ")
    }
}

/// One spoken sentence per attempted step.
fn spoken_summary(plan: &ActionPlan, exec_result: &ExecutionResult) -> String {
    if plan.steps.is_empty() {
        return NO_ACTIONS_REPLY.to_string();
    }

    let parts: Vec<String> = exec_result
        .step_results
        .iter()
        .map(|sr| {
            if sr.device_action.is_some() {
                format!("Sending '{}' to your device.", sr.step.tool_name)
            } else if sr.success {
                format!("Done: {}.", sr.step.tool_name)
            } else {
                format!(
                    "Failed: {} — {}",
                    sr.step.tool_name,
                    sr.error.as_deref().unwrap_or("unknown error")
                )
            }
        })
        .collect();

    if parts.is_empty() {
        format!("Planned: {}", plan.user_intent)
    } else {
        parts.join(" ")
    }
}

/// Pair each step result with its originating tool-call id for the session
/// history.
fn tool_result_pairs(exec_result: &ExecutionResult) -> Vec<(String, serde_json::Value)> {
    exec_result
        .step_results
        .iter()
        .filter_map(|sr| {
            let call_id = sr.step.source_call_id.clone()?;
            let content = if let Some(action) = &sr.device_action {
                serde_json::json!({"delegated_to_device": true, "action_id": action.action_id})
            } else if let Some(result) = &sr.result {
                serde_json::Value::Object(result.clone())
            } else {
                serde_json::json!({"error": sr.error.as_deref().unwrap_or("unknown error")})
            };
            Some((call_id, content))
        })
        .collect()
}

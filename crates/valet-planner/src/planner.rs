//! Plan synthesis from a single LLM turn.
//!
//! The planner owns the first risk pass: a provisional risk level and
//! confirmation flag inferred from the tool name's lexical class. The
//! policy evaluator runs after and can only raise what is set here.
//!
//! Validation failures trigger exactly one retry with the validation
//! errors appended to the utterance; a second failure surfaces as
//! `ValetError::Planning`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use valet_contracts::{
    error::{ValetError, ValetResult},
    llm::{LlmResponse, ToolCall},
    plan::{ActionPlan, ActionStep, RiskLevel},
    session::{ChatTurn, ContentBlock},
    tool::ExecutionSurface,
};
use valet_core::ToolRegistry;
use valet_llm::LlmClient;

use crate::prompt::build_system_prompt;

const FALLBACK_REPLY: &str = "I'm not sure how to help with that.";

/// Everything a planning turn needs besides the registry.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub transcript: String,
    pub timezone: String,
    pub locale: String,
    pub linked_providers: Vec<String>,
    pub history: Vec<ChatTurn>,
}

/// The result of one planning turn.
#[derive(Debug)]
pub enum PlanOutcome {
    /// The model answered in text; there is nothing to execute.
    Conversation { reply: String },

    /// A candidate plan plus the assistant turn to persist in the session.
    Plan {
        plan: ActionPlan,
        assistant_turn: ChatTurn,
    },
}

pub struct Planner {
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>) -> Self {
        Self { llm, registry }
    }

    /// Run one planning turn.
    ///
    /// A response without tool calls is a conversational reply. Otherwise
    /// every call is validated against its tool's argument schema; invalid
    /// calls cause a single retry carrying the validation errors, and a
    /// second invalid response is a planning error.
    pub async fn plan(&self, request: &PlanRequest) -> ValetResult<PlanOutcome> {
        let system = build_system_prompt(
            &self.registry,
            &request.timezone,
            &request.locale,
            &request.linked_providers,
        );
        let specs = self.registry.tool_specs();

        let response = self
            .llm
            .chat(&system, &request.transcript, &specs, &request.history)
            .await?;

        let response = match self.validate_calls(&response.tool_calls) {
            Ok(()) => response,
            Err(errors) => {
                warn!(errors = errors.len(), "plan failed validation, retrying once");
                let retry_message = format!(
                    "{}\n\nYour previous tool calls were invalid:\n{}\nCall the tools again with corrected arguments.",
                    request.transcript,
                    errors.join("\n"),
                );
                let retried = self
                    .llm
                    .chat(&system, &retry_message, &specs, &request.history)
                    .await?;
                if let Err(errors) = self.validate_calls(&retried.tool_calls) {
                    return Err(ValetError::Planning {
                        reason: errors.join("; "),
                    });
                }
                retried
            }
        };

        if response.tool_calls.is_empty() {
            let reply = response
                .text
                .clone()
                .unwrap_or_else(|| FALLBACK_REPLY.to_string());
            debug!("no tool calls; conversational reply");
            return Ok(PlanOutcome::Conversation { reply });
        }

        let mut plan = ActionPlan::new(
            request.transcript.clone(),
            request.timezone.clone(),
            request.locale.clone(),
        );
        for call in &response.tool_calls {
            plan.steps.push(self.synthesize_step(call));
        }

        info!(
            plan_id = %plan.plan_id,
            steps = plan.steps.len(),
            max_risk = ?plan.max_risk(),
            "plan synthesized"
        );

        let assistant_turn = assistant_turn_for(&response);
        Ok(PlanOutcome::Plan {
            plan,
            assistant_turn,
        })
    }

    /// Build one step from a tool call, inferring provisional risk from the
    /// action name and resolving the surface from the registry.
    fn synthesize_step(&self, call: &ToolCall) -> ActionStep {
        let surface = self
            .registry
            .surface_of(&call.name)
            .unwrap_or(ExecutionSurface::Server);

        let mut step = ActionStep::new(call.name.clone(), call.arguments.clone(), surface);
        step.source_call_id = Some(call.id.clone());

        let action = call.name.rsplit('.').next().unwrap_or(&call.name);
        if ["delete", "cancel", "remove"]
            .iter()
            .any(|verb| action.starts_with(verb))
        {
            step.risk_level = RiskLevel::High;
            step.requires_confirmation = true;
        } else if (action.starts_with("create") || action.starts_with("update"))
            && has_attendees(call)
        {
            step.risk_level = RiskLevel::Medium;
            step.requires_confirmation = true;
        }

        step
    }

    /// Check every call against its tool's argument schema.
    ///
    /// Unknown tool names are a validation failure here (the retry gives
    /// the model a chance to pick a real one) rather than an execution
    /// failure later.
    fn validate_calls(&self, calls: &[ToolCall]) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for call in calls {
            let tool = match self.registry.get(&call.name) {
                Some(tool) => tool,
                None => {
                    errors.push(format!("- '{}' is not a known tool", call.name));
                    continue;
                }
            };

            let schema = tool.parameters_schema();
            let validator = match jsonschema::validator_for(&schema) {
                Ok(validator) => validator,
                // A tool shipping a broken schema is a registration bug,
                // not the model's fault; skip rather than fail the plan.
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "tool schema does not compile");
                    continue;
                }
            };

            let args = serde_json::Value::Object(call.arguments.clone());
            for error in validator.iter_errors(&args) {
                errors.push(format!(
                    "- '{}' arguments invalid at {}: {}",
                    call.name, error.instance_path, error
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn has_attendees(call: &ToolCall) -> bool {
    call.arguments
        .get("attendees")
        .and_then(|v| v.as_array())
        .map(|a| !a.is_empty())
        .unwrap_or(false)
}

/// Serialize a response into the assistant turn stored in the session.
fn assistant_turn_for(response: &LlmResponse) -> ChatTurn {
    let mut blocks = Vec::new();
    if let Some(text) = &response.text {
        blocks.push(ContentBlock::Text { text: text.clone() });
    }
    for call in &response.tool_calls {
        blocks.push(ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.arguments.clone(),
        });
    }
    ChatTurn::assistant_blocks(blocks)
}

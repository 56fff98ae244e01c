//! # valet-planner
//!
//! Turns one user utterance into a candidate
//! [`ActionPlan`](valet_contracts::plan::ActionPlan) via a single LLM turn.
//!
//! ## Overview
//!
//! The planner assembles the system prompt from the registry's skill
//! manifests, sends the utterance with the full tool-spec list, and either
//! passes a text reply through as conversation or synthesizes one
//! [`ActionStep`](valet_contracts::plan::ActionStep) per tool call.
//! Arguments are validated against each tool's JSON Schema; one retry is
//! allowed, with the validation errors appended to the utterance.
//!
//! Risk inference here is provisional and lexical (delete/cancel/remove
//! verbs, attendee-carrying creates); the policy evaluator has the final,
//! configuration-driven word and can only escalate.

pub mod planner;
pub mod prompt;

pub use planner::{PlanOutcome, PlanRequest, Planner};
pub use prompt::build_system_prompt;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use valet_contracts::{
        error::{ValetError, ValetResult},
        llm::{LlmResponse, ToolCall},
        plan::{Args, RiskLevel},
        session::ChatTurn,
        tool::{ExecutionSurface, SkillManifest, ToolContext, ToolSpec},
    };
    use valet_core::{traits::DeviceToolSpec, traits::ServerTool, ToolRegistry};
    use valet_llm::LlmClient;

    use crate::{build_system_prompt, PlanOutcome, PlanRequest, Planner};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn args(v: serde_json::Value) -> Args {
        match v {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected JSON object"),
        }
    }

    /// A scripted LLM: returns canned responses in order and records every
    /// message it was sent.
    struct ScriptedLlm {
        responses: Mutex<Vec<LlmResponse>>,
        messages: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<LlmResponse>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                messages: Mutex::new(Vec::new()),
            }
        }

        fn sent_messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat(
            &self,
            _system: &str,
            message: &str,
            _tools: &[ToolSpec],
            _history: &[ChatTurn],
        ) -> ValetResult<LlmResponse> {
            self.messages.lock().unwrap().push(message.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ValetError::Llm {
                    reason: "script exhausted".to_string(),
                })
        }

        async fn follow_up(
            &self,
            _system: &str,
            _history: &[ChatTurn],
            _tools: &[ToolSpec],
        ) -> ValetResult<LlmResponse> {
            Err(ValetError::Llm {
                reason: "not scripted".to_string(),
            })
        }
    }

    struct SchemaTool {
        name: &'static str,
        schema: serde_json::Value,
    }

    #[async_trait]
    impl ServerTool for SchemaTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "test tool"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            self.schema.clone()
        }
        async fn execute(&self, args: &Args, _ctx: &ToolContext) -> ValetResult<Args> {
            Ok(args.clone())
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry
            .register_server(Arc::new(SchemaTool {
                name: "google_calendar.delete_event",
                schema: json!({
                    "type": "object",
                    "properties": {"event_id": {"type": "string"}},
                    "required": ["event_id"],
                }),
            }))
            .unwrap();
        registry
            .register_server(Arc::new(SchemaTool {
                name: "google_calendar.create_event",
                schema: json!({"type": "object"}),
            }))
            .unwrap();
        registry
            .register_device(DeviceToolSpec {
                name: "device_calendar.create_event".to_string(),
                description: "create an on-device event".to_string(),
                parameters_schema: json!({"type": "object"}),
            })
            .unwrap();
        registry.register_skill(SkillManifest {
            name: "calendar".to_string(),
            display_name: "Calendar".to_string(),
            description: "manage events".to_string(),
            tool_names: vec!["google_calendar.delete_event".to_string()],
            planner_instructions: vec!["List events before deleting one.".to_string()],
        });
        Arc::new(registry)
    }

    fn request(transcript: &str) -> PlanRequest {
        PlanRequest {
            transcript: transcript.to_string(),
            timezone: "UTC".to_string(),
            locale: "en-US".to_string(),
            linked_providers: vec!["google_calendar".to_string()],
            history: Vec::new(),
        }
    }

    fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: format!("call-{}", name),
            name: name.to_string(),
            arguments: args(arguments),
        }
    }

    // ── 1. conversational replies ─────────────────────────────────────────────

    #[tokio::test]
    async fn test_text_only_response_is_conversation() {
        let llm = Arc::new(ScriptedLlm::new(vec![LlmResponse {
            text: Some("Hello!".to_string()),
            tool_calls: Vec::new(),
        }]));
        let planner = Planner::new(llm, registry());

        match planner.plan(&request("hi")).await.unwrap() {
            PlanOutcome::Conversation { reply } => assert_eq!(reply, "Hello!"),
            PlanOutcome::Plan { .. } => panic!("expected a conversational outcome"),
        }
    }

    // ── 2. risk inference ─────────────────────────────────────────────────────

    /// The canonical destructive utterance yields a high-risk, confirmed
    /// delete step.
    #[tokio::test]
    async fn test_delete_call_is_high_risk() {
        let llm = Arc::new(ScriptedLlm::new(vec![LlmResponse {
            text: None,
            tool_calls: vec![call(
                "google_calendar.delete_event",
                json!({"event_id": "ev-dentist"}),
            )],
        }]));
        let planner = Planner::new(llm, registry());

        let outcome = planner
            .plan(&request("Cancel my dentist appointment"))
            .await
            .unwrap();
        let plan = match outcome {
            PlanOutcome::Plan { plan, .. } => plan,
            _ => panic!("expected a plan"),
        };

        assert_eq!(plan.user_intent, "Cancel my dentist appointment");
        let step = &plan.steps[0];
        assert_eq!(step.risk_level, RiskLevel::High);
        assert!(step.requires_confirmation);
        assert_eq!(step.execution_surface, ExecutionSurface::Server);
        assert_eq!(
            step.source_call_id.as_deref(),
            Some("call-google_calendar.delete_event")
        );
    }

    #[tokio::test]
    async fn test_create_with_attendees_is_medium_risk() {
        let llm = Arc::new(ScriptedLlm::new(vec![LlmResponse {
            text: None,
            tool_calls: vec![call(
                "google_calendar.create_event",
                json!({"title": "Sync", "attendees": ["a@x.com"]}),
            )],
        }]));
        let planner = Planner::new(llm, registry());

        let outcome = planner.plan(&request("set up a sync with Ana")).await.unwrap();
        let plan = match outcome {
            PlanOutcome::Plan { plan, .. } => plan,
            _ => panic!("expected a plan"),
        };
        assert_eq!(plan.steps[0].risk_level, RiskLevel::Medium);
        assert!(plan.steps[0].requires_confirmation);
    }

    /// Device tools resolve the device surface from the registry.
    #[tokio::test]
    async fn test_device_tool_surface_is_resolved() {
        let llm = Arc::new(ScriptedLlm::new(vec![LlmResponse {
            text: None,
            tool_calls: vec![call("device_calendar.create_event", json!({"title": "Gym"}))],
        }]));
        let planner = Planner::new(llm, registry());

        let outcome = planner.plan(&request("add gym to my phone")).await.unwrap();
        let plan = match outcome {
            PlanOutcome::Plan { plan, .. } => plan,
            _ => panic!("expected a plan"),
        };
        assert_eq!(plan.steps[0].execution_surface, ExecutionSurface::Device);
    }

    // ── 3. validation retry ───────────────────────────────────────────────────

    /// Invalid arguments trigger exactly one retry carrying the errors; a
    /// valid second response becomes the plan.
    #[tokio::test]
    async fn test_invalid_arguments_retry_once() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            LlmResponse {
                text: None,
                tool_calls: vec![call("google_calendar.delete_event", json!({}))],
            },
            LlmResponse {
                text: None,
                tool_calls: vec![call(
                    "google_calendar.delete_event",
                    json!({"event_id": "ev-1"}),
                )],
            },
        ]));
        let planner = Planner::new(llm.clone(), registry());

        let outcome = planner.plan(&request("cancel it")).await.unwrap();
        assert!(matches!(outcome, PlanOutcome::Plan { .. }));

        let messages = llm.sent_messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].contains("invalid"));
        assert!(messages[1].contains("cancel it"));
    }

    /// A second invalid response is a planning error, not a third attempt.
    #[tokio::test]
    async fn test_second_failure_is_a_planning_error() {
        let invalid = || LlmResponse {
            text: None,
            tool_calls: vec![call("google_calendar.no_such_tool", json!({}))],
        };
        let llm = Arc::new(ScriptedLlm::new(vec![invalid(), invalid()]));
        let planner = Planner::new(llm.clone(), registry());

        let err = planner.plan(&request("cancel it")).await.unwrap_err();
        assert!(matches!(err, ValetError::Planning { .. }));
        assert_eq!(llm.sent_messages().len(), 2);
    }

    // ── 4. session turn ───────────────────────────────────────────────────────

    /// The plan outcome carries an assistant turn with the tool-use blocks.
    #[tokio::test]
    async fn test_plan_outcome_carries_assistant_turn() {
        let llm = Arc::new(ScriptedLlm::new(vec![LlmResponse {
            text: Some("Cancelling it.".to_string()),
            tool_calls: vec![call(
                "google_calendar.delete_event",
                json!({"event_id": "ev-1"}),
            )],
        }]));
        let planner = Planner::new(llm, registry());

        let outcome = planner.plan(&request("cancel it")).await.unwrap();
        let turn = match outcome {
            PlanOutcome::Plan { assistant_turn, .. } => assistant_turn,
            _ => panic!("expected a plan"),
        };
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "tool_use");
        assert_eq!(json["content"][1]["name"], "google_calendar.delete_event");
    }

    // ── 5. prompt assembly ────────────────────────────────────────────────────

    #[test]
    fn test_system_prompt_includes_manifests_and_context() {
        let registry = registry();
        let prompt = build_system_prompt(
            &registry,
            "Europe/Madrid",
            "es-ES",
            &["google_calendar".to_string()],
        );

        assert!(prompt.contains("**Calendar**: manage events"));
        assert!(prompt.contains("List events before deleting one."));
        assert!(prompt.contains("Europe/Madrid"));
        assert!(prompt.contains("es-ES"));
        assert!(prompt.contains("ISO-8601"));
    }
}

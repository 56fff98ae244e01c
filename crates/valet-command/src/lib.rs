//! # valet-command
//!
//! The top of the engine: [`CommandService`] turns one transcribed
//! utterance into planned, gated, verified, and audited side effects, and
//! owns the confirm / device-result / clear-session operations a transport
//! layer exposes.
//!
//! The service is deliberately transport-free. An HTTP server maps its
//! routes onto these methods; the demo CLI calls them directly.

pub mod service;

pub use service::CommandService;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use valet_audit::InMemoryAuditSink;
    use valet_contracts::{
        audit::AuditStatus,
        command::{CommandRequest, ConfirmRequest, DeviceReportStatus, DeviceResultRequest},
        device::DeviceActionResult,
        error::{ValetError, ValetResult},
        llm::{LlmResponse, ToolCall},
        plan::Args,
        session::ChatTurn,
        tool::ToolSpec,
    };
    use valet_core::{PendingPlans, ToolRegistry};
    use valet_llm::LlmClient;
    use valet_planner::Planner;
    use valet_policy::PolicyEngine;
    use valet_session::{InMemorySessionStore, SessionManager};
    use valet_skills::{
        register_builtin_skills, CalendarConnector, MailConnector, RoutesConnector,
        SearchConnector,
    };

    use crate::CommandService;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn args(v: Value) -> Args {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected JSON object"),
        }
    }

    struct ScriptedLlm {
        responses: Mutex<Vec<LlmResponse>>,
    }

    impl ScriptedLlm {
        fn new(mut responses: Vec<LlmResponse>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat(
            &self,
            _system: &str,
            _message: &str,
            _tools: &[ToolSpec],
            _history: &[ChatTurn],
        ) -> ValetResult<LlmResponse> {
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

    struct FakeCalendar;

    #[async_trait]
    impl CalendarConnector for FakeCalendar {
        async fn list_events(
            &self,
            _time_min: &str,
            _time_max: &str,
            _query: Option<&str>,
            _calendar_id: &str,
            _max_results: u64,
        ) -> ValetResult<Vec<Value>> {
            Ok(vec![json!({"id": "ev-dentist", "summary": "Dentist"})])
        }

        async fn create_event(&self, event: &Args, _send_updates: &str) -> ValetResult<Value> {
            Ok(json!({
                "id": "ev-new",
                "summary": event.get("title").cloned().unwrap_or(Value::Null),
            }))
        }

        async fn update_event(
            &self,
            event_id: &str,
            patch_fields: &Args,
            _calendar_id: &str,
            _send_updates: &str,
        ) -> ValetResult<Value> {
            let mut event = json!({"id": event_id});
            for (k, v) in patch_fields {
                event[k] = v.clone();
            }
            Ok(event)
        }

        async fn delete_event(
            &self,
            _event_id: &str,
            _calendar_id: &str,
            _send_updates: &str,
        ) -> ValetResult<()> {
            Ok(())
        }

        async fn get_event(&self, event_id: &str, _calendar_id: &str) -> ValetResult<Value> {
            Ok(json!({"id": event_id, "summary": "Dentist"}))
        }
    }

    /// Creates fine but fails every read-back.
    struct UnreadableCalendar;

    #[async_trait]
    impl CalendarConnector for UnreadableCalendar {
        async fn list_events(
            &self,
            _time_min: &str,
            _time_max: &str,
            _query: Option<&str>,
            _calendar_id: &str,
            _max_results: u64,
        ) -> ValetResult<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn create_event(&self, _event: &Args, _send_updates: &str) -> ValetResult<Value> {
            Ok(json!({"id": "ev-new"}))
        }

        async fn update_event(
            &self,
            event_id: &str,
            _patch_fields: &Args,
            _calendar_id: &str,
            _send_updates: &str,
        ) -> ValetResult<Value> {
            Ok(json!({"id": event_id}))
        }

        async fn delete_event(
            &self,
            _event_id: &str,
            _calendar_id: &str,
            _send_updates: &str,
        ) -> ValetResult<()> {
            Ok(())
        }

        async fn get_event(&self, _event_id: &str, _calendar_id: &str) -> ValetResult<Value> {
            Err(ValetError::ToolExecution {
                tool: "google_calendar.get_event".to_string(),
                reason: "read-back unavailable".to_string(),
            })
        }
    }

    struct FakeSearch;

    #[async_trait]
    impl SearchConnector for FakeSearch {
        async fn search(
            &self,
            query: &str,
            _count: u64,
            _country: Option<&str>,
        ) -> ValetResult<Vec<Value>> {
            Ok(vec![json!({"title": query})])
        }
    }

    struct FakeMail;

    #[async_trait]
    impl MailConnector for FakeMail {
        async fn search_messages(
            &self,
            _query: &str,
            _max_results: u64,
        ) -> ValetResult<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn get_message(&self, message_id: &str) -> ValetResult<Value> {
            Ok(json!({"id": message_id}))
        }
    }

    struct FakeRoutes;

    #[async_trait]
    impl RoutesConnector for FakeRoutes {
        async fn compute_route(
            &self,
            origin: &str,
            destination: &str,
            _travel_mode: &str,
            _departure_time: Option<&str>,
        ) -> ValetResult<Value> {
            Ok(json!({
                "origin": origin,
                "destination": destination,
                "duration_seconds": 1500,
                "duration_text": "25 mins",
                "distance_text": "12 km",
            }))
        }
    }

    struct Fixture {
        service: CommandService,
        audit: Arc<InMemoryAuditSink>,
        pending: Arc<PendingPlans>,
    }

    fn fixture(responses: Vec<LlmResponse>) -> Fixture {
        fixture_with_calendar(Arc::new(FakeCalendar), responses)
    }

    fn fixture_with_calendar(
        calendar: Arc<dyn CalendarConnector>,
        responses: Vec<LlmResponse>,
    ) -> Fixture {
        let mut registry = ToolRegistry::new();
        register_builtin_skills(
            &mut registry,
            calendar,
            Arc::new(FakeSearch),
            Arc::new(FakeMail),
            Arc::new(FakeRoutes),
        )
        .unwrap();
        let registry = Arc::new(registry);

        let audit = Arc::new(InMemoryAuditSink::new());
        let pending = Arc::new(PendingPlans::default());
        let service = CommandService::new(
            Planner::new(ScriptedLlm::new(responses), registry.clone()),
            PolicyEngine::builtin(),
            registry,
            pending.clone(),
            audit.clone(),
            SessionManager::new(Arc::new(InMemorySessionStore::new())),
        );
        Fixture {
            service,
            audit,
            pending,
        }
    }

    fn request(transcript: &str) -> CommandRequest {
        CommandRequest {
            transcript: transcript.to_string(),
            timezone: "UTC".to_string(),
            locale: "en-US".to_string(),
            linked_providers: vec!["google_calendar".to_string()],
            latitude: None,
            longitude: None,
        }
    }

    fn delete_call() -> LlmResponse {
        LlmResponse {
            text: None,
            tool_calls: vec![ToolCall {
                id: "call-1".to_string(),
                name: "google_calendar.delete_event".to_string(),
                arguments: args(json!({"event_id": "ev-dentist"})),
            }],
        }
    }

    // ── 1. the cancel scenario ────────────────────────────────────────────────

    /// "Cancel my dentist appointment" parks a high-risk plan; confirming
    /// it executes the delete and audits an intact chain.
    #[tokio::test]
    async fn test_cancel_requires_confirmation_then_executes() {
        let f = fixture(vec![delete_call()]);

        let response = f
            .service
            .handle_command("user-1", &request("Cancel my dentist appointment"))
            .await
            .unwrap();

        assert!(response.requires_confirmation);
        let plan_id = response.plan_id.clone().unwrap();
        assert_eq!(f.pending.len(), 1);
        assert!(response
            .confirmation_prompt
            .as_deref()
            .unwrap()
            .contains("permanently delete"));
        let plan = response.action_plan.unwrap();
        assert!(plan.steps[0].requires_confirmation);

        let confirmed = f
            .service
            .confirm("user-1", &ConfirmRequest {
                plan_id: plan_id.clone(),
            })
            .await
            .unwrap();

        assert!(!confirmed.requires_confirmation);
        assert_eq!(
            confirmed.spoken_response,
            "Done: google_calendar.delete_event."
        );
        assert_eq!(f.pending.len(), 0);

        let chain = f.audit.export_chain(&plan_id).unwrap();
        assert_eq!(chain.events.len(), 1);
        assert_eq!(chain.events[0].record.tool_name, "google_calendar.delete_event");
        assert!(f.audit.verify_integrity(&plan_id));
    }

    /// Confirming someone else's plan is forbidden and leaves the entry;
    /// confirming an unknown id is not-found.
    #[tokio::test]
    async fn test_confirm_ownership_and_not_found() {
        let f = fixture(vec![delete_call()]);
        let response = f
            .service
            .handle_command("user-1", &request("Cancel my dentist appointment"))
            .await
            .unwrap();
        let plan_id = response.plan_id.unwrap();

        let err = f
            .service
            .confirm("user-2", &ConfirmRequest {
                plan_id: plan_id.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ValetError::PlanOwnership { .. }));
        assert_eq!(f.pending.len(), 1);

        let err = f
            .service
            .confirm("user-1", &ConfirmRequest {
                plan_id: "plan-nope".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ValetError::PlanNotFound { .. }));
    }

    // ── 2. conversational path ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_text_reply_is_conversational() {
        let f = fixture(vec![LlmResponse {
            text: Some("Hello there.".to_string()),
            tool_calls: Vec::new(),
        }]);

        let response = f
            .service
            .handle_command("user-1", &request("good morning"))
            .await
            .unwrap();

        assert_eq!(response.spoken_response, "Hello there.");
        assert!(response.action_plan.is_none());
        assert!(!response.requires_confirmation);
        assert_eq!(f.pending.len(), 0);
    }

    // ── 3. device delegation ──────────────────────────────────────────────────

    /// A device-surface step produces a DeviceAction; the reported result
    /// closes the loop through device_results.
    #[tokio::test]
    async fn test_device_flow() {
        let f = fixture(vec![LlmResponse {
            text: None,
            tool_calls: vec![ToolCall {
                id: "call-1".to_string(),
                name: "device_calendar.create_event".to_string(),
                arguments: args(json!({
                    "title": "Gym",
                    "start": "2026-09-01T18:00:00Z",
                    "end": "2026-09-01T19:00:00Z",
                })),
            }],
        }]);

        let response = f
            .service
            .handle_command("user-1", &request("add gym tonight to my phone calendar"))
            .await
            .unwrap();

        assert!(!response.requires_confirmation);
        assert_eq!(response.device_actions.len(), 1);
        let action = &response.device_actions[0];
        assert_eq!(action.tool_name, "device_calendar.create_event");
        assert!(response
            .spoken_response
            .contains("Sending 'device_calendar.create_event' to your device."));

        let plan_id = response.plan_id.unwrap();
        let report = f
            .service
            .device_results(
                "user-1",
                &DeviceResultRequest {
                    plan_id: plan_id.clone(),
                    results: vec![DeviceActionResult {
                        action_id: action.action_id.clone(),
                        idempotency_key: action.idempotency_key.clone(),
                        success: true,
                        result: args(json!({"event_id": "local-1"})),
                        error: None,
                    }],
                },
            )
            .unwrap();

        assert_eq!(report.status, DeviceReportStatus::Verified);
        assert!(report.verifications[0].matched);

        let failed = f
            .service
            .device_results(
                "user-1",
                &DeviceResultRequest {
                    plan_id,
                    results: vec![DeviceActionResult {
                        action_id: action.action_id.clone(),
                        idempotency_key: action.idempotency_key.clone(),
                        success: false,
                        result: Args::new(),
                        error: Some("permission denied".to_string()),
                    }],
                },
            )
            .unwrap();
        assert_eq!(failed.status, DeviceReportStatus::PartialFailure);
    }

    /// A device that reports failure without an error message is still a
    /// failure: the audit record carries `Error` status.
    #[tokio::test]
    async fn test_silent_device_failure_audits_as_error() {
        let f = fixture(vec![LlmResponse {
            text: None,
            tool_calls: vec![ToolCall {
                id: "call-1".to_string(),
                name: "device_calendar.create_event".to_string(),
                arguments: args(json!({
                    "title": "Gym",
                    "start": "2026-09-01T18:00:00Z",
                    "end": "2026-09-01T19:00:00Z",
                })),
            }],
        }]);

        let response = f
            .service
            .handle_command("user-1", &request("add gym tonight to my phone calendar"))
            .await
            .unwrap();
        let action = &response.device_actions[0];
        let plan_id = response.plan_id.clone().unwrap();

        let report = f
            .service
            .device_results(
                "user-1",
                &DeviceResultRequest {
                    plan_id: plan_id.clone(),
                    results: vec![DeviceActionResult {
                        action_id: action.action_id.clone(),
                        idempotency_key: action.idempotency_key.clone(),
                        success: false,
                        result: Args::new(),
                        error: None,
                    }],
                },
            )
            .unwrap();

        assert_eq!(report.status, DeviceReportStatus::PartialFailure);
        let chain = f.audit.export_chain(&plan_id).unwrap();
        let record = &chain.events.last().unwrap().record;
        assert_eq!(record.status, AuditStatus::Error);
    }

    // ── 4. immediate execution ────────────────────────────────────────────────

    /// A low-risk plan executes in the same request and reports per-step
    /// results.
    #[tokio::test]
    async fn test_low_risk_plan_executes_immediately() {
        let f = fixture(vec![LlmResponse {
            text: None,
            tool_calls: vec![ToolCall {
                id: "call-1".to_string(),
                name: "google_calendar.list_events".to_string(),
                arguments: args(json!({
                    "time_min": "2026-09-01T00:00:00Z",
                    "time_max": "2026-09-02T00:00:00Z",
                })),
            }],
        }]);

        let response = f
            .service
            .handle_command("user-1", &request("what's on my calendar tomorrow"))
            .await
            .unwrap();

        assert!(!response.requires_confirmation);
        assert_eq!(
            response.spoken_response,
            "Done: google_calendar.list_events."
        );
        let plan_id = response.plan_id.unwrap();
        assert_eq!(f.audit.export_chain(&plan_id).unwrap().events.len(), 1);
    }

    /// A failing read-back never loses the audit trail of a step that
    /// already executed. The request still succeeds, the record lands in
    /// the chain, and the chain stays intact.
    #[tokio::test]
    async fn test_failed_verification_still_audits_executed_step() {
        let f = fixture_with_calendar(
            Arc::new(UnreadableCalendar),
            vec![LlmResponse {
                text: None,
                tool_calls: vec![ToolCall {
                    id: "call-1".to_string(),
                    name: "google_calendar.create_event".to_string(),
                    arguments: args(json!({
                        "title": "Focus time",
                        "start": "2026-09-01T09:00:00Z",
                        "end": "2026-09-01T10:00:00Z",
                    })),
                }],
            }],
        );

        let response = f
            .service
            .handle_command("user-1", &request("block an hour of focus time"))
            .await
            .unwrap();

        let plan_id = response.plan_id.unwrap();
        let chain = f.audit.export_chain(&plan_id).unwrap();
        assert_eq!(chain.events.len(), 1);
        assert_eq!(
            chain.events[0].record.tool_name,
            "google_calendar.create_event"
        );
        assert!(f.audit.verify_integrity(&plan_id));
    }

    // ── 5. session clearing ───────────────────────────────────────────────────

    #[tokio::test]
    async fn test_clear_session() {
        let f = fixture(vec![LlmResponse {
            text: Some("Hi.".to_string()),
            tool_calls: Vec::new(),
        }]);
        f.service
            .handle_command("user-1", &request("hello"))
            .await
            .unwrap();
        f.service.clear_session("user-1").unwrap();
    }
}

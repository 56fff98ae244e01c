//! VALET — Demo CLI
//!
//! Runs one or all of the three command scenarios. Each scenario drives the
//! real VALET pipeline (planner, policy engine, executor, verifier, audit
//! chain) with a scripted planner model and mock connectors, so no network
//! access or API keys are needed.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- schedule
//!   cargo run -p demo -- cancel
//!   cargo run -p demo -- device

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use valet_audit::InMemoryAuditSink;
use valet_command::CommandService;
use valet_contracts::{
    command::{CommandRequest, ConfirmRequest, DeviceResultRequest},
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
    register_builtin_skills, CalendarConnector, MailConnector, RoutesConnector, SearchConnector,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// VALET — Command orchestration engine demo.
///
/// Each subcommand runs one or all of the scripted scenarios, demonstrating
/// planning, confirmation gating, device delegation, read-back verification,
/// and audit chain integrity.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "VALET command orchestration demo",
    long_about = "Runs VALET command scenarios showing action planning, risk-based\n\
                  confirmation, device delegation, and audit chain integrity."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: schedule a meeting (low risk, executes immediately).
    Schedule,
    /// Scenario 2: cancel an event (high risk, confirmation required).
    Cancel,
    /// Scenario 3: on-device calendar write (delegation + result report).
    Device,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all().await,
        Command::Schedule => run_schedule().await,
        Command::Cancel => run_cancel().await,
        Command::Device => run_device().await,
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_all() -> ValetResult<()> {
    run_schedule().await?;
    run_cancel().await?;
    run_device().await?;
    Ok(())
}

// ── Scripted planner model ────────────────────────────────────────────────────

/// Replays a fixed list of responses so scenarios are deterministic.
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
        let mut responses = self.responses.lock().map_err(|_| ValetError::Llm {
            reason: "script lock poisoned".to_string(),
        })?;
        responses.pop().ok_or_else(|| ValetError::Llm {
            reason: "scenario script exhausted".to_string(),
        })
    }

    async fn follow_up(
        &self,
        _system: &str,
        _history: &[ChatTurn],
        _tools: &[ToolSpec],
    ) -> ValetResult<LlmResponse> {
        Err(ValetError::Llm {
            reason: "follow-up not scripted".to_string(),
        })
    }
}

// ── Mock connectors ───────────────────────────────────────────────────────────

struct DemoCalendar;

#[async_trait]
impl CalendarConnector for DemoCalendar {
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
            "id": "ev-demo-1",
            "summary": event.get("title").cloned().unwrap_or(Value::Null),
            "htmlLink": "https://calendar.example/ev-demo-1",
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
        Ok(json!({"id": event_id, "summary": "Team sync"}))
    }
}

struct DemoSearch;

#[async_trait]
impl SearchConnector for DemoSearch {
    async fn search(
        &self,
        query: &str,
        _count: u64,
        _country: Option<&str>,
    ) -> ValetResult<Vec<Value>> {
        Ok(vec![json!({"title": query, "url": "https://example.com"})])
    }
}

struct DemoMail;

#[async_trait]
impl MailConnector for DemoMail {
    async fn search_messages(&self, query: &str, _max_results: u64) -> ValetResult<Vec<Value>> {
        Ok(vec![json!({
            "id": "msg-demo-1",
            "subject": format!("Re: {}", query),
            "from": "ana@example.com",
        })])
    }

    async fn get_message(&self, message_id: &str) -> ValetResult<Value> {
        Ok(json!({
            "id": message_id,
            "subject": "Re: team sync",
            "body": "Sounds good, see you there.",
        }))
    }
}

struct DemoRoutes;

#[async_trait]
impl RoutesConnector for DemoRoutes {
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

// ── Service wiring ────────────────────────────────────────────────────────────

struct Demo {
    service: CommandService,
    audit: Arc<InMemoryAuditSink>,
}

fn build_demo(responses: Vec<LlmResponse>) -> ValetResult<Demo> {
    let mut registry = ToolRegistry::new();
    register_builtin_skills(
        &mut registry,
        Arc::new(DemoCalendar),
        Arc::new(DemoSearch),
        Arc::new(DemoMail),
        Arc::new(DemoRoutes),
    )?;
    let registry = Arc::new(registry);

    let audit = Arc::new(InMemoryAuditSink::new());
    let service = CommandService::new(
        Planner::new(ScriptedLlm::new(responses), registry.clone()),
        PolicyEngine::builtin(),
        registry,
        Arc::new(PendingPlans::default()),
        audit.clone(),
        SessionManager::new(Arc::new(InMemorySessionStore::new())),
    );
    Ok(Demo { service, audit })
}

fn request(transcript: &str) -> CommandRequest {
    CommandRequest {
        transcript: transcript.to_string(),
        timezone: "America/New_York".to_string(),
        locale: "en-US".to_string(),
        linked_providers: vec!["google_calendar".to_string()],
        latitude: None,
        longitude: None,
    }
}

fn tool_call(name: &str, arguments: Value) -> LlmResponse {
    let arguments = match arguments {
        Value::Object(map) => map,
        _ => Args::new(),
    };
    LlmResponse {
        text: None,
        tool_calls: vec![ToolCall {
            id: "call-1".to_string(),
            name: name.to_string(),
            arguments,
        }],
    }
}

fn print_audit_status(audit: &InMemoryAuditSink, plan_id: &str) {
    let intact = audit.verify_integrity(plan_id);
    let events = audit
        .export_chain(plan_id)
        .map(|c| c.events.len())
        .unwrap_or(0);
    println!(
        "  audit chain: {} event(s), integrity {}",
        events,
        if intact { "OK" } else { "BROKEN" }
    );
}

// ── Scenario 1: schedule ──────────────────────────────────────────────────────

async fn run_schedule() -> ValetResult<()> {
    println!("── Scenario 1: schedule a meeting with attendees ──");

    let demo = build_demo(vec![tool_call(
        "google_calendar.create_event",
        json!({
            "title": "Team sync",
            "start": "2026-09-01T15:00:00-04:00",
            "end": "2026-09-01T15:30:00-04:00",
            "attendees": ["ana@example.com", "bo@example.com"],
            "send_updates": "all",
        }),
    )])?;

    let response = demo
        .service
        .handle_command(
            "demo-user",
            &request("schedule a team sync tomorrow at 3pm with Ana and Bo"),
        )
        .await?;

    println!("  user: schedule a team sync tomorrow at 3pm with Ana and Bo");
    println!("  valet: {}", response.spoken_response);

    // Inviting attendees is a notifying write, so the plan parks for
    // confirmation rather than executing immediately.
    let plan_id = response.plan_id.ok_or_else(|| ValetError::Planning {
        reason: "expected a parked plan".to_string(),
    })?;
    println!("  user: yes");

    let confirmed = demo
        .service
        .confirm("demo-user", &ConfirmRequest { plan_id: plan_id.clone() })
        .await?;
    println!("  valet: {}", confirmed.spoken_response);
    print_audit_status(&demo.audit, &plan_id);
    println!();
    Ok(())
}

// ── Scenario 2: cancel ────────────────────────────────────────────────────────

async fn run_cancel() -> ValetResult<()> {
    println!("── Scenario 2: cancel an event (confirmation) ──");

    let demo = build_demo(vec![tool_call(
        "google_calendar.delete_event",
        json!({"event_id": "ev-dentist"}),
    )])?;

    let response = demo
        .service
        .handle_command("demo-user", &request("cancel my dentist appointment"))
        .await?;

    println!("  user: cancel my dentist appointment");
    println!("  valet: {}", response.spoken_response);

    let plan_id = response.plan_id.ok_or_else(|| ValetError::Planning {
        reason: "expected a parked plan".to_string(),
    })?;
    println!("  user: yes");

    let confirmed = demo
        .service
        .confirm("demo-user", &ConfirmRequest { plan_id: plan_id.clone() })
        .await?;
    println!("  valet: {}", confirmed.spoken_response);
    print_audit_status(&demo.audit, &plan_id);
    println!();
    Ok(())
}

// ── Scenario 3: device delegation ─────────────────────────────────────────────

async fn run_device() -> ValetResult<()> {
    println!("── Scenario 3: on-device calendar write ──");

    let demo = build_demo(vec![tool_call(
        "device_calendar.create_event",
        json!({
            "title": "Gym",
            "start": "2026-09-01T18:00:00-04:00",
            "end": "2026-09-01T19:00:00-04:00",
        }),
    )])?;

    let response = demo
        .service
        .handle_command("demo-user", &request("add gym tonight to my phone calendar"))
        .await?;

    println!("  user: add gym tonight to my phone calendar");
    println!("  valet: {}", response.spoken_response);

    let plan_id = response.plan_id.ok_or_else(|| ValetError::Planning {
        reason: "expected a delegated plan".to_string(),
    })?;
    let action = response
        .device_actions
        .first()
        .ok_or_else(|| ValetError::Planning {
            reason: "expected a device action".to_string(),
        })?;

    // The device executes and reports back.
    let report = demo.service.device_results(
        "demo-user",
        &DeviceResultRequest {
            plan_id: plan_id.clone(),
            results: vec![DeviceActionResult {
                action_id: action.action_id.clone(),
                idempotency_key: action.idempotency_key.clone(),
                success: true,
                result: match json!({"event_id": "local-gym-1"}) {
                    Value::Object(map) => map,
                    _ => Args::new(),
                },
                error: None,
            }],
        },
    )?;

    println!("  device report: {:?}", report.status);
    print_audit_status(&demo.audit, &plan_id);
    println!();
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("VALET — Command Orchestration Engine");
    println!("Scripted Demo");
    println!("====================================");
    println!();
    println!("VALET pipeline per utterance:");
    println!("  [1] Planner turns the transcript into a typed action plan");
    println!("  [2] Policy engine escalates risk and gates destructive steps");
    println!("  [3] Executor runs server steps with at-most-once idempotency keys");
    println!("  [4] Device-surface steps are delegated, never run server-side");
    println!("  [5] Read-back verification + immutable SHA-256 audit chain");
    println!();
}

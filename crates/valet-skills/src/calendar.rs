//! Provider calendar tools: `google_calendar.*`.
//!
//! Create and update implement read-back `verify`: the event is fetched
//! again through the connector and compared field by field. List and delete
//! keep the default unconditional match (a deleted event has nothing to
//! read back; a listing asserts nothing).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use valet_contracts::{
    error::ValetResult,
    execution::VerificationResult,
    plan::Args,
    tool::ToolContext,
};
use valet_core::traits::ServerTool;

use crate::{
    args::{optional_str, optional_u64, required_object, required_str},
    connectors::CalendarConnector,
};

fn send_updates_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["all", "externalOnly", "none"],
        "default": "none",
    })
}

// ── list_events ───────────────────────────────────────────────────────────────

pub struct ListEventsTool {
    connector: Arc<dyn CalendarConnector>,
}

impl ListEventsTool {
    pub fn new(connector: Arc<dyn CalendarConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ServerTool for ListEventsTool {
    fn name(&self) -> &str {
        "google_calendar.list_events"
    }

    fn description(&self) -> &str {
        "List calendar events in a date range, optionally filtered by query text."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "time_min": {"type": "string", "format": "date-time"},
                "time_max": {"type": "string", "format": "date-time"},
                "query": {"type": "string"},
                "calendar_id": {"type": "string", "default": "primary"},
                "max_results": {"type": "integer", "default": 50},
            },
            "required": ["time_min", "time_max"],
        })
    }

    async fn execute(&self, args: &Args, _ctx: &ToolContext) -> ValetResult<Args> {
        let events = self
            .connector
            .list_events(
                required_str(args, "time_min", self.name())?,
                required_str(args, "time_max", self.name())?,
                args.get("query").and_then(|v| v.as_str()),
                optional_str(args, "calendar_id", "primary"),
                optional_u64(args, "max_results", 50),
            )
            .await?;

        let mut out = Args::new();
        out.insert("count".to_string(), json!(events.len()));
        out.insert("events".to_string(), Value::Array(events));
        Ok(out)
    }
}

// ── create_event ──────────────────────────────────────────────────────────────

pub struct CreateEventTool {
    connector: Arc<dyn CalendarConnector>,
}

impl CreateEventTool {
    pub fn new(connector: Arc<dyn CalendarConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ServerTool for CreateEventTool {
    fn name(&self) -> &str {
        "google_calendar.create_event"
    }

    fn description(&self) -> &str {
        "Create a new calendar event with title, start/end times, optional attendees and location."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "start": {"type": "string", "format": "date-time"},
                "end": {"type": "string", "format": "date-time"},
                "calendar_id": {"type": "string", "default": "primary"},
                "attendees": {"type": "array", "items": {"type": "string"}},
                "location": {"type": "string"},
                "description": {"type": "string"},
                "send_updates": send_updates_schema(),
            },
            "required": ["title", "start", "end"],
        })
    }

    async fn execute(&self, args: &Args, _ctx: &ToolContext) -> ValetResult<Args> {
        required_str(args, "title", self.name())?;
        required_str(args, "start", self.name())?;
        required_str(args, "end", self.name())?;

        let send_updates = optional_str(args, "send_updates", "none");
        let event = self.connector.create_event(args, send_updates).await?;

        let mut out = Args::new();
        out.insert(
            "event_id".to_string(),
            event.get("id").cloned().unwrap_or(Value::Null),
        );
        out.insert(
            "html_link".to_string(),
            event.get("htmlLink").cloned().unwrap_or(Value::Null),
        );
        out.insert("event".to_string(), event);
        Ok(out)
    }

    /// Read the created event back and compare its title.
    async fn verify(
        &self,
        args: &Args,
        result: &Args,
        _ctx: &ToolContext,
    ) -> ValetResult<VerificationResult> {
        let event_id = required_str(result, "event_id", self.name())?;
        let calendar_id = optional_str(args, "calendar_id", "primary");
        let event = self.connector.get_event(event_id, calendar_id).await?;

        let expected = args.get("title").and_then(|v| v.as_str());
        let actual = event.get("summary").and_then(|v| v.as_str());
        if expected == actual {
            Ok(VerificationResult::matched())
        } else {
            Ok(VerificationResult::mismatch(vec![format!(
                "title: expected {:?}, got {:?}",
                expected, actual
            )]))
        }
    }
}

// ── update_event ──────────────────────────────────────────────────────────────

pub struct UpdateEventTool {
    connector: Arc<dyn CalendarConnector>,
}

impl UpdateEventTool {
    pub fn new(connector: Arc<dyn CalendarConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ServerTool for UpdateEventTool {
    fn name(&self) -> &str {
        "google_calendar.update_event"
    }

    fn description(&self) -> &str {
        "Update an existing calendar event by patching specific fields."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "event_id": {"type": "string"},
                "calendar_id": {"type": "string", "default": "primary"},
                "patch_fields": {"type": "object"},
                "send_updates": send_updates_schema(),
            },
            "required": ["event_id", "patch_fields"],
        })
    }

    async fn execute(&self, args: &Args, _ctx: &ToolContext) -> ValetResult<Args> {
        let event = self
            .connector
            .update_event(
                required_str(args, "event_id", self.name())?,
                required_object(args, "patch_fields", self.name())?,
                optional_str(args, "calendar_id", "primary"),
                optional_str(args, "send_updates", "none"),
            )
            .await?;

        let mut out = Args::new();
        out.insert(
            "event_id".to_string(),
            event.get("id").cloned().unwrap_or(Value::Null),
        );
        out.insert("event".to_string(), event);
        Ok(out)
    }

    /// Read the event back and compare every patched field.
    async fn verify(
        &self,
        args: &Args,
        result: &Args,
        _ctx: &ToolContext,
    ) -> ValetResult<VerificationResult> {
        let event_id = required_str(result, "event_id", self.name())?;
        let calendar_id = optional_str(args, "calendar_id", "primary");
        let event = self.connector.get_event(event_id, calendar_id).await?;

        let patch = required_object(args, "patch_fields", self.name())?;
        let mut discrepancies = Vec::new();
        for (key, expected) in patch {
            let actual = event.get(key).unwrap_or(&Value::Null);
            if actual != expected {
                discrepancies.push(format!("{}: expected {}, got {}", key, expected, actual));
            }
        }

        if discrepancies.is_empty() {
            Ok(VerificationResult::matched())
        } else {
            Ok(VerificationResult::mismatch(discrepancies))
        }
    }
}

// ── delete_event ──────────────────────────────────────────────────────────────

pub struct DeleteEventTool {
    connector: Arc<dyn CalendarConnector>,
}

impl DeleteEventTool {
    pub fn new(connector: Arc<dyn CalendarConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ServerTool for DeleteEventTool {
    fn name(&self) -> &str {
        "google_calendar.delete_event"
    }

    fn description(&self) -> &str {
        "Delete a calendar event by ID."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "event_id": {"type": "string"},
                "calendar_id": {"type": "string", "default": "primary"},
                "send_updates": send_updates_schema(),
            },
            "required": ["event_id"],
        })
    }

    async fn execute(&self, args: &Args, _ctx: &ToolContext) -> ValetResult<Args> {
        let event_id = required_str(args, "event_id", self.name())?;
        self.connector
            .delete_event(
                event_id,
                optional_str(args, "calendar_id", "primary"),
                optional_str(args, "send_updates", "none"),
            )
            .await?;

        let mut out = Args::new();
        out.insert("deleted".to_string(), json!(true));
        out.insert("event_id".to_string(), json!(event_id));
        Ok(out)
    }
}

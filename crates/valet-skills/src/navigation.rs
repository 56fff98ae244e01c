//! Route tools: `google_routes.*`.
//!
//! All three tools are read-only queries against the routes connector. The
//! origin may be omitted, in which case the device location carried in the
//! tool context is used; a request with neither is a tool failure.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde_json::{json, Value};

use valet_contracts::{
    error::{ValetError, ValetResult},
    plan::Args,
    tool::ToolContext,
};
use valet_core::traits::ServerTool;

use crate::{args::required_str, connectors::RoutesConnector};

/// Leave-by estimates pad the travel time so "arrive at 9:00" does not mean
/// walking in at 9:00 sharp.
const DEPARTURE_BUFFER_SECONDS: i64 = 300;

fn travel_mode_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["DRIVE", "TRANSIT", "WALK", "BICYCLE"],
        "default": "DRIVE",
    })
}

fn origin_schema() -> Value {
    json!({
        "type": "string",
        "description": "Starting address or 'lat,lng'. Omit to use current device location.",
    })
}

/// Explicit origin if provided, otherwise the device location.
fn resolve_origin(args: &Args, ctx: &ToolContext, tool: &str) -> ValetResult<String> {
    if let Some(origin) = args.get("origin").and_then(Value::as_str) {
        if !origin.is_empty() {
            return Ok(origin.to_string());
        }
    }
    match (ctx.latitude, ctx.longitude) {
        (Some(lat), Some(lng)) => Ok(format!("{},{}", lat, lng)),
        _ => Err(ValetError::ToolExecution {
            tool: tool.to_string(),
            reason: "no origin provided and device location is not available".to_string(),
        }),
    }
}

fn travel_mode(args: &Args) -> &str {
    args.get("travel_mode")
        .and_then(Value::as_str)
        .unwrap_or("DRIVE")
}

fn route_to_args(route: Value, tool: &str) -> ValetResult<Args> {
    match route {
        Value::Object(map) => Ok(map),
        _ => Err(ValetError::ToolExecution {
            tool: tool.to_string(),
            reason: "connector returned a non-object route".to_string(),
        }),
    }
}

// ── get_directions ────────────────────────────────────────────────────────────

pub struct GetDirectionsTool {
    connector: Arc<dyn RoutesConnector>,
}

impl GetDirectionsTool {
    pub fn new(connector: Arc<dyn RoutesConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ServerTool for GetDirectionsTool {
    fn name(&self) -> &str {
        "google_routes.get_directions"
    }

    fn description(&self) -> &str {
        "Get directions between two locations including duration, distance, and turn-by-turn steps."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "origin": origin_schema(),
                "destination": {"type": "string", "description": "Destination address or 'lat,lng'."},
                "travel_mode": travel_mode_schema(),
            },
            "required": ["destination"],
        })
    }

    async fn execute(&self, args: &Args, ctx: &ToolContext) -> ValetResult<Args> {
        let origin = resolve_origin(args, ctx, self.name())?;
        let route = self
            .connector
            .compute_route(
                &origin,
                required_str(args, "destination", self.name())?,
                travel_mode(args),
                None,
            )
            .await?;
        route_to_args(route, self.name())
    }
}

// ── get_departure_time ────────────────────────────────────────────────────────

pub struct GetDepartureTimeTool {
    connector: Arc<dyn RoutesConnector>,
}

impl GetDepartureTimeTool {
    pub fn new(connector: Arc<dyn RoutesConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ServerTool for GetDepartureTimeTool {
    fn name(&self) -> &str {
        "google_routes.get_departure_time"
    }

    fn description(&self) -> &str {
        "Calculate when to leave to arrive at a destination by a specific time."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "origin": origin_schema(),
                "destination": {"type": "string", "description": "Destination address or 'lat,lng'."},
                "arrival_time": {
                    "type": "string",
                    "description": "Desired arrival time, ISO-8601 with a UTC offset.",
                },
                "travel_mode": travel_mode_schema(),
            },
            "required": ["destination", "arrival_time"],
        })
    }

    async fn execute(&self, args: &Args, ctx: &ToolContext) -> ValetResult<Args> {
        let origin = resolve_origin(args, ctx, self.name())?;
        let arrival = parse_arrival(required_str(args, "arrival_time", self.name())?, self.name())?;

        let route = self
            .connector
            .compute_route(
                &origin,
                required_str(args, "destination", self.name())?,
                travel_mode(args),
                None,
            )
            .await?;
        let route = route_to_args(route, self.name())?;

        let duration_seconds = route
            .get("duration_seconds")
            .and_then(Value::as_i64)
            .ok_or_else(|| ValetError::ToolExecution {
                tool: self.name().to_string(),
                reason: "connector route carries no duration_seconds".to_string(),
            })?;

        let departure =
            arrival - Duration::seconds(duration_seconds + DEPARTURE_BUFFER_SECONDS);

        let mut out = Args::new();
        out.insert("departure_time".to_string(), json!(departure.to_rfc3339()));
        out.insert("arrival_time".to_string(), json!(arrival.to_rfc3339()));
        out.insert(
            "travel_duration".to_string(),
            route.get("duration_text").cloned().unwrap_or(Value::Null),
        );
        out.insert("travel_duration_seconds".to_string(), json!(duration_seconds));
        out.insert(
            "distance".to_string(),
            route.get("distance_text").cloned().unwrap_or(Value::Null),
        );
        out.insert(
            "buffer_minutes".to_string(),
            json!(DEPARTURE_BUFFER_SECONDS / 60),
        );
        Ok(out)
    }
}

fn parse_arrival(raw: &str, tool: &str) -> ValetResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).map_err(|e| ValetError::ToolExecution {
        tool: tool.to_string(),
        reason: format!("invalid arrival_time '{}': {}", raw, e),
    })
}

// ── get_commute_time ──────────────────────────────────────────────────────────

pub struct GetCommuteTimeTool {
    connector: Arc<dyn RoutesConnector>,
}

impl GetCommuteTimeTool {
    pub fn new(connector: Arc<dyn RoutesConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ServerTool for GetCommuteTimeTool {
    fn name(&self) -> &str {
        "google_routes.get_commute_time"
    }

    fn description(&self) -> &str {
        "Get the current travel time between two locations, accounting for live traffic."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "origin": origin_schema(),
                "destination": {"type": "string", "description": "Destination address or 'lat,lng'."},
                "travel_mode": travel_mode_schema(),
            },
            "required": ["destination"],
        })
    }

    async fn execute(&self, args: &Args, ctx: &ToolContext) -> ValetResult<Args> {
        let origin = resolve_origin(args, ctx, self.name())?;
        let now = Utc::now().to_rfc3339();
        let route = self
            .connector
            .compute_route(
                &origin,
                required_str(args, "destination", self.name())?,
                travel_mode(args),
                Some(&now),
            )
            .await?;
        let route = route_to_args(route, self.name())?;

        let mut out = Args::new();
        out.insert(
            "duration".to_string(),
            route.get("duration_text").cloned().unwrap_or(Value::Null),
        );
        out.insert(
            "duration_seconds".to_string(),
            route.get("duration_seconds").cloned().unwrap_or(Value::Null),
        );
        out.insert(
            "distance".to_string(),
            route.get("distance_text").cloned().unwrap_or(Value::Null),
        );
        Ok(out)
    }
}

//! Connector seams for provider I/O.
//!
//! Tools own argument schemas and result shapes; connectors own transport.
//! The HTTP clients behind these traits live outside this crate, and the
//! demo and tests substitute in-memory fakes.

use async_trait::async_trait;
use serde_json::Value;

use valet_contracts::{error::ValetResult, plan::Args};

/// Provider-side calendar operations.
///
/// Events are opaque JSON objects in the provider's own shape; tools pick
/// out the fields they compare (`id`, `summary`, patched keys).
#[async_trait]
pub trait CalendarConnector: Send + Sync {
    async fn list_events(
        &self,
        time_min: &str,
        time_max: &str,
        query: Option<&str>,
        calendar_id: &str,
        max_results: u64,
    ) -> ValetResult<Vec<Value>>;

    /// Create an event from the tool's argument object; returns the created
    /// event.
    async fn create_event(&self, event: &Args, send_updates: &str) -> ValetResult<Value>;

    /// Patch fields on an existing event; returns the updated event.
    async fn update_event(
        &self,
        event_id: &str,
        patch_fields: &Args,
        calendar_id: &str,
        send_updates: &str,
    ) -> ValetResult<Value>;

    async fn delete_event(
        &self,
        event_id: &str,
        calendar_id: &str,
        send_updates: &str,
    ) -> ValetResult<()>;

    /// Read one event back, for verification.
    async fn get_event(&self, event_id: &str, calendar_id: &str) -> ValetResult<Value>;
}

/// Web search.
#[async_trait]
pub trait SearchConnector: Send + Sync {
    async fn search(
        &self,
        query: &str,
        count: u64,
        country: Option<&str>,
    ) -> ValetResult<Vec<Value>>;
}

/// Provider-side mailbox operations.
///
/// Messages are opaque JSON objects in the provider's own shape; the read
/// tool expects a `body` string field when one exists.
#[async_trait]
pub trait MailConnector: Send + Sync {
    /// Search messages with provider search syntax; returns summaries
    /// (subject, sender, date, snippet).
    async fn search_messages(&self, query: &str, max_results: u64) -> ValetResult<Vec<Value>>;

    /// Fetch one full message by id.
    async fn get_message(&self, message_id: &str) -> ValetResult<Value>;
}

/// Route computation.
#[async_trait]
pub trait RoutesConnector: Send + Sync {
    /// Compute a route; the result carries at least `duration_seconds`,
    /// `duration_text`, and `distance_text`. `departure_time` is ISO-8601
    /// and enables live-traffic estimates when set.
    async fn compute_route(
        &self,
        origin: &str,
        destination: &str,
        travel_mode: &str,
        departure_time: Option<&str>,
    ) -> ValetResult<Value>;
}

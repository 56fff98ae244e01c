//! # valet-skills
//!
//! The built-in skills: a provider calendar (server surface) with its
//! on-device counterpart, email, web search, and navigation (routes on the
//! server, turn-by-turn handoff on the device).
//!
//! Tools talk to the outside world only through the connector traits in
//! [`connectors`], so the same tool implementations serve production HTTP
//! clients, the demo's fakes, and the tests' mocks.
//! [`register_builtin_skills`] is the single, statically enumerable
//! registration point.

mod args;
pub mod calendar;
pub mod connectors;
pub mod device;
pub mod email;
pub mod manifest;
pub mod navigation;
pub mod search;

pub use connectors::{CalendarConnector, MailConnector, RoutesConnector, SearchConnector};
pub use manifest::{
    calendar_manifest, email_manifest, navigation_manifest, register_builtin_skills,
    search_manifest,
};

// ── Tests ─────────────────────────────────────────────────────────────────────

//! # valet-session
//!
//! Per-user conversation state for the VALET pipeline.
//!
//! ## Overview
//!
//! A session is an ordered list of provider-formatted
//! [`ChatTurn`](valet_contracts::session::ChatTurn)s, loaded at the start
//! of a command and saved at the end. [`SessionManager`] owns the lifecycle
//! and the trim-on-save algorithm that keeps histories bounded and
//! provider-safe; [`SessionStore`] is the persistence seam with in-memory
//! and SQLite implementations.

pub mod manager;
pub mod store;

pub use manager::{
    append_assistant_turn, append_tool_results, append_user_turn, SessionManager,
    DEFAULT_MAX_TURNS,
};
pub use store::{InMemorySessionStore, SessionStore, SqliteSessionStore};

// ── Tests ─────────────────────────────────────────────────────────────────────

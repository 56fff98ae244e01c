//! # valet-audit
//!
//! Append-only, SHA-256 hash-chained audit trail for VALET plan execution.
//!
//! ## Overview
//!
//! Every executed step produces an
//! [`AuditRecord`](valet_contracts::audit::AuditRecord); this crate chains
//! those records per plan so that any after-the-fact modification is
//! detectable. [`InMemoryAuditSink`] implements the
//! [`AuditSink`](valet_core::traits::AuditSink) trait the command service
//! writes through.
//!
//! ## Chain structure
//!
//! Each plan gets its own chain. Event 0 links to [`AuditEvent::GENESIS_HASH`]
//! (64 hex zeros); every later event links to its predecessor's `this_hash`.
//! `verify_chain` recomputes every hash and checks every link.

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{hash_event, verify_chain};
pub use event::{AuditChain, AuditEvent};
pub use memory::InMemoryAuditSink;

// ── Tests ─────────────────────────────────────────────────────────────────────

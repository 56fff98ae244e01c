//! # valet-verify
//!
//! Post-execution verification for VALET plans.
//!
//! This crate provides [`ReadBackVerifier`], which confirms claimed side
//! effects after a plan runs:
//!
//! 1. **Server steps** — delegated to the owning
//!    [`ServerTool::verify`](valet_core::traits::ServerTool::verify) hook,
//!    which reads the resource back from the provider and compares it
//!    against the requested arguments.
//! 2. **Device results** — checked locally, since device state is not
//!    reachable from the server: reported failures are mismatches, reported
//!    successes are trusted.
//!
//! Verification is strictly advisory. A mismatch is surfaced and audited
//! but never triggers a retry or rollback.

pub mod engine;

pub use engine::ReadBackVerifier;

// ── Tests ─────────────────────────────────────────────────────────────────────

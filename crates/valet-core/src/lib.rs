//! # valet-core
//!
//! The execution backbone of the VALET orchestration engine.
//!
//! This crate provides:
//! - The capability contract (`ServerTool`, `DeviceToolSpec`, the `Tool`
//!   union) and the `AuditSink` trait
//! - The `ToolRegistry` catalog
//! - The `Executor` that walks plans with idempotency, surface dispatch,
//!   and stop-on-failure semantics
//! - The `PendingPlans` store for plans awaiting confirmation

pub mod executor;
pub mod pending;
pub mod registry;
pub mod traits;

pub use executor::Executor;
pub use pending::{PendingPlan, PendingPlans};
pub use registry::ToolRegistry;

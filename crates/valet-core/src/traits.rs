//! Core trait definitions for the VALET execution pipeline.
//!
//! Two trust seams live here:
//!
//! - `ServerTool` — the capability contract for tools this process executes
//! - `AuditSink`  — the append-only record of every executed step
//!
//! Device-surface tools deliberately have no `execute` to call: they are a
//! separate descriptor type, and the `Tool` union makes server-side
//! execution of a device tool unrepresentable rather than a runtime error.

use std::sync::Arc;

use async_trait::async_trait;

use valet_contracts::{
    audit::AuditRecord,
    error::ValetResult,
    execution::VerificationResult,
    plan::Args,
    tool::{ExecutionSurface, ToolContext, ToolSpec},
};

/// A tool the server executes directly.
///
/// `execute` performs the side effect; `verify` optionally re-reads the
/// affected resource and compares it against what was requested. A tool
/// without read-back semantics keeps the default unconditional match.
#[async_trait]
pub trait ServerTool: Send + Sync {
    /// Qualified name: `namespace.action`, lowercase, no hyphens.
    fn name(&self) -> &str;

    /// One-line description shown to the LLM.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Perform the side effect and return the result object.
    async fn execute(&self, args: &Args, ctx: &ToolContext) -> ValetResult<Args>;

    /// Re-read the affected resource and compare expected vs. actual.
    ///
    /// Advisory only — the executor never acts on the report beyond
    /// recording it.
    async fn verify(
        &self,
        _args: &Args,
        _result: &Args,
        _ctx: &ToolContext,
    ) -> ValetResult<VerificationResult> {
        Ok(VerificationResult::matched())
    }
}

/// Descriptor for a tool that runs on the user's device.
///
/// Exists so the LLM can reference the tool in plans; the executor
/// serializes matching steps as `DeviceAction` records instead of calling
/// anything.
#[derive(Debug, Clone)]
pub struct DeviceToolSpec {
    pub name: String,
    pub description: String,
    pub parameters_schema: serde_json::Value,
}

/// A registered tool: either executable here or delegated to the device.
#[derive(Clone)]
pub enum Tool {
    Server(Arc<dyn ServerTool>),
    Device(Arc<DeviceToolSpec>),
}

impl Tool {
    pub fn name(&self) -> &str {
        match self {
            Tool::Server(t) => t.name(),
            Tool::Device(d) => &d.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Tool::Server(t) => t.description(),
            Tool::Device(d) => &d.description,
        }
    }

    pub fn parameters_schema(&self) -> serde_json::Value {
        match self {
            Tool::Server(t) => t.parameters_schema(),
            Tool::Device(d) => d.parameters_schema.clone(),
        }
    }

    pub fn execution_surface(&self) -> ExecutionSurface {
        match self {
            Tool::Server(_) => ExecutionSurface::Server,
            Tool::Device(_) => ExecutionSurface::Device,
        }
    }

    /// Machine-readable spec for the planner and LLM adapters.
    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            execution_surface: self.execution_surface(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The append-only audit sink.
///
/// Every attempted step — success, skip, delegation, or failure — produces
/// exactly one record. A failed write is fatal to the pipeline.
pub trait AuditSink: Send + Sync {
    /// Append one record.
    fn record(&self, record: &AuditRecord) -> ValetResult<()>;

    /// Mark a plan's record sequence as complete.
    ///
    /// Implementations may flush, sign, or seal here; in-memory sinks just
    /// log the terminal state.
    fn seal(&self, plan_id: &str) -> ValetResult<()>;
}

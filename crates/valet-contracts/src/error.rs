//! Runtime error types for the VALET command pipeline.
//!
//! All fallible operations in the pipeline return `ValetResult<T>`.
//! Error variants carry enough context to attribute a failure to the
//! specific step or plan that produced it.

use thiserror::Error;

/// The unified error type for the VALET runtime.
#[derive(Debug, Error)]
pub enum ValetError {
    /// The LLM's output failed structural validation, even after the single
    /// allowed retry.
    #[error("planning failed: {reason}")]
    Planning { reason: String },

    /// A policy rule hard-blocked the plan.
    ///
    /// Reserved: the built-in policy only escalates, it never blocks.
    #[error("blocked by policy: {reason}")]
    PolicyBlocked { reason: String },

    /// A tool raised during `execute`. Caught per step and halts the
    /// remaining steps of the pass.
    #[error("tool '{tool}' failed: {reason}")]
    ToolExecution { tool: String, reason: String },

    /// The plan references a tool name that is not registered.
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// The audit sink could not persist a record.
    ///
    /// Treated as fatal — a step that cannot be audited cannot proceed.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// The session store could not load or persist a conversation.
    #[error("session store error: {reason}")]
    SessionStore { reason: String },

    /// An LLM request failed at the transport or wire-format level.
    #[error("llm request failed: {reason}")]
    Llm { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// No pending plan exists for the given id (never created, already
    /// consumed, or expired).
    #[error("no pending plan with id '{plan_id}'")]
    PlanNotFound { plan_id: String },

    /// The caller is not the user that created the pending plan.
    #[error("pending plan '{plan_id}' belongs to another user")]
    PlanOwnership { plan_id: String },
}

/// Convenience alias used throughout the VALET crates.
pub type ValetResult<T> = Result<T, ValetError>;

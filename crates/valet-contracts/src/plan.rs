//! Action plans and their steps.
//!
//! An `ActionPlan` is the typed, ordered set of steps derived from one user
//! utterance. Steps are immutable after policy evaluation — policy may only
//! raise risk and confirmation flags, never lower them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::ExecutionSurface;

/// Opaque tool arguments: a JSON object keyed by argument name.
///
/// The orchestrator never parses or understands argument values — argument
/// validity is the tool's responsibility.
pub type Args = serde_json::Map<String, serde_json::Value>;

/// Three-value ordered risk classification gating confirmation.
///
/// The derived `Ord` gives the total order `Low < Medium < High` used for
/// monotonic escalation: policy upgrades are `max()` operations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One planned tool invocation with risk, confirmation, and surface metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionStep {
    /// Qualified tool name, e.g. `"google_calendar.create_event"`.
    pub tool_name: String,

    /// Arguments as produced by the LLM. Opaque to the orchestrator.
    #[serde(default)]
    pub args: Args,

    /// Provisional at planning time; only ever raised by policy.
    pub risk_level: RiskLevel,

    /// When true, the step is deferred to the pending store until the user
    /// confirms the plan.
    pub requires_confirmation: bool,

    /// Spoken prompt presented to the user when confirmation is required.
    pub confirmation_phrase: Option<String>,

    /// Unique per step. Generated exactly once at construction and never
    /// regenerated — retries of the same step reuse it, which is what makes
    /// at-most-once effective execution possible.
    pub idempotency_key: String,

    /// Fixed at plan-creation time; determines which component may execute
    /// the step.
    pub execution_surface: ExecutionSurface,

    /// The provider-assigned id of the tool call this step was derived
    /// from, preserved verbatim for matching results back.
    pub source_call_id: Option<String>,
}

impl ActionStep {
    /// Create a low-risk, unconfirmed step with a fresh idempotency key.
    pub fn new(
        tool_name: impl Into<String>,
        args: Args,
        execution_surface: ExecutionSurface,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            args,
            risk_level: RiskLevel::Low,
            requires_confirmation: false,
            confirmation_phrase: None,
            idempotency_key: uuid::Uuid::new_v4().simple().to_string(),
            execution_surface,
            source_call_id: None,
        }
    }
}

/// The typed, ordered set of steps derived from one user utterance.
///
/// A plan is owned by exactly one user for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    /// Unique plan identifier (uuid, hex).
    pub plan_id: String,

    /// Summary of what the user asked for, in the user's words.
    pub user_intent: String,

    /// IANA timezone name the utterance was made in.
    pub timezone: String,

    /// BCP 47 locale tag, e.g. `"en-US"`.
    pub locale: String,

    /// Ordered steps. Executed strictly in sequence.
    pub steps: Vec<ActionStep>,

    /// Wall-clock creation time (UTC).
    pub created_at: DateTime<Utc>,
}

impl ActionPlan {
    /// Create an empty plan with a fresh id.
    pub fn new(
        user_intent: impl Into<String>,
        timezone: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            plan_id: uuid::Uuid::new_v4().simple().to_string(),
            user_intent: user_intent.into(),
            timezone: timezone.into(),
            locale: locale.into(),
            steps: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// True when any step still requires user confirmation.
    pub fn needs_confirmation(&self) -> bool {
        self.steps.iter().any(|s| s.requires_confirmation)
    }

    /// The highest risk level across all steps. `Low` for an empty plan.
    pub fn max_risk(&self) -> RiskLevel {
        self.steps
            .iter()
            .map(|s| s.risk_level)
            .max()
            .unwrap_or(RiskLevel::Low)
    }
}

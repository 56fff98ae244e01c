//! Escalation-only policy evaluation over action plans.
//!
//! `PolicyEngine` loads a `PolicyConfig` from TOML and rewrites each step of
//! an [`ActionPlan`] in place:
//!
//! 1. Iterate rules in declaration order; every rule that matches a step's
//!    tool is applied (rules compose, there is no first-match-wins).
//! 2. A `destructive` rule raises the step to `RiskLevel::High` and forces
//!    confirmation.
//! 3. A `third-party-notify` rule raises the step to at least
//!    `RiskLevel::Medium` and forces confirmation when the attendee list is
//!    non-empty or the notify argument carries a broadcasting value.
//! 4. Missing required arguments are logged, never blocked.
//!
//! Evaluation is idempotent: running it twice over the same plan yields the
//! same flags, because every operation is a max() or a set-if-unset.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use valet_contracts::{
    error::{ValetError, ValetResult},
    plan::{ActionPlan, ActionStep, RiskLevel},
};

use crate::rule::{PolicyConfig, PolicyRule, RuleKind};

/// The outcome of evaluating a plan.
///
/// The current rule vocabulary only escalates; `blocked` is carried so a
/// future rule kind can veto a plan outright without changing the call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyOutcome {
    pub blocked: bool,
    pub block_reason: Option<String>,
}

/// A TOML-driven, escalation-only policy evaluator.
///
/// Construct via `from_toml_str`, `from_file`, or `builtin`, then call
/// [`evaluate`](PolicyEngine::evaluate) on every plan before execution.
#[derive(Debug)]
pub struct PolicyEngine {
    config: PolicyConfig,
}

impl PolicyEngine {
    /// Parse `s` as TOML and build a `PolicyEngine`.
    ///
    /// Returns `ValetError::Config` if the TOML is malformed or does not
    /// match the expected `PolicyConfig` schema.
    pub fn from_toml_str(s: &str) -> ValetResult<Self> {
        let config: PolicyConfig = toml::from_str(s).map_err(|e| ValetError::Config {
            reason: format!("failed to parse policy TOML: {}", e),
        })?;
        Ok(Self { config })
    }

    /// Read the file at `path` and parse it as TOML policy configuration.
    pub fn from_file(path: &Path) -> ValetResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ValetError::Config {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Build an engine from the policy compiled into the crate.
    pub fn builtin() -> Self {
        let config: PolicyConfig = toml::from_str(include_str!("../policies/default.toml"))
            .unwrap_or_else(|_| PolicyConfig {
                rules: Vec::new(),
                required_args: Default::default(),
            });
        Self { config }
    }

    /// Apply every matching rule to every step of `plan`, in place.
    ///
    /// Risk levels and confirmation flags are only ever raised; a step the
    /// planner already marked high-risk keeps that marking. Confirmation
    /// phrases are set only when the step has none.
    pub fn evaluate(&self, plan: &mut ActionPlan) -> PolicyOutcome {
        for step in &mut plan.steps {
            for rule in &self.config.rules {
                if !rule.matches(&step.tool_name) {
                    continue;
                }
                debug!(
                    rule_id = %rule.id,
                    tool = %step.tool_name,
                    plan_id = %plan.plan_id,
                    "policy rule matched"
                );
                match rule.kind {
                    RuleKind::Destructive => apply_destructive(step, rule),
                    RuleKind::ThirdPartyNotify => apply_third_party_notify(step, rule),
                }
            }

            if let Some(required) = self.config.required_args.get(&step.tool_name) {
                for arg in required {
                    if !step.args.contains_key(arg) {
                        warn!(
                            tool = %step.tool_name,
                            arg = %arg,
                            plan_id = %plan.plan_id,
                            "step is missing a required argument"
                        );
                    }
                }
            }
        }

        PolicyOutcome {
            blocked: false,
            block_reason: None,
        }
    }
}

fn apply_destructive(step: &mut ActionStep, rule: &PolicyRule) {
    step.risk_level = step.risk_level.max(RiskLevel::High);
    step.requires_confirmation = true;
    if step.confirmation_phrase.is_none() {
        step.confirmation_phrase = rule.confirmation_phrase.clone();
    }
}

fn apply_third_party_notify(step: &mut ActionStep, rule: &PolicyRule) {
    if let Some(attendee_arg) = &rule.attendee_arg {
        if let Some(names) = attendee_names(step.args.get(attendee_arg)) {
            if !names.is_empty() {
                step.risk_level = step.risk_level.max(RiskLevel::Medium);
                step.requires_confirmation = true;
                if step.confirmation_phrase.is_none() {
                    step.confirmation_phrase = Some(invite_phrase(&names));
                }
            }
        }
    }

    if let (Some(notify_arg), false) = (&rule.notify_arg, rule.notify_values.is_empty()) {
        if let Some(Value::String(mode)) = step.args.get(notify_arg) {
            if rule.notify_values.iter().any(|v| v == mode) {
                step.risk_level = step.risk_level.max(RiskLevel::Medium);
                step.requires_confirmation = true;
                if step.confirmation_phrase.is_none() {
                    step.confirmation_phrase = rule.notify_phrase.clone();
                }
            }
        }
    }
}

/// Extract display names from an attendee argument.
///
/// Accepts an array of strings (email addresses) or objects carrying an
/// `email` field; anything else yields `None` and the rule does not fire.
fn attendee_names(value: Option<&Value>) -> Option<Vec<String>> {
    let items = match value {
        Some(Value::Array(items)) => items,
        _ => return None,
    };
    let mut names = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => names.push(s.clone()),
            Value::Object(obj) => match obj.get("email") {
                Some(Value::String(s)) => names.push(s.clone()),
                _ => return None,
            },
            _ => return None,
        }
    }
    Some(names)
}

/// "This will invite a, b, c and 2 more. Confirm?" — first three names, then
/// a count of the rest.
fn invite_phrase(names: &[String]) -> String {
    let shown = names.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    if names.len() > 3 {
        format!(
            "This will invite {} and {} more. Confirm?",
            shown,
            names.len() - 3
        )
    } else {
        format!("This will invite {}. Confirm?", shown)
    }
}

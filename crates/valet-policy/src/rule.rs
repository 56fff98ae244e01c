//! Policy rule types and configuration schema.
//!
//! A `PolicyConfig` is deserialized from TOML and holds an ordered list of
//! escalation rules plus a per-tool required-argument table. Rules are
//! applied in declaration order to every step; each rule can only raise a
//! step's risk and confirmation flags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The escalation behavior a rule applies when it matches a step.
///
/// Expressed as a plain string in TOML (kebab-case) for readability:
///
/// ```toml
/// kind = "destructive"
/// kind = "third-party-notify"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    /// The tool is irreversible: force risk = high and confirmation.
    Destructive,

    /// The tool can notify third parties: force risk ≥ medium and
    /// confirmation when the notification arguments are present.
    ThirdPartyNotify,
}

/// A single escalation rule loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Stable identifier used in logs.
    pub id: String,

    /// Human-readable explanation of what this rule guards.
    pub description: String,

    pub kind: RuleKind,

    /// Qualified tool names this rule matches. Exact match only.
    pub tools: Vec<String>,

    /// Default confirmation phrase for `destructive` rules, used only when
    /// the step has none set.
    pub confirmation_phrase: Option<String>,

    /// For `third-party-notify`: the argument holding the attendee list.
    pub attendee_arg: Option<String>,

    /// For `third-party-notify`: the argument holding the send-updates mode.
    pub notify_arg: Option<String>,

    /// For `third-party-notify`: the `notify_arg` values that mean
    /// notifications actually go out.
    #[serde(default)]
    pub notify_values: Vec<String>,

    /// Phrase used when the notify condition fires and the step has none.
    pub notify_phrase: Option<String>,
}

impl PolicyRule {
    /// True when this rule applies to the given tool name.
    pub fn matches(&self, tool_name: &str) -> bool {
        self.tools.iter().any(|t| t == tool_name)
    }
}

/// The top-level structure deserialized from a TOML policy file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Ordered escalation rules.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,

    /// Tool name → argument names that must be present. Missing arguments
    /// are logged, never blocked.
    #[serde(default)]
    pub required_args: BTreeMap<String, Vec<String>>,
}

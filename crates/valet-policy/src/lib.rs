//! # valet-policy
//!
//! A TOML-driven, escalation-only risk policy for VALET action plans.
//!
//! ## Overview
//!
//! This crate provides [`PolicyEngine`], which rewrites each step of an
//! [`ActionPlan`](valet_contracts::plan::ActionPlan) in place: rules loaded
//! from TOML can raise a step's risk level and confirmation requirement, but
//! never lower them. Evaluation is deliberately idempotent so the engine can
//! run again over a plan restored from the pending store without changing it.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use valet_policy::PolicyEngine;
//!
//! let engine = PolicyEngine::builtin();
//! let outcome = engine.evaluate(&mut plan);
//! if plan.needs_confirmation() {
//!     // stash the plan and ask the user
//! }
//! ```
//!
//! ## Rule kinds
//!
//! * `destructive` — the tool is irreversible; matching steps become
//!   high-risk and require confirmation.
//! * `third-party-notify` — the tool can notify other people; matching steps
//!   become at least medium-risk and require confirmation when attendees are
//!   present or the notify argument carries a broadcasting value.

pub mod engine;
pub mod rule;

pub use engine::{PolicyEngine, PolicyOutcome};
pub use rule::{PolicyConfig, PolicyRule, RuleKind};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use valet_contracts::plan::{ActionPlan, ActionStep, RiskLevel};
    use valet_contracts::tool::ExecutionSurface;

    use crate::PolicyEngine;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn step(tool: &str, args: serde_json::Value) -> ActionStep {
        let args = match args {
            serde_json::Value::Object(map) => map,
            _ => panic!("args must be a JSON object"),
        };
        ActionStep::new(tool.to_string(), args, ExecutionSurface::Server)
    }

    fn plan_with(steps: Vec<ActionStep>) -> ActionPlan {
        let mut plan = ActionPlan::new(
            "test intent".to_string(),
            "UTC".to_string(),
            "en-US".to_string(),
        );
        plan.steps = steps;
        plan
    }

    // ── 1. destructive escalation ─────────────────────────────────────────────

    /// A delete step is raised to high risk with confirmation and the rule's
    /// default phrase.
    #[test]
    fn test_destructive_tool_escalates_to_high() {
        let engine = PolicyEngine::builtin();
        let mut plan = plan_with(vec![step(
            "google_calendar.delete_event",
            json!({"event_id": "ev-1"}),
        )]);

        let outcome = engine.evaluate(&mut plan);

        assert!(!outcome.blocked);
        let s = &plan.steps[0];
        assert_eq!(s.risk_level, RiskLevel::High);
        assert!(s.requires_confirmation);
        assert!(s.confirmation_phrase.as_deref().unwrap().contains("delete"));
        assert!(plan.needs_confirmation());
        assert_eq!(plan.max_risk(), RiskLevel::High);
    }

    // ── 2. attendee escalation ────────────────────────────────────────────────

    /// A create with attendees becomes medium risk and names the invitees.
    #[test]
    fn test_attendees_escalate_to_medium_with_invite_phrase() {
        let engine = PolicyEngine::builtin();
        let mut plan = plan_with(vec![step(
            "google_calendar.create_event",
            json!({
                "title": "Standup",
                "start": "2026-08-28T09:00:00Z",
                "end": "2026-08-28T09:15:00Z",
                "attendees": ["a@x.com", "b@x.com", "c@x.com", "d@x.com", "e@x.com"]
            }),
        )]);

        engine.evaluate(&mut plan);

        let s = &plan.steps[0];
        assert_eq!(s.risk_level, RiskLevel::Medium);
        assert!(s.requires_confirmation);
        assert_eq!(
            s.confirmation_phrase.as_deref(),
            Some("This will invite a@x.com, b@x.com, c@x.com and 2 more. Confirm?")
        );
    }

    /// An empty attendee list does not escalate.
    #[test]
    fn test_empty_attendees_do_not_escalate() {
        let engine = PolicyEngine::builtin();
        let mut plan = plan_with(vec![step(
            "google_calendar.create_event",
            json!({"title": "Solo block", "start": "s", "end": "e", "attendees": []}),
        )]);

        engine.evaluate(&mut plan);

        let s = &plan.steps[0];
        assert_eq!(s.risk_level, RiskLevel::Low);
        assert!(!s.requires_confirmation);
        assert!(s.confirmation_phrase.is_none());
    }

    // ── 3. send_updates escalation ────────────────────────────────────────────

    /// `send_updates = "all"` escalates even without an attendee list, using
    /// the rule's notify phrase.
    #[test]
    fn test_send_updates_all_escalates() {
        let engine = PolicyEngine::builtin();
        let mut plan = plan_with(vec![step(
            "google_calendar.update_event",
            json!({"event_id": "ev-1", "patch_fields": {"title": "Moved"}, "send_updates": "all"}),
        )]);

        engine.evaluate(&mut plan);

        let s = &plan.steps[0];
        assert_eq!(s.risk_level, RiskLevel::Medium);
        assert!(s.requires_confirmation);
        assert_eq!(
            s.confirmation_phrase.as_deref(),
            Some("This will send notifications to attendees. Confirm?")
        );
    }

    /// `send_updates = "none"` is not a broadcasting value.
    #[test]
    fn test_send_updates_none_does_not_escalate() {
        let engine = PolicyEngine::builtin();
        let mut plan = plan_with(vec![step(
            "google_calendar.update_event",
            json!({"event_id": "ev-1", "patch_fields": {}, "send_updates": "none"}),
        )]);

        engine.evaluate(&mut plan);

        assert!(!plan.steps[0].requires_confirmation);
    }

    // ── 4. monotonicity ───────────────────────────────────────────────────────

    /// A step the planner already marked high-risk is never lowered, and a
    /// pre-set confirmation phrase is never overwritten.
    #[test]
    fn test_planner_marking_is_never_lowered() {
        let engine = PolicyEngine::builtin();
        let mut s = step(
            "google_calendar.create_event",
            json!({"title": "x", "start": "s", "end": "e", "attendees": ["a@x.com"]}),
        );
        s.risk_level = RiskLevel::High;
        s.requires_confirmation = true;
        s.confirmation_phrase = Some("Planner phrase.".to_string());
        let mut plan = plan_with(vec![s]);

        engine.evaluate(&mut plan);

        let s = &plan.steps[0];
        assert_eq!(s.risk_level, RiskLevel::High);
        assert!(s.requires_confirmation);
        assert_eq!(s.confirmation_phrase.as_deref(), Some("Planner phrase."));
    }

    // ── 5. idempotence ────────────────────────────────────────────────────────

    /// Evaluating a plan twice yields the same flags as evaluating it once.
    #[test]
    fn test_evaluation_is_idempotent() {
        let engine = PolicyEngine::builtin();
        let mut plan = plan_with(vec![
            step("google_calendar.delete_event", json!({"event_id": "ev-1"})),
            step(
                "google_calendar.create_event",
                json!({"title": "x", "start": "s", "end": "e", "attendees": ["a@x.com"]}),
            ),
        ]);

        engine.evaluate(&mut plan);
        let once = plan.clone();
        engine.evaluate(&mut plan);

        for (a, b) in once.steps.iter().zip(plan.steps.iter()) {
            assert_eq!(a.risk_level, b.risk_level);
            assert_eq!(a.requires_confirmation, b.requires_confirmation);
            assert_eq!(a.confirmation_phrase, b.confirmation_phrase);
        }
    }

    // ── 6. unmatched tools ────────────────────────────────────────────────────

    /// Tools no rule names pass through untouched.
    #[test]
    fn test_unmatched_tool_passes_through() {
        let engine = PolicyEngine::builtin();
        let mut plan = plan_with(vec![step("web_search.query", json!({"query": "weather"}))]);

        let outcome = engine.evaluate(&mut plan);

        assert!(!outcome.blocked);
        assert_eq!(plan.steps[0].risk_level, RiskLevel::Low);
        assert!(!plan.steps[0].requires_confirmation);
    }

    // ── 7. custom TOML ────────────────────────────────────────────────────────

    /// Rules parse from an arbitrary TOML string, and malformed TOML is a
    /// config error.
    #[test]
    fn test_from_toml_str() {
        let toml = r#"
            [[rules]]
            id = "nuke"
            description = "test"
            kind = "destructive"
            tools = ["mail.delete_thread"]
            confirmation_phrase = "Really delete the thread?"
        "#;
        let engine = PolicyEngine::from_toml_str(toml).unwrap();
        let mut plan = plan_with(vec![step("mail.delete_thread", json!({"thread_id": "t"}))]);
        engine.evaluate(&mut plan);
        assert_eq!(plan.steps[0].risk_level, RiskLevel::High);

        assert!(PolicyEngine::from_toml_str("rules = 3").is_err());
    }
}

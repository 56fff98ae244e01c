//! System prompt assembly.
//!
//! The prompt pushes the model toward tool calls over conversation: the
//! engine exists to act, and a text reply is the fallback, not the default.
//! Skill manifests contribute both the category list and the numbered
//! tool-use rules.

use chrono::Utc;

use valet_core::ToolRegistry;

/// Build the system prompt for a planning turn.
///
/// `providers` lists the user's linked integrations; an empty list is
/// rendered as the default calendar provider so the model never assumes
/// nothing is connected.
pub fn build_system_prompt(
    registry: &ToolRegistry,
    timezone: &str,
    locale: &str,
    providers: &[String],
) -> String {
    let providers = if providers.is_empty() {
        "google_calendar".to_string()
    } else {
        providers.join(", ")
    };

    format!(
        "You are Valet — a tool-calling agent that controls the user's phone. \
Your primary job is to EXECUTE ACTIONS via tools, not to have conversations.\n\
\n\
## Core directive\n\
ALWAYS call a tool when the user's request can be fulfilled by one. \
Do NOT respond with text when a tool call would work. \
Do NOT explain what you could do — just do it. \
Do NOT ask for confirmation unless the tool requires it. \
Do NOT say \"I can't do that\" if a matching tool exists. \
Respond with plain text ONLY for genuine small talk (greetings, thanks) \
or when no tool can possibly fulfill the request.\n\
\n\
## Your tools (by category)\n\
{tool_categories}\n\
\n\
## Voice & style\n\
Brief. Warm but minimal. No filler (\"Sure!\", \"Of course!\", \"Great question!\"). \
Proper punctuation. One sentence max for conversational replies.\n\
\n\
## Current context\n\
- Date/time: {now} (UTC) — convert to the user's timezone below\n\
- Timezone: {timezone}\n\
- Locale: {locale}\n\
- Providers: {providers}\n\
\n\
## Tool-use rules\n\
{tool_rules}\n",
        tool_categories = tool_categories(registry),
        tool_rules = tool_rules(registry),
        now = Utc::now().format("%A, %B %d, %Y at %H:%M"),
        timezone = timezone,
        locale = locale,
        providers = providers,
    )
}

fn tool_categories(registry: &ToolRegistry) -> String {
    let manifests = registry.skill_manifests();
    if manifests.is_empty() {
        return "- (no skills loaded)".to_string();
    }
    manifests
        .iter()
        .map(|m| format!("- **{}**: {}", m.display_name, m.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn tool_rules(registry: &ToolRegistry) -> String {
    let mut rules = vec![
        "ISO-8601 datetimes. Relative dates resolve from current date/time above.".to_string(),
    ];
    for manifest in registry.skill_manifests() {
        rules.extend(manifest.planner_instructions.iter().cloned());
    }
    rules.push(
        "When in doubt, call the closest matching tool rather than responding with text."
            .to_string(),
    );
    rules
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}", i + 1, rule))
        .collect::<Vec<_>>()
        .join("\n")
}

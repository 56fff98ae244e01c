//! Tool name translation between the internal and provider vocabularies.
//!
//! Internal tool names are `namespace.action`; provider tool-name fields
//! reject `.`, so adapters send `namespace-action` on the wire and restore
//! the dot on the way back. The registry guarantees namespaces contain no
//! hyphens, so splitting on the first `-` round-trips exactly.

/// `google_calendar.create_event` → `google_calendar-create_event`.
pub fn to_api_name(name: &str) -> String {
    name.replace('.', "-")
}

/// Restore the internal name by turning the first `-` back into `.`.
pub fn from_api_name(api_name: &str) -> String {
    match api_name.split_once('-') {
        Some((namespace, action)) => format!("{}.{}", namespace, action),
        None => api_name.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

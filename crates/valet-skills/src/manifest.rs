//! Static skill registration.
//!
//! Skills are enumerated here at build time; there is no manifest scanning
//! or dynamic loading. Each skill contributes its tools, its device tool
//! descriptors, and a manifest feeding the planner's system prompt.

use std::sync::Arc;

use valet_contracts::{error::ValetResult, tool::SkillManifest};
use valet_core::ToolRegistry;

use crate::{
    calendar::{CreateEventTool, DeleteEventTool, ListEventsTool, UpdateEventTool},
    connectors::{CalendarConnector, MailConnector, RoutesConnector, SearchConnector},
    device::{device_calendar_tools, device_navigation_tools},
    email::{ReadEmailTool, SearchEmailsTool},
    navigation::{GetCommuteTimeTool, GetDepartureTimeTool, GetDirectionsTool},
    search::WebSearchTool,
};

pub fn calendar_manifest() -> SkillManifest {
    SkillManifest {
        name: "calendar".to_string(),
        display_name: "Calendar".to_string(),
        description: "Create, change, list, and delete events on the user's provider or device calendar.".to_string(),
        tool_names: vec![
            "google_calendar.list_events".to_string(),
            "google_calendar.create_event".to_string(),
            "google_calendar.update_event".to_string(),
            "google_calendar.delete_event".to_string(),
            "device_calendar.list_events".to_string(),
            "device_calendar.create_event".to_string(),
            "device_calendar.update_event".to_string(),
            "device_calendar.delete_event".to_string(),
        ],
        planner_instructions: vec![
            "Prefer google_calendar tools when the google_calendar provider is linked; otherwise use device_calendar tools.".to_string(),
            "List events to find an event_id before updating or deleting.".to_string(),
        ],
    }
}

pub fn search_manifest() -> SkillManifest {
    SkillManifest {
        name: "web_search".to_string(),
        display_name: "Web Search".to_string(),
        description: "Look up current information, news, weather, and local businesses."
            .to_string(),
        tool_names: vec!["web_search.query".to_string()],
        planner_instructions: vec![
            "Use web_search.query for anything requiring current real-world information."
                .to_string(),
        ],
    }
}

pub fn email_manifest() -> SkillManifest {
    SkillManifest {
        name: "email".to_string(),
        display_name: "Email".to_string(),
        description: "Search the user's inbox and read individual messages.".to_string(),
        tool_names: vec![
            "google_gmail.search_emails".to_string(),
            "google_gmail.read_email".to_string(),
        ],
        planner_instructions: vec![
            "Search emails before reading; read_email needs a message_id from search results."
                .to_string(),
        ],
    }
}

pub fn navigation_manifest() -> SkillManifest {
    SkillManifest {
        name: "navigation".to_string(),
        display_name: "Navigation".to_string(),
        description: "Directions, travel times, and when-to-leave estimates.".to_string(),
        tool_names: vec![
            "google_routes.get_directions".to_string(),
            "google_routes.get_departure_time".to_string(),
            "google_routes.get_commute_time".to_string(),
            "device_navigation.open_in_maps".to_string(),
        ],
        planner_instructions: vec![
            "Omit origin to use the device's current location.".to_string(),
            "To start turn-by-turn navigation on the phone, use device_navigation.open_in_maps."
                .to_string(),
        ],
    }
}

/// Install every built-in skill into `registry`.
pub fn register_builtin_skills(
    registry: &mut ToolRegistry,
    calendar: Arc<dyn CalendarConnector>,
    search: Arc<dyn SearchConnector>,
    mail: Arc<dyn MailConnector>,
    routes: Arc<dyn RoutesConnector>,
) -> ValetResult<()> {
    registry.register_server(Arc::new(ListEventsTool::new(calendar.clone())))?;
    registry.register_server(Arc::new(CreateEventTool::new(calendar.clone())))?;
    registry.register_server(Arc::new(UpdateEventTool::new(calendar.clone())))?;
    registry.register_server(Arc::new(DeleteEventTool::new(calendar)))?;
    for spec in device_calendar_tools() {
        registry.register_device(spec)?;
    }
    registry.register_server(Arc::new(WebSearchTool::new(search)))?;
    registry.register_server(Arc::new(SearchEmailsTool::new(mail.clone())))?;
    registry.register_server(Arc::new(ReadEmailTool::new(mail)))?;
    registry.register_server(Arc::new(GetDirectionsTool::new(routes.clone())))?;
    registry.register_server(Arc::new(GetDepartureTimeTool::new(routes.clone())))?;
    registry.register_server(Arc::new(GetCommuteTimeTool::new(routes)))?;
    for spec in device_navigation_tools() {
        registry.register_device(spec)?;
    }

    registry.register_skill(calendar_manifest());
    registry.register_skill(search_manifest());
    registry.register_skill(email_manifest());
    registry.register_skill(navigation_manifest());
    Ok(())
}

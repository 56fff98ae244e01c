//! On-device tool descriptors: `device_calendar.*` and `device_navigation.*`.
//!
//! These exist so the LLM can plan against the device's local capabilities.
//! There is nothing to execute server-side; the executor serializes
//! matching steps as `DeviceAction` payloads for the companion app.

use serde_json::json;

use valet_core::traits::DeviceToolSpec;

pub fn device_calendar_tools() -> Vec<DeviceToolSpec> {
    vec![
        DeviceToolSpec {
            name: "device_calendar.list_events".to_string(),
            description: "List events from the calendar on the user's device in a date range."
                .to_string(),
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "start": {"type": "string", "format": "date-time"},
                    "end": {"type": "string", "format": "date-time"},
                    "calendar_ids": {"type": "array", "items": {"type": "string"}},
                },
                "required": ["start", "end"],
            }),
        },
        DeviceToolSpec {
            name: "device_calendar.create_event".to_string(),
            description: "Create a new event in the calendar on the user's device.".to_string(),
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "start": {"type": "string", "format": "date-time"},
                    "end": {"type": "string", "format": "date-time"},
                    "calendar_id": {"type": "string"},
                    "notes": {"type": "string"},
                    "location": {"type": "string"},
                    "alarms": {
                        "type": "array",
                        "items": {"type": "integer"},
                        "description": "Alarm offsets in minutes before the event",
                    },
                },
                "required": ["title", "start", "end"],
            }),
        },
        DeviceToolSpec {
            name: "device_calendar.update_event".to_string(),
            description: "Update an existing event in the calendar on the user's device."
                .to_string(),
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "event_id": {"type": "string"},
                    "patch_fields": {"type": "object"},
                },
                "required": ["event_id", "patch_fields"],
            }),
        },
        DeviceToolSpec {
            name: "device_calendar.delete_event".to_string(),
            description: "Delete an event from the calendar on the user's device.".to_string(),
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "event_id": {"type": "string"},
                },
                "required": ["event_id"],
            }),
        },
    ]
}

pub fn device_navigation_tools() -> Vec<DeviceToolSpec> {
    vec![DeviceToolSpec {
        name: "device_navigation.open_in_maps".to_string(),
        description: "Open the maps app on the user's device with directions to a destination."
            .to_string(),
        parameters_schema: json!({
            "type": "object",
            "properties": {
                "destination": {
                    "type": "string",
                    "description": "Destination address or place name.",
                },
                "travel_mode": {
                    "type": "string",
                    "enum": ["driving", "transit", "walking"],
                    "default": "driving",
                },
            },
            "required": ["destination"],
        }),
    }]
}

//! Itinerary templating tool.
//!
//! Distributes a list of chosen activities over morning/afternoon/evening
//! slots across the days of a trip. Pure formatting, no external calls.

use async_trait::async_trait;
use tripsmith_core::error::ToolError;
use tripsmith_core::tool::Tool;

const SLOTS: &[&str] = &["Morning", "Afternoon", "Evening"];

pub struct ItineraryTool;

#[async_trait]
impl Tool for ItineraryTool {
    fn name(&self) -> &str {
        "build_day_plan"
    }

    fn description(&self) -> &str {
        "Lay out a list of activities into a day-by-day itinerary with morning, afternoon, and evening slots."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The destination city"
                },
                "days": {
                    "type": "integer",
                    "description": "Trip length in days (1-30)"
                },
                "activities": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Activities to schedule, in priority order"
                }
            },
            "required": ["city", "days", "activities"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let city = arguments["city"]
            .as_str()
            .ok_or_else(|| self.invalid("missing 'city'"))?;
        let days = arguments["days"]
            .as_u64()
            .ok_or_else(|| self.invalid("missing 'days'"))?;
        if days == 0 || days > 30 {
            return Err(self.invalid("'days' must be between 1 and 30"));
        }
        let activities: Vec<&str> = arguments["activities"]
            .as_array()
            .ok_or_else(|| self.invalid("missing 'activities'"))?
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        if activities.is_empty() {
            return Err(self.invalid("'activities' must not be empty"));
        }

        let mut out = format!("{days}-day itinerary for {city}:\n");
        let mut next = activities.iter();
        for day in 1..=days {
            out.push_str(&format!("Day {day}:\n"));
            for slot in SLOTS {
                match next.next() {
                    Some(activity) => out.push_str(&format!("  {slot}: {activity}\n")),
                    None => out.push_str(&format!("  {slot}: free time\n")),
                }
            }
        }
        if next.next().is_some() {
            out.push_str("Unscheduled (trip too short): ");
            let rest: Vec<&str> = activities
                .iter()
                .skip((days * SLOTS.len() as u64) as usize)
                .copied()
                .collect();
            out.push_str(&rest.join(", "));
            out.push('\n');
        }
        Ok(out)
    }
}

impl ItineraryTool {
    fn invalid(&self, reason: &str) -> ToolError {
        ToolError::InvalidArguments {
            tool_name: self.name().into(),
            reason: reason.into(),
        }
    }
}

//! Hotel search tool — deterministic stub keyed on city and budget tier.

use async_trait::async_trait;
use tripsmith_core::error::ToolError;
use tripsmith_core::tool::Tool;

pub struct HotelSearchTool;

const TIERS: &[(&str, &[&str], u64)] = &[
    ("budget", &["Hostel", "Guesthouse", "Inn"], 40),
    ("mid_range", &["Hotel", "Boutique Hotel", "Residence"], 120),
    ("luxury", &["Grand Hotel", "Palace Hotel", "Resort"], 380),
];

#[async_trait]
impl Tool for HotelSearchTool {
    fn name(&self) -> &str {
        "search_hotels"
    }

    fn description(&self) -> &str {
        "Search for hotels in a city by budget tier (budget, mid_range, luxury). Returns names with nightly price estimates in USD."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city to search in"
                },
                "tier": {
                    "type": "string",
                    "enum": ["budget", "mid_range", "luxury"],
                    "description": "Budget tier (default: mid_range)"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let city = arguments["city"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments {
                tool_name: self.name().into(),
                reason: "missing 'city'".into(),
            })?;
        let tier = arguments["tier"].as_str().unwrap_or("mid_range");

        let Some((_, styles, base_price)) = TIERS.iter().find(|(name, _, _)| *name == tier) else {
            return Err(ToolError::InvalidArguments {
                tool_name: self.name().into(),
                reason: format!("unknown tier '{tier}' (expected budget, mid_range, or luxury)"),
            });
        };

        let hash: u64 = city
            .to_lowercase()
            .bytes()
            .fold(3u64, |acc, b| acc.wrapping_mul(41).wrapping_add(b as u64));

        let lines: Vec<String> = styles
            .iter()
            .enumerate()
            .map(|(i, style)| {
                let price = base_price + (hash.wrapping_add(i as u64 * 13) % (*base_price).max(20)) / 2;
                format!("- {city} {style}: ~${price}/night")
            })
            .collect();

        Ok(format!("Hotels in {city} ({tier}):\n{}", lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_to_mid_range() {
        let tool = HotelSearchTool;
        let output = tool
            .execute(serde_json::json!({"city": "Rome"}))
            .await
            .unwrap();
        assert!(output.contains("mid_range"));
        assert!(output.contains("/night"));
    }

    #[tokio::test]
    async fn luxury_costs_more_than_budget() {
        let tool = HotelSearchTool;
        let budget = tool
            .execute(serde_json::json!({"city": "Rome", "tier": "budget"}))
            .await
            .unwrap();
        let luxury = tool
            .execute(serde_json::json!({"city": "Rome", "tier": "luxury"}))
            .await
            .unwrap();
        assert!(budget.contains("Hostel"));
        assert!(luxury.contains("Grand Hotel"));
    }

    #[tokio::test]
    async fn bad_tier_is_invalid_arguments() {
        let tool = HotelSearchTool;
        let err = tool
            .execute(serde_json::json!({"city": "Rome", "tier": "platinum"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}

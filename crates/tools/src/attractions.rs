//! Attraction search tool — static catalog lookup.
//!
//! Searches a built-in catalog of sights per city, optionally filtered by
//! interest tags. Deterministic, so runs are reproducible.

use async_trait::async_trait;
use tripsmith_core::error::ToolError;
use tripsmith_core::tool::Tool;

struct Attraction {
    name: &'static str,
    tags: &'static [&'static str],
}

const CATALOG: &[(&str, &[Attraction])] = &[
    (
        "paris",
        &[
            Attraction { name: "Louvre Museum", tags: &["art", "museums", "history"] },
            Attraction { name: "Eiffel Tower", tags: &["landmarks", "views"] },
            Attraction { name: "Musée d'Orsay", tags: &["art", "museums"] },
            Attraction { name: "Le Marais food walk", tags: &["food", "walking"] },
            Attraction { name: "Luxembourg Gardens", tags: &["parks", "walking"] },
            Attraction { name: "Sainte-Chapelle", tags: &["history", "architecture"] },
        ],
    ),
    (
        "rome",
        &[
            Attraction { name: "Colosseum", tags: &["history", "landmarks"] },
            Attraction { name: "Vatican Museums", tags: &["art", "museums", "history"] },
            Attraction { name: "Trastevere evening stroll", tags: &["food", "walking"] },
            Attraction { name: "Villa Borghese", tags: &["parks", "art"] },
        ],
    ),
    (
        "tokyo",
        &[
            Attraction { name: "Senso-ji Temple", tags: &["history", "landmarks"] },
            Attraction { name: "Tsukiji Outer Market", tags: &["food", "walking"] },
            Attraction { name: "teamLab Planets", tags: &["art", "museums"] },
            Attraction { name: "Shinjuku Gyoen", tags: &["parks", "walking"] },
            Attraction { name: "Shibuya Crossing", tags: &["landmarks", "views"] },
        ],
    ),
    (
        "london",
        &[
            Attraction { name: "British Museum", tags: &["museums", "history"] },
            Attraction { name: "Borough Market", tags: &["food", "walking"] },
            Attraction { name: "Tower of London", tags: &["history", "landmarks"] },
            Attraction { name: "Hyde Park", tags: &["parks", "walking"] },
        ],
    ),
    (
        "barcelona",
        &[
            Attraction { name: "Sagrada Família", tags: &["architecture", "landmarks"] },
            Attraction { name: "Park Güell", tags: &["parks", "architecture", "views"] },
            Attraction { name: "La Boqueria market", tags: &["food", "walking"] },
            Attraction { name: "Picasso Museum", tags: &["art", "museums"] },
        ],
    ),
];

pub struct AttractionSearchTool;

#[async_trait]
impl Tool for AttractionSearchTool {
    fn name(&self) -> &str {
        "search_attractions"
    }

    fn description(&self) -> &str {
        "Search for attractions in a city, optionally filtered by interest tags such as art, food, history, parks."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city to search in"
                },
                "interests": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Interest tags to filter by"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum results to return (default: 5)"
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
        let interests: Vec<String> = arguments["interests"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.to_lowercase())
                    .collect()
            })
            .unwrap_or_default();
        let limit = arguments["limit"].as_u64().unwrap_or(5) as usize;

        let Some((_, attractions)) = CATALOG
            .iter()
            .find(|(name, _)| *name == city.to_lowercase())
        else {
            return Ok(format!("No attraction catalog available for {city}."));
        };

        let matched: Vec<&Attraction> = attractions
            .iter()
            .filter(|a| {
                interests.is_empty()
                    || a.tags.iter().any(|t| interests.iter().any(|i| i == t))
            })
            .take(limit.max(1))
            .collect();

        if matched.is_empty() {
            return Ok(format!(
                "No attractions in {city} matched interests: {}.",
                interests.join(", ")
            ));
        }

        let lines: Vec<String> = matched
            .iter()
            .map(|a| format!("- {} [{}]", a.name, a.tags.join(", ")))
            .collect();
        Ok(format!("Attractions in {city}:\n{}", lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_city_attractions() {
        let tool = AttractionSearchTool;
        let output = tool
            .execute(serde_json::json!({"city": "Paris"}))
            .await
            .unwrap();
        assert!(output.contains("Louvre Museum"));
    }

    #[tokio::test]
    async fn filters_by_interests() {
        let tool = AttractionSearchTool;
        let output = tool
            .execute(serde_json::json!({"city": "Tokyo", "interests": ["food"]}))
            .await
            .unwrap();
        assert!(output.contains("Tsukiji Outer Market"));
        assert!(!output.contains("Senso-ji Temple"));
    }

    #[tokio::test]
    async fn respects_limit() {
        let tool = AttractionSearchTool;
        let output = tool
            .execute(serde_json::json!({"city": "Paris", "limit": 2}))
            .await
            .unwrap();
        assert_eq!(output.lines().count(), 3); // header + 2 entries
    }

    #[tokio::test]
    async fn unknown_city_is_a_soft_miss() {
        let tool = AttractionSearchTool;
        let output = tool
            .execute(serde_json::json!({"city": "Atlantis"}))
            .await
            .unwrap();
        assert!(output.contains("No attraction catalog"));
    }
}

//! Weather lookup tool — stub that returns mock weather data.
//!
//! In production this would call a real weather API. The stub returns
//! plausible, deterministic data so the dispatch loop can be exercised
//! end-to-end without network access.

use async_trait::async_trait;
use tripsmith_core::error::ToolError;
use tripsmith_core::tool::Tool;

pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_current_weather"
    }

    fn description(&self) -> &str {
        "Look up current weather conditions for a city. Returns temperature, conditions, and precipitation chance."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city to look up weather for"
                },
                "units": {
                    "type": "string",
                    "enum": ["metric", "imperial"],
                    "description": "Temperature units (default: metric)"
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
        let units = arguments["units"].as_str().unwrap_or("metric");

        let report = mock_report(city, units);
        serde_json::to_string_pretty(&report).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: e.to_string(),
        })
    }
}

#[derive(serde::Serialize)]
struct WeatherReport {
    city: String,
    temperature: f64,
    units: String,
    conditions: String,
    precipitation_chance: u32,
}

/// Deterministic mock weather keyed on the city name.
fn mock_report(city: &str, units: &str) -> WeatherReport {
    let hash: u32 = city
        .to_lowercase()
        .bytes()
        .fold(7u32, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u32));

    let conditions = [
        "Sunny",
        "Partly cloudy",
        "Overcast",
        "Light rain",
        "Showers",
        "Clear and windy",
    ];

    let temp_c = ((hash % 33) as f64) - 2.0; // -2 to 30°C
    let (temperature, unit_label) = if units == "imperial" {
        ((temp_c * 9.0 / 5.0 + 32.0).round(), "°F")
    } else {
        (temp_c.round(), "°C")
    };

    WeatherReport {
        city: city.to_string(),
        temperature,
        units: unit_label.to_string(),
        conditions: conditions[(hash as usize / 5) % conditions.len()].to_string(),
        precipitation_chance: (hash / 11) % 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_returns_report() {
        let tool = WeatherTool;
        let output = tool
            .execute(serde_json::json!({"city": "Paris"}))
            .await
            .unwrap();
        assert!(output.contains("Paris"));
        assert!(output.contains("temperature"));
    }

    #[tokio::test]
    async fn imperial_units() {
        let tool = WeatherTool;
        let output = tool
            .execute(serde_json::json!({"city": "New York", "units": "imperial"}))
            .await
            .unwrap();
        assert!(output.contains("°F"));
    }

    #[tokio::test]
    async fn deterministic_results() {
        let tool = WeatherTool;
        let a = tool
            .execute(serde_json::json!({"city": "London"}))
            .await
            .unwrap();
        let b = tool
            .execute(serde_json::json!({"city": "London"}))
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn descriptor_has_required_city() {
        let descriptor = WeatherTool.to_descriptor();
        assert_eq!(descriptor.name, "get_current_weather");
        assert_eq!(descriptor.parameters["required"][0], "city");
    }
}

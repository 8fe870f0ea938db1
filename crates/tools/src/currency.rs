//! Currency conversion tool.
//!
//! Pure computation over a static rate table (all rates quoted against
//! USD). Rates are illustrative, not live.

use async_trait::async_trait;
use tripsmith_core::error::ToolError;
use tripsmith_core::tool::Tool;

/// Units of one USD per currency.
const RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 149.50),
    ("CHF", 0.88),
    ("AUD", 1.52),
    ("CAD", 1.36),
    ("CNY", 7.24),
    ("INR", 83.10),
    ("THB", 35.60),
    ("MXN", 17.05),
];

pub struct CurrencyTool;

impl CurrencyTool {
    fn rate(code: &str) -> Option<f64> {
        let code = code.to_uppercase();
        RATES.iter().find(|(c, _)| *c == code).map(|(_, r)| *r)
    }
}

#[async_trait]
impl Tool for CurrencyTool {
    fn name(&self) -> &str {
        "convert_currency"
    }

    fn description(&self) -> &str {
        "Convert an amount between two currencies using ISO 4217 codes, e.g. 250 EUR to JPY."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "amount": {
                    "type": "number",
                    "description": "The amount to convert"
                },
                "from": {
                    "type": "string",
                    "description": "Source currency code"
                },
                "to": {
                    "type": "string",
                    "description": "Target currency code"
                }
            },
            "required": ["amount", "from", "to"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let amount = arguments["amount"]
            .as_f64()
            .ok_or_else(|| self.invalid("missing 'amount'"))?;
        let from = arguments["from"]
            .as_str()
            .ok_or_else(|| self.invalid("missing 'from'"))?;
        let to = arguments["to"]
            .as_str()
            .ok_or_else(|| self.invalid("missing 'to'"))?;

        let from_rate = Self::rate(from)
            .ok_or_else(|| self.invalid(&format!("unknown currency code '{from}'")))?;
        let to_rate =
            Self::rate(to).ok_or_else(|| self.invalid(&format!("unknown currency code '{to}'")))?;

        let converted = amount / from_rate * to_rate;
        Ok(format!(
            "{:.2} {} = {:.2} {}",
            amount,
            from.to_uppercase(),
            converted,
            to.to_uppercase()
        ))
    }
}

impl CurrencyTool {
    fn invalid(&self, reason: &str) -> ToolError {
        ToolError::InvalidArguments {
            tool_name: self.name().into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn usd_to_usd_is_identity() {
        let tool = CurrencyTool;
        let output = tool
            .execute(serde_json::json!({"amount": 100.0, "from": "USD", "to": "USD"}))
            .await
            .unwrap();
        assert_eq!(output, "100.00 USD = 100.00 USD");
    }

    #[tokio::test]
    async fn eur_to_jpy_goes_through_usd() {
        let tool = CurrencyTool;
        let output = tool
            .execute(serde_json::json!({"amount": 250, "from": "eur", "to": "jpy"}))
            .await
            .unwrap();
        // 250 / 0.92 * 149.50
        assert!(output.starts_with("250.00 EUR = 40625.00 JPY"), "{output}");
    }

    #[tokio::test]
    async fn unknown_code_is_invalid_arguments() {
        let tool = CurrencyTool;
        let err = tool
            .execute(serde_json::json!({"amount": 10, "from": "USD", "to": "XYZ"}))
            .await
            .unwrap_err();
        match err {
            ToolError::InvalidArguments { reason, .. } => assert!(reason.contains("XYZ")),
            other => panic!("Expected InvalidArguments, got: {other:?}"),
        }
    }
}

//! The structured trip request and its seed-message rendering.

use serde::{Deserialize, Serialize};

/// How much the traveller wants to spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Budget,
    MidRange,
    Luxury,
}

impl BudgetTier {
    /// The tier name as the hotel tool expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetTier::Budget => "budget",
            BudgetTier::MidRange => "mid_range",
            BudgetTier::Luxury => "luxury",
        }
    }
}

impl std::fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BudgetTier::Budget => "budget",
            BudgetTier::MidRange => "mid-range",
            BudgetTier::Luxury => "luxury",
        })
    }
}

/// One trip-planning request: free text plus optional structured fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripRequest {
    /// Free-text description of the trip.
    pub description: String,

    /// Where the trip starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// Where the trip goes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Trip length in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,

    /// Spending level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetTier>,

    /// Interest tags, e.g. "art", "food".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,

    /// Currencies the traveller cares about, e.g. home and destination.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub currencies: Vec<String>,
}

impl TripRequest {
    /// Create a request from a free-text description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_duration_days(mut self, days: u32) -> Self {
        self.duration_days = Some(days);
        self
    }

    pub fn with_budget(mut self, budget: BudgetTier) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_currencies<I, S>(mut self, currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.currencies = currencies.into_iter().map(Into::into).collect();
        self
    }

    /// Render the request into the seed user message.
    ///
    /// Plain structured formatting: the description first, then one line
    /// per provided field.
    pub fn seed_message(&self) -> String {
        let mut lines = vec![self.description.clone()];
        if let Some(origin) = &self.origin {
            lines.push(format!("Origin: {origin}"));
        }
        if let Some(destination) = &self.destination {
            lines.push(format!("Destination: {destination}"));
        }
        if let Some(days) = self.duration_days {
            lines.push(format!("Duration: {days} days"));
        }
        if let Some(budget) = self.budget {
            lines.push(format!("Budget: {budget}"));
        }
        if !self.interests.is_empty() {
            lines.push(format!("Interests: {}", self.interests.join(", ")));
        }
        if !self.currencies.is_empty() {
            lines.push(format!("Currencies: {}", self.currencies.join(", ")));
        }
        lines.join("\n")
    }
}

//! Built-in tool implementations for Tripsmith.
//!
//! Flat, stateless, deterministic lookups and computations: weather,
//! currency math, attraction and hotel catalogs, itinerary templating.
//! Deterministic stubs stand in for live APIs so runs are reproducible
//! and the dispatch loop can be exercised without network access.

pub mod attractions;
pub mod currency;
pub mod hotels;
pub mod itinerary;
pub mod weather;

use std::sync::Arc;

use tripsmith_core::error::ToolError;
use tripsmith_core::tool::ToolRegistry;

/// Create a registry with all built-in trip tools.
pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(weather::WeatherTool))?;
    registry.register(Arc::new(currency::CurrencyTool))?;
    registry.register(Arc::new(attractions::AttractionSearchTool))?;
    registry.register(Arc::new(hotels::HotelSearchTool))?;
    registry.register(Arc::new(itinerary::ItineraryTool))?;
    Ok(registry)
}

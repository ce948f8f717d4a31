pub mod clock;
pub mod search;

pub use clock::{CLOCK_TOOL_NAME, Clock, ClockTool, SystemClock};
pub use search::{SEARCH_TOOL_NAME, TavilySearchTool};

use crate::agent::ToolRegistry;
use crate::config::Config;
use anyhow::Result;
use std::sync::Arc;

pub fn create_tools(config: &Config) -> Result<ToolRegistry> {
    let mut search = TavilySearchTool::new(config.search.api_key.clone(), config.request_timeout())
        .with_max_results(config.search.max_results);
    if let Some(base_url) = &config.search.base_url {
        search = search.with_base_url(base_url.clone());
    }

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(search))?;
    if config.variant.uses_clock() {
        registry.register(Arc::new(ClockTool::new()))?;
    }
    Ok(registry)
}

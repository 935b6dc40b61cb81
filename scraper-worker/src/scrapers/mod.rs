//! Built-in scraper implementations.

mod page;

use std::sync::Arc;

pub use page::PageScraper;

use crate::browser::BrowserEngine;
use crate::worker::ScraperRegistry;

/// Registry preloaded with every built-in scraper.
pub fn builtin_registry(browser: Arc<dyn BrowserEngine>) -> ScraperRegistry {
    let mut registry = ScraperRegistry::new();
    registry.register(Arc::new(PageScraper::new(browser)));
    registry
}

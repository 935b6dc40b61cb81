//! Registry of scraper implementations.

use std::collections::HashMap;
use std::sync::Arc;

use super::ScraperHandlers;

/// Maps a scraper custom id to its handler set.
pub struct ScraperRegistry {
    scrapers: HashMap<String, Arc<dyn ScraperHandlers>>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self {
            scrapers: HashMap::new(),
        }
    }

    /// Register a scraper under its custom id, replacing any previous one.
    pub fn register(&mut self, scraper: Arc<dyn ScraperHandlers>) {
        self.scrapers.insert(scraper.custom_id().to_string(), scraper);
    }

    pub fn get(&self, custom_id: &str) -> Option<Arc<dyn ScraperHandlers>> {
        self.scrapers.get(custom_id).cloned()
    }

    /// Registered custom ids, sorted.
    pub fn custom_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.scrapers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for ScraperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

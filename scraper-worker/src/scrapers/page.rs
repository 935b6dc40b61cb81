//! Generic page scraper.
//!
//! Works from plain URLs: CRAWL checks seed URLs and announces the reachable
//! ones as scrape targets, SCRAPE stores a page's title and text, HEALTHCHECK
//! checks the configured base domain. STREAM is not supported.
//!
//! Recognised custom settings: `baseDomain` (string), `seedUrls` (array).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use scraper_common::{HealthState, ScrapeRecord, ScraperConfig, ScrapingError, WorkItem};

use crate::browser::{self, BrowserEngine, BrowserSession};
use crate::context::WorkerContext;
use crate::error::{Error, Result};
use crate::worker::ScraperHandlers;

pub struct PageScraper {
    browser: Arc<dyn BrowserEngine>,
}

impl PageScraper {
    pub const CUSTOM_ID: &'static str = "page";

    pub fn new(browser: Arc<dyn BrowserEngine>) -> Self {
        Self { browser }
    }

    async fn crawl(&self, ctx: &WorkerContext, session: &mut dyn BrowserSession, urls: &[String]) -> Result<()> {
        let mut targets = Vec::new();
        let mut errors = Vec::new();

        for url in urls {
            match session.navigate(url).await {
                Ok(()) => {
                    let title = session.extract_text("title").await?;
                    targets.push(json!({ "url": url, "title": title }));
                }
                Err(e) => {
                    tracing::warn!(url = %url, "Seed URL unreachable: {}", e);
                    errors.push(ScrapingError {
                        url: Some(url.clone()),
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(targets = targets.len(), errors = errors.len(), "Crawl finished");
        if !targets.is_empty() {
            ctx.api().send_scrape_targets(targets).await?;
        }
        if !errors.is_empty() {
            ctx.api().send_scraping_errors(&errors).await?;
        }
        Ok(())
    }

    async fn scrape(&self, ctx: &WorkerContext, session: &mut dyn BrowserSession, item: &WorkItem) -> Result<()> {
        let url = item
            .task
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidTask("scrape task needs a 'url'".to_string()))?;

        session.navigate(url).await?;
        let title = session.extract_text("title").await?;
        let content = session.extract_text("body").await?;

        let mut metadata = json!({ "title": title, "content": content });
        // Keep whatever the crawl attached to the target (link title, date, ...).
        if let (Some(extra), Some(fields)) = (item.task.get("metadata").and_then(Value::as_object), metadata.as_object_mut()) {
            for (key, value) in extra {
                fields.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        ctx.api()
            .send_scrape_records(&[ScrapeRecord::new(url, metadata)])
            .await?;
        Ok(())
    }

    async fn check_domain(&self, session: &mut dyn BrowserSession, base_domain: &str) -> (HealthState, String) {
        match session.navigate(base_domain).await {
            Ok(()) => (HealthState::Green, format!("{} is reachable", base_domain)),
            Err(e) => (HealthState::Red, e.to_string()),
        }
    }
}

/// URLs to crawl: `task.urls` if present, otherwise the `seedUrls` setting.
fn crawl_urls(scraper: &ScraperConfig, task: &Value) -> Result<Vec<String>> {
    let urls = task
        .get("urls")
        .or_else(|| scraper.custom_settings.get("seedUrls"))
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidTask("crawl needs 'urls' or a 'seedUrls' setting".to_string()))?;

    Ok(urls
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

#[async_trait]
impl ScraperHandlers for PageScraper {
    fn custom_id(&self) -> &str {
        Self::CUSTOM_ID
    }

    async fn process_crawl_item(&self, ctx: &WorkerContext, item: &WorkItem) -> Result<()> {
        let urls = crawl_urls(ctx.scraper(), &item.task)?;
        let mut session = self.browser.open().await?;
        let outcome = self.crawl(ctx, session.as_mut(), &urls).await;
        browser::release(session, outcome).await
    }

    async fn process_scrape_item(&self, ctx: &WorkerContext, item: &WorkItem) -> Result<()> {
        let mut session = self.browser.open().await?;
        let outcome = self.scrape(ctx, session.as_mut(), item).await;
        browser::release(session, outcome).await
    }

    async fn process_health_check_item(&self, ctx: &WorkerContext, _item: &WorkItem) -> Result<()> {
        let base_domain = ctx
            .scraper()
            .setting_str("baseDomain")
            .ok_or_else(|| Error::InvalidTask("health check needs a 'baseDomain' setting".to_string()))?;

        let mut session = self.browser.open().await?;
        let (state, message) = self.check_domain(session.as_mut(), base_domain).await;
        browser::release(session, Ok(())).await?;

        ctx.api().send_health_check_info(state, &message).await?;
        Ok(())
    }
}

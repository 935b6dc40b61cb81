//! Handler plugin contract.

use async_trait::async_trait;
use scraper_common::{WorkItem, WorkItemType};

use crate::context::WorkerContext;
use crate::error::{Error, Result};

/// Per-work-item-type processing supplied by a concrete scraper.
///
/// Handlers only do the work; the terminal report is sent by [`report`]
/// from the returned result. A type the scraper does not support keeps the
/// default method, which fails with [`Error::NotImplemented`].
#[async_trait]
pub trait ScraperHandlers: Send + Sync {
    /// Custom id this scraper registers under (e.g., "page").
    fn custom_id(&self) -> &str;

    async fn process_crawl_item(&self, _ctx: &WorkerContext, _item: &WorkItem) -> Result<()> {
        Err(Error::NotImplemented(WorkItemType::Crawl))
    }

    async fn process_scrape_item(&self, _ctx: &WorkerContext, _item: &WorkItem) -> Result<()> {
        Err(Error::NotImplemented(WorkItemType::Scrape))
    }

    async fn process_stream_item(&self, _ctx: &WorkerContext, _item: &WorkItem) -> Result<()> {
        Err(Error::NotImplemented(WorkItemType::Stream))
    }

    async fn process_health_check_item(&self, _ctx: &WorkerContext, _item: &WorkItem) -> Result<()> {
        Err(Error::NotImplemented(WorkItemType::HealthCheck))
    }
}

/// How a handler execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Completed,
    Failed,
}

/// Run the handler matching the item's type.
///
/// Nothing is reported here; the caller stops the heartbeat first and then
/// hands the result to [`report`].
pub async fn run_handler(handlers: &dyn ScraperHandlers, ctx: &WorkerContext, item: &WorkItem) -> Result<()> {
    match item.work_item_type {
        WorkItemType::Crawl => handlers.process_crawl_item(ctx, item).await,
        WorkItemType::Scrape => handlers.process_scrape_item(ctx, item).await,
        WorkItemType::Stream => handlers.process_stream_item(ctx, item).await,
        WorkItemType::HealthCheck => handlers.process_health_check_item(ctx, item).await,
        WorkItemType::Noop => Err(Error::InvalidTask("NOOP work items have no handler".to_string())),
    }
}

/// Send the terminal report for a handler result.
///
/// Exactly one of `workItemCompleted` / `workItemFailed` is sent per call.
/// A report that cannot be delivered is logged; it never turns a completed
/// item into a failed one.
pub async fn report(handlers: &dyn ScraperHandlers, ctx: &WorkerContext, item: &WorkItem, result: Result<()>) -> HandlerOutcome {
    let api = ctx.api();
    match result {
        Ok(()) => {
            tracing::info!(work_item_id = %item.id, work_item_type = %item.work_item_type, "Work item completed");
            if let Err(e) = api.work_item_completed(&item.id).await {
                tracing::error!(work_item_id = %item.id, "Failed to report work item completion: {}", e);
            }
            HandlerOutcome::Completed
        }
        Err(error) => {
            if let Error::NotImplemented(work_item_type) = &error {
                tracing::error!(
                    work_item_id = %item.id,
                    scraper = handlers.custom_id(),
                    "Scraper received a {} work item it does not implement",
                    work_item_type
                );
            } else {
                tracing::warn!(work_item_id = %item.id, work_item_type = %item.work_item_type, "Work item failed: {}", error);
            }
            if let Err(e) = api.work_item_failed(&item.id, &error).await {
                tracing::error!(work_item_id = %item.id, "Failed to report work item failure: {}", e);
            }
            HandlerOutcome::Failed
        }
    }
}

//! Poll loop and per-item dispatch.

use std::sync::Arc;
use std::time::Duration;

use scraper_common::{Assignment, WorkItemId, WorkItemType};
use tokio_util::sync::CancellationToken;

use super::handler::{report, run_handler, HandlerOutcome, ScraperHandlers};
use super::heartbeat::Heartbeat;
use crate::config::WorkerConfig;
use crate::context::{WorkerContext, WorkerIdentity};
use crate::control_plane::{register, ControlPlaneClient};
use crate::error::{Error, Result};

/// Timing of the poll loop.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    /// Idle time after a NOOP work item.
    pub noop_timeout: Duration,
    /// Period of progress reports while a handler runs.
    pub progress_interval: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from(&WorkerConfig::default())
    }
}

impl From<&WorkerConfig> for WorkerSettings {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            noop_timeout: config.noop_timeout(),
            progress_interval: config.progress_interval(),
        }
    }
}

/// What one poll cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    /// NOOP: idled without reporting.
    Idle,
    /// A handler ran and its terminal report was sent.
    Processed {
        work_item_id: WorkItemId,
        work_item_type: WorkItemType,
        outcome: HandlerOutcome,
    },
    /// The item could not be dispatched; nothing was reported.
    Skipped { work_item_type: String },
}

/// A registered worker running the poll loop.
///
/// At most one work item is in flight: the next poll starts only after the
/// current handler resolved, its heartbeat has stopped and the terminal
/// report was sent. No progress report follows the terminal one.
pub struct Worker {
    ctx: Arc<WorkerContext>,
    handlers: Arc<dyn ScraperHandlers>,
    settings: WorkerSettings,
    shutdown: CancellationToken,
}

impl Worker {
    pub fn new(ctx: WorkerContext, handlers: Arc<dyn ScraperHandlers>, settings: WorkerSettings) -> Self {
        Self {
            ctx: Arc::new(ctx),
            handlers,
            settings,
            shutdown: CancellationToken::new(),
        }
    }

    /// Register with the control-plane and build the worker.
    ///
    /// Registration failures are returned; no poll happens in that case.
    pub async fn bootstrap(
        client: ControlPlaneClient,
        identity: WorkerIdentity,
        handlers: Arc<dyn ScraperHandlers>,
        settings: WorkerSettings,
    ) -> Result<Self> {
        if handlers.custom_id() != identity.custom_id() {
            return Err(Error::UnknownScraper(identity.custom_id().to_string()));
        }

        let scraper = register(&client, &identity).await?;
        tracing::info!(
            scraper_id = %scraper.id,
            instance_id = identity.instance_id(),
            "Scraper registered"
        );
        Ok(Self::new(WorkerContext::new(identity, scraper, client), handlers, settings))
    }

    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    /// Token that stops [`Worker::run`] between cycles when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Poll until shutdown. Fetch failures end the loop with an error.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            scraper_id = self.ctx.api().scraper_id(),
            instance_id = self.ctx.api().instance_id(),
            "Processing work items"
        );

        while !self.shutdown.is_cancelled() {
            self.poll_once().await?;
        }

        tracing::info!("Worker stopped");
        Ok(())
    }

    /// Run a single poll cycle.
    pub async fn poll_once(&self) -> Result<Cycle> {
        let assignment = self.ctx.api().next_work_item().await?;

        match assignment {
            Assignment::Noop => {
                tracing::debug!("Got NOOP work item, idling for {:?}", self.settings.noop_timeout);
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.noop_timeout) => {}
                    _ = self.shutdown.cancelled() => {}
                }
                Ok(Cycle::Idle)
            }
            Assignment::Unsupported { work_item_type } => {
                tracing::warn!(work_item_type = %work_item_type, "Unsupported work item type");
                Ok(Cycle::Skipped { work_item_type })
            }
            Assignment::MissingId { work_item_type } => {
                tracing::warn!(work_item_type = %work_item_type, "Work item without id, skipping");
                Ok(Cycle::Skipped {
                    work_item_type: work_item_type.to_string(),
                })
            }
            Assignment::Work(item) => {
                tracing::info!(
                    work_item_id = %item.id,
                    work_item_type = %item.work_item_type,
                    "Got work item"
                );

                let heartbeat = Heartbeat::spawn(
                    self.ctx.api().clone(),
                    item.id.clone(),
                    self.settings.progress_interval,
                );
                let result = run_handler(self.handlers.as_ref(), &self.ctx, &item).await;
                let beats = heartbeat.stop().await;
                tracing::debug!(work_item_id = %item.id, beats, "Handler finished, heartbeat stopped");
                let outcome = report(self.handlers.as_ref(), &self.ctx, &item, result).await;

                Ok(Cycle::Processed {
                    work_item_id: item.id,
                    work_item_type: item.work_item_type,
                    outcome,
                })
            }
        }
    }
}

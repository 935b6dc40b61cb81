//! Progress heartbeat for an in-flight work item.

use std::time::Duration;

use scraper_common::WorkItemId;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::control_plane::ScraperApi;

/// Background task reporting `workItemProgress` on a fixed period.
///
/// The first report goes out immediately. Failed reports are logged and never
/// stop the heartbeat. Dropping the handle cancels the task.
pub struct Heartbeat {
    work_item_id: WorkItemId,
    token: CancellationToken,
    handle: Option<JoinHandle<u64>>,
}

impl Heartbeat {
    pub fn spawn(api: ScraperApi, work_item_id: WorkItemId, period: Duration) -> Self {
        let token = CancellationToken::new();
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(run(api, work_item_id.clone(), period, token.clone()));
        Self {
            work_item_id,
            token,
            handle: Some(handle),
        }
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the heartbeat and wait for it to wind down.
    ///
    /// Returns the number of progress reports sent.
    pub async fn stop(mut self) -> u64 {
        self.token.cancel();
        let Some(handle) = self.handle.take() else {
            return 0;
        };
        match handle.await {
            Ok(beats) => beats,
            Err(e) => {
                tracing::warn!(work_item_id = %self.work_item_id, "Heartbeat task ended abnormally: {}", e);
                0
            }
        }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(api: ScraperApi, work_item_id: WorkItemId, period: Duration, token: CancellationToken) -> u64 {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut beats = 0;

    loop {
        select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tracing::debug!(work_item_id = %work_item_id, "Progressing work item");
        select! {
            _ = token.cancelled() => break,
            result = api.work_item_progress(&work_item_id) => {
                beats += 1;
                if let Err(e) = result {
                    tracing::warn!(work_item_id = %work_item_id, "Failed to send heartbeat: {}", e);
                }
            }
        }
    }

    tracing::debug!(work_item_id = %work_item_id, beats, "Heartbeat stopped");
    beats
}

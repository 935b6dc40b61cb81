//! Ctrl-C handling for the poll loop.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// How interrupt watching ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// A second interrupt arrived while the worker was still winding down.
    Forced,
    /// The signal source failed; no further interrupts will be seen.
    Unavailable,
}

/// Watch an interrupt source for the lifetime of the worker.
///
/// The first interrupt cancels `shutdown`, letting the current work item
/// finish. The second one returns [`Interrupt::Forced`] and the caller is
/// expected to exit without waiting.
pub async fn watch_interrupts<S, F>(mut interrupt: S, shutdown: CancellationToken) -> Interrupt
where
    S: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    let mut received = 0u32;
    loop {
        if let Err(e) = interrupt().await {
            tracing::error!("Unable to listen for interrupts: {}", e);
            return Interrupt::Unavailable;
        }
        received += 1;
        if received == 1 {
            tracing::info!("Shutdown requested, finishing current work item (interrupt again to exit now)");
            shutdown.cancel();
        } else {
            tracing::warn!("Second interrupt, exiting immediately");
            return Interrupt::Forced;
        }
    }
}

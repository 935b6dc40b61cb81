//! Work item lifecycle.
//!
//! The dispatcher polls the control-plane, hands each work item to the
//! scraper's handler for its type, and keeps a heartbeat running for exactly
//! as long as the handler does.

mod dispatcher;
mod handler;
mod heartbeat;
mod interrupt;
mod registry;

pub use dispatcher::{Cycle, Worker, WorkerSettings};
pub use handler::{report, run_handler, HandlerOutcome, ScraperHandlers};
pub use heartbeat::Heartbeat;
pub use interrupt::{watch_interrupts, Interrupt};
pub use registry::ScraperRegistry;

//! Scraper worker - polls the scraper control-plane for work items, runs them
//! through the matching scraper handler, and reports progress and outcomes.

pub mod browser;
pub mod config;
pub mod context;
pub mod control_plane;
pub mod error;
pub mod scrapers;
pub mod worker;

pub use context::{WorkerContext, WorkerIdentity};
pub use error::{Error, Result};
pub use worker::{Cycle, HandlerOutcome, ScraperHandlers, ScraperRegistry, Worker, WorkerSettings};

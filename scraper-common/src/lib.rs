//! Scraper Common Types
//!
//! Wire types exchanged between scraper workers and the control-plane.

pub mod protocol;
pub mod work_item;

pub use protocol::{
    EmailMessage, FailureMessage, HealthCheckInfo, HealthState, RegisterResponse, ScrapeRecord,
    ScrapeTarget, ScraperConfig, ScrapingError, WorkItemFailure,
};
pub use work_item::{Assignment, WorkItem, WorkItemEnvelope, WorkItemId, WorkItemType};

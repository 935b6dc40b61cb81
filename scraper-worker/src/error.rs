//! Error types for the scraper worker.

use scraper_common::WorkItemType;

/// Error types for control-plane, registration and handler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Control-plane communication error: {0}")]
    Communication(#[from] reqwest::Error),

    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse {
        endpoint: &'static str,
        message: String,
    },

    #[error("Registration rejected with status {0}")]
    RegistrationRejected(u16),

    #[error("Scraper is disabled")]
    ScraperDisabled,

    #[error("Scraper is not configured")]
    ScraperNotConfigured,

    #[error("No scraper registered for custom id '{0}'")]
    UnknownScraper(String),

    #[error("{0} handler not implemented")]
    NotImplemented(WorkItemType),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Unsupported browser operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Registration errors stop the worker before it polls.
    pub fn is_registration(&self) -> bool {
        matches!(
            self,
            Error::RegistrationRejected(_) | Error::ScraperDisabled | Error::ScraperNotConfigured
        )
    }
}

/// Render the cause chain of an error, one cause per line.
pub fn cause_chain(error: &(dyn std::error::Error + 'static)) -> Option<String> {
    let mut causes = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        causes.push(format!("caused by: {}", cause));
        source = cause.source();
    }
    if causes.is_empty() {
        None
    } else {
        Some(causes.join("\n"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! HTTP client for the scraper control-plane.
//!
//! This module handles authenticated requests to the control-plane REST API,
//! the one-shot registration handshake, and every scraper-scoped report a
//! worker sends (progress, completion, failures, scrape output, files).

mod api;
mod client;
mod endpoint;
mod registration;

pub use api::ScraperApi;
pub use client::{ApiKey, ApiRequest, ApiResponse, ControlPlaneClient};
pub use endpoint::Endpoint;
pub use registration::register;

//! Worker identity and the immutable context shared by every operation.

use scraper_common::ScraperConfig;
use uuid::Uuid;

use crate::control_plane::{ApiKey, ControlPlaneClient, ScraperApi};

/// Who this worker process is.
///
/// The instance id is generated once per process and tells apart workers
/// running concurrently for the same scraper.
#[derive(Debug, Clone)]
pub struct WorkerIdentity {
    custom_id: String,
    api_key: ApiKey,
    instance_id: String,
}

impl WorkerIdentity {
    pub fn new(custom_id: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            custom_id: custom_id.into(),
            api_key,
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn custom_id(&self) -> &str {
        &self.custom_id
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
}

/// Context created at bootstrap and passed to the dispatcher and handlers.
#[derive(Debug)]
pub struct WorkerContext {
    identity: WorkerIdentity,
    scraper: ScraperConfig,
    api: ScraperApi,
}

impl WorkerContext {
    pub fn new(identity: WorkerIdentity, scraper: ScraperConfig, client: ControlPlaneClient) -> Self {
        let api = ScraperApi::new(
            client,
            identity.instance_id().to_string(),
            scraper.id.clone(),
        );
        Self {
            identity,
            scraper,
            api,
        }
    }

    pub fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    /// Configuration returned by registration.
    pub fn scraper(&self) -> &ScraperConfig {
        &self.scraper
    }

    pub fn api(&self) -> &ScraperApi {
        &self.api
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_ids_are_unique() {
        let a = WorkerIdentity::new("page", ApiKey::new("k"));
        let b = WorkerIdentity::new("page", ApiKey::new("k"));
        assert_ne!(a.instance_id(), b.instance_id());
        assert_eq!(a.custom_id(), "page");
    }

    #[test]
    fn test_context_scopes_api() {
        let identity = WorkerIdentity::new("page", ApiKey::new("k"));
        let instance_id = identity.instance_id().to_string();
        let scraper = ScraperConfig {
            id: "s9".to_string(),
            enabled: true,
            custom_settings: Default::default(),
        };
        let ctx = WorkerContext::new(
            identity,
            scraper,
            ControlPlaneClient::new("http://localhost", ApiKey::new("k")),
        );

        assert_eq!(ctx.api().scraper_id(), "s9");
        assert_eq!(ctx.api().instance_id(), instance_id);
    }
}

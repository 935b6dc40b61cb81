//! One-shot registration handshake.

use scraper_common::{RegisterResponse, ScraperConfig};

use super::{ApiRequest, ControlPlaneClient, Endpoint};
use crate::context::WorkerIdentity;
use crate::error::{Error, Result};

/// Register the worker and fetch its scraper configuration.
///
/// Fails when the control-plane answers with a non-success status, when the
/// scraper is disabled, or when it has not been configured yet.
pub async fn register(client: &ControlPlaneClient, identity: &WorkerIdentity) -> Result<ScraperConfig> {
    let request = ApiRequest::get()
        .query("customId", identity.custom_id())
        .error_message("Failed to register scraper");
    let response = client.request(Endpoint::Register, request).await?;

    if !response.is_success() {
        return Err(Error::RegistrationRejected(response.status().as_u16()));
    }

    let data: RegisterResponse = response.json().map_err(|e| Error::UnexpectedResponse {
        endpoint: Endpoint::Register.path(),
        message: e.to_string(),
    })?;
    tracing::info!(
        custom_id = identity.custom_id(),
        configured = data.configured,
        "Scraper register response received"
    );

    let scraper = data.scraper.ok_or(Error::ScraperNotConfigured)?;
    if !scraper.enabled {
        tracing::warn!(scraper_id = %scraper.id, "Scraper is disabled");
        return Err(Error::ScraperDisabled);
    }
    if !data.configured {
        tracing::warn!(scraper_id = %scraper.id, "Scraper is not configured");
        return Err(Error::ScraperNotConfigured);
    }

    Ok(scraper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_plane::ApiKey;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn register_with(status: u16, body: serde_json::Value) -> Result<ScraperConfig> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/register"))
            .and(query_param("customId", "page"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let identity = WorkerIdentity::new("page", ApiKey::new("k"));
        let client = ControlPlaneClient::new(&server.uri(), identity.api_key().clone());
        register(&client, &identity).await
    }

    #[tokio::test]
    async fn test_register_success() {
        let scraper = register_with(
            200,
            json!({
                "scraper": {"id": "s1", "enabled": true, "customSettings": {"baseDomain": "https://a"}},
                "configured": true
            }),
        )
        .await
        .unwrap();

        assert_eq!(scraper.id, "s1");
        assert_eq!(scraper.setting_str("baseDomain"), Some("https://a"));
    }

    #[tokio::test]
    async fn test_register_disabled() {
        let result = register_with(
            200,
            json!({"scraper": {"id": "s1", "enabled": false}, "configured": true}),
        )
        .await;
        assert!(matches!(result, Err(Error::ScraperDisabled)));
    }

    #[tokio::test]
    async fn test_register_not_configured() {
        let result = register_with(
            200,
            json!({"scraper": {"id": "s1", "enabled": true}, "configured": false}),
        )
        .await;
        assert!(matches!(result, Err(Error::ScraperNotConfigured)));
    }

    #[tokio::test]
    async fn test_register_bad_status() {
        let result = register_with(403, json!({"error": "forbidden"})).await;
        assert!(matches!(result, Err(Error::RegistrationRejected(403))));
    }
}

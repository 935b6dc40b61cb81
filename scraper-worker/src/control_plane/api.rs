//! Scraper-scoped control-plane operations.

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use scraper_common::{
    Assignment, EmailMessage, FailureMessage, HealthCheckInfo, HealthState, ScrapeRecord,
    ScrapeTarget, ScrapingError, WorkItemEnvelope, WorkItemFailure, WorkItemId,
};

use super::{ApiRequest, ApiResponse, ControlPlaneClient, Endpoint};
use crate::error::{cause_chain, Error, Result};

/// Operations a registered worker performs on behalf of its scraper.
///
/// Every call goes through [`ControlPlaneClient`], so non-success statuses are
/// logged there and handed back; network failures come back as errors.
#[derive(Debug, Clone)]
pub struct ScraperApi {
    client: ControlPlaneClient,
    instance_id: String,
    scraper_id: String,
}

impl ScraperApi {
    pub fn new(client: ControlPlaneClient, instance_id: String, scraper_id: String) -> Self {
        Self {
            client,
            instance_id,
            scraper_id,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn scraper_id(&self) -> &str {
        &self.scraper_id
    }

    /// Poll for the next work item and classify it.
    pub async fn next_work_item(&self) -> Result<Assignment> {
        let request = ApiRequest::get()
            .query("scraperId", &self.scraper_id)
            .query("instanceId", &self.instance_id)
            .error_message("Failed to get next work item");
        let response = self.client.request(Endpoint::NextWorkItem, request).await?;

        if !response.is_success() {
            return Err(Error::UnexpectedResponse {
                endpoint: Endpoint::NextWorkItem.path(),
                message: format!("status {}", response.status()),
            });
        }

        let envelope: WorkItemEnvelope = response.json().map_err(|e| Error::UnexpectedResponse {
            endpoint: Endpoint::NextWorkItem.path(),
            message: e.to_string(),
        })?;
        Ok(envelope.classify())
    }

    pub async fn work_item_progress(&self, work_item_id: &WorkItemId) -> Result<ApiResponse> {
        let request = ApiRequest::post()
            .query("instanceId", &self.instance_id)
            .query("workItemId", work_item_id)
            .error_message("Failed to report work item progress");
        self.client.request(Endpoint::WorkItemProgress, request).await
    }

    pub async fn work_item_completed(&self, work_item_id: &WorkItemId) -> Result<ApiResponse> {
        let request = ApiRequest::post()
            .query("instanceId", &self.instance_id)
            .query("workItemId", work_item_id)
            .error_message("Failed to report work item completion");
        self.client.request(Endpoint::WorkItemCompleted, request).await
    }

    pub async fn work_item_failed(
        &self,
        work_item_id: &WorkItemId,
        error: &(dyn std::error::Error + Send + Sync + 'static),
    ) -> Result<ApiResponse> {
        let failure = WorkItemFailure {
            work_item_id: work_item_id.clone(),
            msgs: vec![FailureMessage {
                msg: error.to_string(),
                stacktrace: cause_chain(error),
            }],
        };
        let request = ApiRequest::post()
            .query("instanceId", &self.instance_id)
            .json(&failure)?
            .error_message("Failed to report work item failure");
        self.client.request(Endpoint::WorkItemFailed, request).await
    }

    /// Send discovered URL metadata, one target per entry.
    pub async fn send_scrape_targets(&self, metadata_list: Vec<Value>) -> Result<ApiResponse> {
        let targets: Vec<ScrapeTarget> = metadata_list
            .into_iter()
            .map(|metadata| ScrapeTarget {
                source_id: self.scraper_id.clone(),
                metadata,
            })
            .collect();
        let request = ApiRequest::post()
            .json(&targets)?
            .error_message("Failed to send scrape targets");
        self.client.request(Endpoint::ReceiveScraperTargets, request).await
    }

    pub async fn send_scrape_records(&self, records: &[ScrapeRecord]) -> Result<ApiResponse> {
        let request = ApiRequest::post()
            .query("scraperId", &self.scraper_id)
            .json(records)?
            .error_message("Failed to send scrape records");
        self.client.request(Endpoint::ReceiveScraperRecords, request).await
    }

    pub async fn send_scraping_errors(&self, errors: &[ScrapingError]) -> Result<ApiResponse> {
        let request = ApiRequest::post()
            .query("scraperId", &self.scraper_id)
            .json(errors)?
            .error_message("Failed to send scraping errors");
        self.client.request(Endpoint::ReceiveScrapingErrors, request).await
    }

    pub async fn send_health_check_info(&self, state: HealthState, message: &str) -> Result<ApiResponse> {
        let info = HealthCheckInfo::new(self.scraper_id.clone(), state, message);
        let request = ApiRequest::post()
            .json(&info)?
            .error_message("Failed to send health check info");
        self.client.request(Endpoint::ReceiveHealthCheckInfo, request).await
    }

    pub async fn send_email(&self, receiver: &str, subject: &str, content: &str) -> Result<ApiResponse> {
        let email = EmailMessage {
            email_addresses_to: vec![receiver.to_string()],
            subject: subject.to_string(),
            content: content.to_string(),
        };
        let request = ApiRequest::post()
            .json(&email)?
            .error_message("Failed to send email");
        self.client.request(Endpoint::SendEmail, request).await
    }

    /// Download a file from the scraper's file store.
    pub async fn get_file(&self, file_name: &str) -> Result<Vec<u8>> {
        let request = ApiRequest::get()
            .path(&self.scraper_id)
            .query("fileName", file_name)
            .error_message("Failed to get file");
        let response = self.client.request(Endpoint::File, request).await?;

        if !response.is_success() {
            return Err(Error::UnexpectedResponse {
                endpoint: Endpoint::File.path(),
                message: format!("status {} for file '{}'", response.status(), file_name),
            });
        }
        Ok(response.into_bytes())
    }

    pub async fn file_exists(&self, file_name: &str) -> Result<bool> {
        let request = ApiRequest::get()
            .path(&self.scraper_id)
            .query("fileName", file_name)
            .error_message("Failed to check if file exists");
        let response = self.client.request(Endpoint::FileExists, request).await?;

        if !response.is_success() {
            return Err(Error::UnexpectedResponse {
                endpoint: Endpoint::FileExists.path(),
                message: format!("status {}", response.status()),
            });
        }
        response.json().map_err(|e| Error::UnexpectedResponse {
            endpoint: Endpoint::FileExists.path(),
            message: e.to_string(),
        })
    }

    /// Upload a file into the scraper's file store.
    pub async fn send_file(&self, file_name: &str, content: Vec<u8>) -> Result<ApiResponse> {
        let form = Form::new().part("file", Part::bytes(content).file_name(file_name.to_string()));
        let query = vec![("fileStoreId".to_string(), self.scraper_id.clone())];
        self.client
            .upload(Endpoint::ReceiveFile, &query, form, "Failed to send file")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_plane::ApiKey;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> ScraperApi {
        let client = ControlPlaneClient::new(&server.uri(), ApiKey::new("k"));
        ScraperApi::new(client, "inst-1".to_string(), "s1".to_string())
    }

    fn body(request: &wiremock::Request) -> Value {
        serde_json::from_slice(&request.body).unwrap()
    }

    #[derive(Debug, thiserror::Error)]
    #[error("page crashed")]
    struct PageCrashed(#[source] std::io::Error);

    #[tokio::test]
    async fn test_work_item_failed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/workItemFailed"))
            .and(query_param("instanceId", "inst-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let error = PageCrashed(std::io::Error::new(std::io::ErrorKind::Other, "socket closed"));
        api(&server)
            .work_item_failed(&WorkItemId::new("42"), &error)
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(
            body(&received[0]),
            json!({
                "workItemId": "42",
                "msgs": [{"msg": "page crashed", "stacktrace": "caused by: socket closed"}]
            })
        );
    }

    #[tokio::test]
    async fn test_progress_and_completed_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let api = api(&server);
        let id = WorkItemId::new("7");
        api.work_item_progress(&id).await.unwrap();
        api.work_item_completed(&id).await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].url.path(), "/workItemProgress");
        assert_eq!(received[0].url.query(), Some("instanceId=inst-1&workItemId=7"));
        assert_eq!(received[1].url.path(), "/workItemCompleted");
        assert_eq!(received[1].url.query(), Some("instanceId=inst-1&workItemId=7"));
    }

    #[tokio::test]
    async fn test_scrape_targets_carry_source_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/receiveScraperTargets"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        api(&server)
            .send_scrape_targets(vec![json!({"url": "https://a/1"}), json!({"url": "https://a/2"})])
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(
            body(&received[0]),
            json!([
                {"sourceId": "s1", "metadata": {"url": "https://a/1"}},
                {"sourceId": "s1", "metadata": {"url": "https://a/2"}}
            ])
        );
    }

    #[tokio::test]
    async fn test_health_check_and_email_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let api = api(&server);
        api.send_health_check_info(HealthState::Red, "down").await.unwrap();
        api.send_email("ops@example.com", "Alert", "It broke").await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].url.path(), "/receiveHealthcheckInfo");
        assert_eq!(
            body(&received[0]),
            json!({"scraperId": "s1", "metadata": {"message": "down"}, "state": "RED"})
        );
        assert_eq!(received[1].url.path(), "/sendEmail");
        assert_eq!(
            body(&received[1]),
            json!({"emailAddressesTo": ["ops@example.com"], "subject": "Alert", "content": "It broke"})
        );
    }

    #[tokio::test]
    async fn test_file_operations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file/s1"))
            .and(query_param("fileName", "seed.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a,b".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fileExists/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/receiveFile"))
            .and(query_param("fileStoreId", "s1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let api = api(&server);
        assert_eq!(api.get_file("seed.csv").await.unwrap(), b"a,b".to_vec());
        assert!(api.file_exists("seed.csv").await.unwrap());
        assert!(api.send_file("out.csv", b"x".to_vec()).await.unwrap().is_success());

        let upload = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.url.path() == "/receiveFile")
            .unwrap();
        let content_type = upload.headers.get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn test_next_work_item_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getNextWorkItem"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = api(&server).next_work_item().await;
        assert!(matches!(result, Err(Error::UnexpectedResponse { .. })));
    }
}

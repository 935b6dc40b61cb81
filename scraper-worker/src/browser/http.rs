//! HTTP-backed browser engine.
//!
//! Fetches pages with a plain HTTP client. It has no script runtime and no
//! DOM, so only the `title` and `body` selectors are understood.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{BrowserEngine, BrowserSession};
use crate::config::BrowserConfig;
use crate::error::{Error, Result};

/// Browser engine that loads pages over HTTP.
pub struct HttpBrowser {
    http_client: Client,
    max_page_bytes: usize,
}

impl HttpBrowser {
    pub fn new(config: &BrowserConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(ref user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        Ok(Self {
            http_client: builder.build()?,
            max_page_bytes: config.max_page_bytes,
        })
    }
}

#[async_trait]
impl BrowserEngine for HttpBrowser {
    fn engine_type(&self) -> &'static str {
        "http"
    }

    async fn open(&self) -> Result<Box<dyn BrowserSession>> {
        Ok(Box::new(HttpSession {
            http_client: self.http_client.clone(),
            max_page_bytes: self.max_page_bytes,
            page: None,
        }))
    }
}

struct Page {
    url: String,
    html: String,
}

struct HttpSession {
    http_client: Client,
    max_page_bytes: usize,
    page: Option<Page>,
}

impl HttpSession {
    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| Error::Browser("no page loaded".to_string()))
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let mut response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Browser(format!("failed to load {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Browser(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let limit = self.max_page_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(Error::Browser(format!("{} is larger than {} bytes", url, limit)));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Browser(format!("failed to read {}: {}", url, e)))?
        {
            if body.len() + chunk.len() > limit {
                return Err(Error::Browser(format!("{} is larger than {} bytes", url, limit)));
            }
            body.extend_from_slice(&chunk);
        }
        let html = String::from_utf8_lossy(&body).into_owned();
        tracing::debug!(url, bytes = html.len(), "Page loaded");
        self.page = Some(Page {
            url: url.to_string(),
            html,
        });
        Ok(())
    }

    async fn evaluate(&mut self, _script: &str) -> Result<Value> {
        Err(Error::UnsupportedOperation("script evaluation"))
    }

    async fn extract_text(&mut self, selector: &str) -> Result<Option<String>> {
        let page = self.page()?;
        match selector {
            "title" => Ok(element_inner(&page.html, "title").map(|t| collapse_whitespace(&t))),
            "body" => Ok(element_inner(&page.html, "body").map(|b| strip_tags(&b))),
            _ => Err(Error::UnsupportedOperation("css selectors")),
        }
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.page()?.html.clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        if let Some(page) = self.page {
            tracing::debug!(url = %page.url, "Closing session");
        }
        Ok(())
    }
}

/// Inner HTML of the first `<tag ...>...</tag>` element (case-insensitive).
fn element_inner(html: &str, tag: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{}", tag);
    let close = format!("</{}", tag);

    let mut search_from = 0;
    let start = loop {
        let at = search_from + lower[search_from..].find(&open)?;
        // Skip longer tag names sharing the prefix, e.g. <bodyguard>.
        match lower.as_bytes().get(at + open.len()) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | Some(b'/') => {
                break at;
            }
            _ => search_from = at + open.len(),
        }
    };
    let content_start = start + lower[start..].find('>')? + 1;
    let end = lower[content_start..]
        .find(&close)
        .map(|i| content_start + i)
        .unwrap_or(html.len());
    Some(html[content_start..end].to_string())
}

/// Drop tags, scripts and styles, and collapse whitespace.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(lt) = rest.find('<') {
        text.push_str(&rest[..lt]);
        text.push(' ');
        let tail = &rest[lt..];
        let lower = tail.get(..7).map(str::to_ascii_lowercase).unwrap_or_default();
        let skip_until = if lower.starts_with("<script") {
            Some("</script>")
        } else if lower.starts_with("<style") {
            Some("</style>")
        } else {
            None
        };

        rest = match skip_until {
            Some(end_tag) => match tail.to_ascii_lowercase().find(end_tag) {
                Some(i) => &tail[i + end_tag.len()..],
                None => "",
            },
            None => match tail.find('>') {
                Some(i) => &tail[i + 1..],
                None => "",
            },
        };
    }
    text.push_str(rest);
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = "<html><head><TITLE>\n  News  </TITLE><style>p{}</style></head>\
        <body class=\"x\"><h1>Hello</h1><script>var a = '<p>';</script><p>world</p></body></html>";

    #[test]
    fn test_element_inner() {
        assert_eq!(element_inner(PAGE, "title").as_deref(), Some("\n  News  "));
        assert_eq!(element_inner("<bodyguard>x</bodyguard><body>y</body>", "body").as_deref(), Some("y"));
        assert_eq!(element_inner(PAGE, "nav"), None);
    }

    #[test]
    fn test_strip_tags() {
        let body = element_inner(PAGE, "body").unwrap();
        assert_eq!(strip_tags(&body), "Hello world");
    }

    #[tokio::test]
    async fn test_session_navigates_and_extracts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let browser = HttpBrowser::new(&BrowserConfig::default()).unwrap();
        let mut session = browser.open().await.unwrap();

        assert!(matches!(session.content().await, Err(Error::Browser(_))));

        session.navigate(&format!("{}/news", server.uri())).await.unwrap();
        assert_eq!(session.extract_text("title").await.unwrap().as_deref(), Some("News"));
        assert_eq!(session.extract_text("body").await.unwrap().as_deref(), Some("Hello world"));
        assert!(matches!(
            session.extract_text("div.details").await,
            Err(Error::UnsupportedOperation(_))
        ));
        assert!(matches!(
            session.evaluate("document.title").await,
            Err(Error::UnsupportedOperation(_))
        ));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_navigate_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let browser = HttpBrowser::new(&BrowserConfig::default()).unwrap();
        let mut session = browser.open().await.unwrap();
        let result = session.navigate(&format!("{}/down", server.uri())).await;
        assert!(matches!(result, Err(Error::Browser(_))));
    }

    #[tokio::test]
    async fn test_oversized_page_is_refused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(4096)))
            .mount(&server)
            .await;

        let config = BrowserConfig {
            max_page_bytes: 1024,
            ..BrowserConfig::default()
        };
        let browser = HttpBrowser::new(&config).unwrap();
        let mut session = browser.open().await.unwrap();
        let result = session.navigate(&format!("{}/big", server.uri())).await;
        assert!(matches!(result, Err(Error::Browser(msg)) if msg.contains("larger than 1024 bytes")));
        assert!(matches!(session.content().await, Err(Error::Browser(_))));
    }
}

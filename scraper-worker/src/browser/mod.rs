//! Browser automation capability.
//!
//! Handlers drive pages through the [`BrowserSession`] trait and never see the
//! engine behind it. A session is owned by the handler invocation that opened
//! it and must be closed before the handler returns; [`release`] does that
//! while keeping the handler's own outcome.

mod http;

pub use http::HttpBrowser;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Something that can open browser sessions.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Identifier for logging (e.g., "http").
    fn engine_type(&self) -> &'static str;

    async fn open(&self) -> Result<Box<dyn BrowserSession>>;
}

/// A single page-driving session.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load a URL, replacing the current page.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Evaluate a script against the current page.
    async fn evaluate(&mut self, script: &str) -> Result<Value>;

    /// Text of the first element matching `selector`, if any.
    async fn extract_text(&mut self, selector: &str) -> Result<Option<String>>;

    /// Raw content of the current page.
    async fn content(&mut self) -> Result<String>;

    async fn close(self: Box<Self>) -> Result<()>;
}

/// Close a session and return the outcome of the work done with it.
///
/// A failing close is logged and never replaces `outcome`.
pub async fn release<T>(session: Box<dyn BrowserSession>, outcome: Result<T>) -> Result<T> {
    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct FlakySession {
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl BrowserSession for FlakySession {
        async fn navigate(&mut self, _url: &str) -> Result<()> {
            Ok(())
        }

        async fn evaluate(&mut self, _script: &str) -> Result<Value> {
            Ok(Value::Null)
        }

        async fn extract_text(&mut self, _selector: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn content(&mut self) -> Result<String> {
            Ok(String::new())
        }

        async fn close(self: Box<Self>) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Err(Error::Browser("already gone".to_string()))
        }
    }

    #[tokio::test]
    async fn test_release_keeps_outcome_when_close_fails() {
        let closed = Arc::new(AtomicBool::new(false));
        let session = Box::new(FlakySession { closed: closed.clone() });

        let outcome = release(session, Ok::<_, Error>(7)).await;
        assert_eq!(outcome.unwrap(), 7);
        assert!(closed.load(Ordering::SeqCst));

        let session = Box::new(FlakySession { closed: closed.clone() });
        let outcome: Result<()> = release(session, Err(Error::Handler("boom".to_string()))).await;
        assert!(matches!(outcome, Err(Error::Handler(_))));
    }
}

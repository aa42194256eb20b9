//! services/studio/src/adapters/sheet_feed.rs
//!
//! Fetches a published spreadsheet (CSV or TSV export) over plain HTTP.

use async_trait::async_trait;
use kidsmart_core::ports::{FeedSource, PortError, PortResult};
use tracing::debug;

#[derive(Clone)]
pub struct SheetFeedAdapter {
    http: reqwest::Client,
}

impl SheetFeedAdapter {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

/// A feed that answers with an error status is unreachable, the same as a
/// transport failure. `NotFound` is reserved for missing records.
fn status_error(status: reqwest::StatusCode) -> PortError {
    PortError::Unexpected(format!("feed answered {status}"))
}

#[async_trait]
impl FeedSource for SheetFeedAdapter {
    async fn fetch_text(&self, url: &str) -> PortResult<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("feed request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let text = response
            .text()
            .await
            .map_err(|e| PortError::Unexpected(format!("feed body unreadable: {e}")))?;
        debug!(url, bytes = text.len(), "feed fetched");
        Ok(text)
    }
}

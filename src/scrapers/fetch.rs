//! Page fetching behind a small trait so adapters can run offline in tests.

use crate::error::{NewsError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Browser-like User-Agent; several sources reject obvious bots.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Something that can turn a URL into the raw response body.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`PageFetcher`] over a shared `reqwest` client with a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NewsError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await?;
        debug!(bytes = body.len(), %status, "Fetched page");
        Ok(body.to_vec())
    }
}

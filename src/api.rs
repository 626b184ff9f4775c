//! Upstream meme API client

use crate::types::{Meme, MemeListResponse};
use async_trait::async_trait;
use tracing::debug;

/// Any failure fetching a meme list. Callers treat all variants the same way;
/// the variants only exist so logs say what went wrong.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response body: {0}")]
    Body(#[source] reqwest::Error),
}

/// A "give me N total" meme list endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemeSource: Send + Sync {
    async fn fetch(&self, count: usize) -> Result<Vec<Meme>, FetchError>;
}

pub struct MemeApiClient {
    client: reqwest::Client,
    base_url: String,
    category: String,
}

impl MemeApiClient {
    pub fn new(client: reqwest::Client, base_url: &str, category: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            category: category.trim_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, count: usize) -> String {
        format!("{}/{}/{}", self.base_url, self.category, count)
    }
}

#[async_trait]
impl MemeSource for MemeApiClient {
    async fn fetch(&self, count: usize) -> Result<Vec<Meme>, FetchError> {
        let url = self.endpoint(count);
        debug!(url = %url, "Fetching memes");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body: MemeListResponse = response.json().await.map_err(FetchError::Body)?;
        debug!(requested = count, received = body.memes.len(), "Memes received");

        Ok(body.memes.into_iter().map(Meme::from).collect())
    }
}

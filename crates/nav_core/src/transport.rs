use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, CACHE_CONTROL, PRAGMA},
    Client,
};
use shared::protocol::ContentPayload;
use tracing::debug;
use url::Url;

use crate::{collaborators::Transport, error::NavError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const CACHE_BUST_PARAM: &str = "_";

/// Fetches content JSON for logical locations resolved against one origin.
pub struct HttpTransport {
    http: Client,
    origin: Url,
}

impl HttpTransport {
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, NavError> {
        let origin = Url::parse(origin).map_err(|source| NavError::InvalidUrl {
            url: origin.to_string(),
            source,
        })?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(origin, http))
    }

    pub fn with_client(origin: Url, http: Client) -> Self {
        Self { http, origin }
    }

    /// Absolute request URL with a cache-busting `_` parameter appended.
    pub fn endpoint(&self, location: &str) -> Result<Url> {
        let mut endpoint = self
            .origin
            .join(location)
            .with_context(|| format!("cannot resolve `{location}` against {}", self.origin))?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        endpoint
            .query_pairs_mut()
            .append_pair(CACHE_BUST_PARAM, &stamp.to_string());
        Ok(endpoint)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_json(&self, url: &str) -> Result<ContentPayload> {
        let endpoint = self.endpoint(url)?;
        debug!(%endpoint, "fetching content");
        let payload = self
            .http
            .get(endpoint)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?
            .error_for_status()?
            .json::<ContentPayload>()
            .await?;
        Ok(payload)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

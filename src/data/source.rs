//! Grant data sources.
//!
//! The store never knows where grants come from; it calls a `GrantSource`.
//! - `StaticSource`: an in-memory payload (the built-in sample, or test fixtures)
//! - `FileSource`: a saved upstream response on disk
//! - `HttpSource`: the live paginated endpoint

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::models::GrantsResponse;
use crate::error::LoadError;

/// Upstream endpoint used when no other URL is configured
pub const DEFAULT_API_URL: &str = "https://api.doge.gov/savings/grants";

/// Ten-record dataset sorted by value, descending
const SAMPLE_PAYLOAD: &str = include_str!("sample_grants.json");

/// Something that can produce one page of grants
#[async_trait]
pub trait GrantSource: Send + Sync {
    async fn fetch(&self) -> Result<GrantsResponse, LoadError>;

    /// Human-readable description for logs and status lines
    fn describe(&self) -> String;
}

/// A payload held in memory
#[derive(Debug, Clone)]
pub struct StaticSource {
    label: String,
    payload: String,
}

impl StaticSource {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        StaticSource {
            label: label.into(),
            payload: payload.into(),
        }
    }

    /// The built-in sample dataset
    pub fn sample() -> Self {
        Self::new("built-in sample", SAMPLE_PAYLOAD)
    }
}

#[async_trait]
impl GrantSource for StaticSource {
    async fn fetch(&self) -> Result<GrantsResponse, LoadError> {
        Ok(serde_json::from_str(&self.payload)?)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// A saved upstream response on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        FileSource { path }
    }
}

#[async_trait]
impl GrantSource for FileSource {
    async fn fetch(&self) -> Result<GrantsResponse, LoadError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(serde_json::from_str(&text)?)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// The live endpoint, one page per fetch
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: reqwest::Client,
    base_url: String,
    page: u32,
    per_page: u32,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, page: u32, per_page: u32) -> Result<Self, LoadError> {
        let http = reqwest::Client::builder()
            .user_agent(format!("fda-grants/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(HttpSource {
            http,
            base_url: base_url.into(),
            page,
            per_page,
        })
    }

    /// Query parameters for the configured page, sorted by value descending
    fn query(&self) -> [(&'static str, String); 4] {
        [
            ("sort_by", "value".to_string()),
            ("sort_order", "desc".to_string()),
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ]
    }

    /// Fetch the raw response body without interpreting it
    pub async fn fetch_text(&self) -> Result<String, LoadError> {
        debug!("GET {} page={} per_page={}", self.base_url, self.page, self.per_page);
        let resp = self
            .http
            .get(&self.base_url)
            .query(&self.query())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Http {
                status: status.as_u16(),
                url: resp.url().to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl GrantSource for HttpSource {
    async fn fetch(&self) -> Result<GrantsResponse, LoadError> {
        let text = self.fetch_text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn describe(&self) -> String {
        format!("{} (page {}, {} per page)", self.base_url, self.page, self.per_page)
    }
}

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::SourceKind;
use crate::error::Result;

// Ingest-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    /// Issue one GET. Transport failures are `Err`; any HTTP status, including
    /// non-2xx, is returned as `Ok` for the caller to classify.
    async fn get(&self, url: &str) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Given a source, return its raw JSON payload or fail.
#[async_trait]
pub trait SourcePort: Send + Sync {
    async fn fetch(&self, source: SourceKind) -> Result<Value>;
}

//! Entity directory synchronization.
//!
//! After a reading is persisted, the entity name is pushed to the
//! dashboard so it shows up there without manual registration.
//! Registration is idempotent on the dashboard side; failures here are
//! non-fatal to the pipeline.

use std::time::Duration;

use async_trait::async_trait;

/// HTTP request timeout for a registration call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for directory synchronization failures.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The underlying HTTP request failed (network, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The dashboard returned a non-2xx status code.
    #[error("Directory endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// EntityDirectory
// ---------------------------------------------------------------------------

/// Make sure the dashboard knows an entity by this name.
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    async fn ensure_registered(&self, entity_id: &str) -> Result<(), DirectoryError>;
}

/// Production directory adapter: POSTs the entity name to the
/// dashboard's registration endpoint.
pub struct HttpDirectory {
    client: reqwest::Client,
    url: String,
}

impl HttpDirectory {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl EntityDirectory for HttpDirectory {
    async fn ensure_registered(&self, entity_id: &str) -> Result<(), DirectoryError> {
        let payload = serde_json::json!({ "nome": entity_id });
        let response = self.client.post(&self.url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(DirectoryError::HttpStatus(response.status().as_u16()));
        }
        tracing::debug!(entity = entity_id, "Entity registered with dashboard");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_does_not_panic() {
        let _directory = HttpDirectory::new("http://localhost:8000/api/hospitais/sync");
    }

    #[test]
    fn directory_error_display_http_status() {
        let err = DirectoryError::HttpStatus(502);
        assert_eq!(err.to_string(), "Directory endpoint returned HTTP 502");
    }
}

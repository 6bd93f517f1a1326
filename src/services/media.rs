//! Object-storage collaborator. The core only ever asks the store to delete
//! an uploaded object; uploads happen elsewhere.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, instrument};

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Requests deletion of the object at `url`. Callers treat failures as
    /// non-fatal.
    async fn delete_object(&self, url: &str) -> Result<()>;
}

/// Issues DELETE requests directly against the storage endpoint.
pub struct HttpMediaStore {
    client: reqwest::Client,
    api_key: String,
}

impl HttpMediaStore {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl MediaStore for HttpMediaStore {
    #[instrument(skip(self))]
    async fn delete_object(&self, url: &str) -> Result<()> {
        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("storage delete returned {status}");
        }
        debug!(url = url, "Media object deleted");
        Ok(())
    }
}

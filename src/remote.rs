use std::time::Duration;

use reqwest::Client;

use crate::{
    catalog::{CatalogDetails, CatalogEntry},
    error::{Result, SnapshotError},
};

/// Remote source of the app catalog. Implementations perform the network
/// I/O; failures surface as `RemoteFetch` and are never retried here.
#[allow(async_fn_in_trait)]
pub trait RemoteCatalog {
    /// The authoritative full collection.
    async fn fetch_all(&self) -> Result<Vec<CatalogEntry>>;

    /// Extra fields for a single entry.
    async fn fetch_details(&self, entry: &CatalogEntry) -> Result<CatalogDetails>;
}

/// Catalog source over HTTP: the endpoint serves the full collection as a
/// JSON array, and per-entry details under `/<name>`.
pub struct HttpCatalog {
    base_url: String,
    client: Client,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build http client");
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn resolved_endpoint(&self, segment: Option<&str>) -> String {
        let base = self.base_url.trim_end_matches('/');
        match segment {
            Some(segment) => format!("{base}/{segment}"),
            None => base.to_string(),
        }
    }
}

impl RemoteCatalog for HttpCatalog {
    async fn fetch_all(&self) -> Result<Vec<CatalogEntry>> {
        let response = self
            .client
            .get(self.resolved_endpoint(None))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| SnapshotError::RemoteFetch(err.to_string()))?;

        response
            .json::<Vec<CatalogEntry>>()
            .await
            .map_err(|err| SnapshotError::RemoteFetch(err.to_string()))
    }

    async fn fetch_details(&self, entry: &CatalogEntry) -> Result<CatalogDetails> {
        let response = self
            .client
            .get(self.resolved_endpoint(Some(&entry.name)))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| SnapshotError::RemoteFetch(err.to_string()))?;

        response
            .json::<CatalogDetails>()
            .await
            .map_err(|err| SnapshotError::RemoteFetch(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_resolution_handles_trailing_slash() {
        let remote = HttpCatalog::new("http://localhost:7070/catalog/");
        assert_eq!(
            remote.resolved_endpoint(None),
            "http://localhost:7070/catalog"
        );
        assert_eq!(
            remote.resolved_endpoint(Some("dota")),
            "http://localhost:7070/catalog/dota"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_reports_remote_fetch_error() {
        let remote = HttpCatalog::new("http://127.0.0.1:1/catalog");
        let err = remote.fetch_all().await.unwrap_err();
        assert!(matches!(err, SnapshotError::RemoteFetch(_)));
    }
}

use kingshelf_model::BookRecord;
use url::Url;

use crate::dto::{BookDto, Envelope};
use crate::error::ApiError;

/// Base URL of the public book API this client was written against.
pub const DEFAULT_API_URL: &str = "https://stephen-king-api.onrender.com/api";

/// Client for the remote book catalog.
///
/// Every call is a single best-effort round trip: no retries, no caching, no
/// request-level timeout overrides beyond the shared client default.
/// Pagination is offset-based; the caller owns the cursor and this client
/// never interprets it.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    pub fn new(base_url: Url) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        tracing::info!(%base_url, "creating catalog client");

        Self { http, base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Fetch one page of the collection starting at `offset`, requesting at
    /// most `limit` records.
    pub async fn fetch_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<BookRecord>, ApiError> {
        let url = self.endpoint("books");
        tracing::debug!(%url, offset, limit, "requesting catalog page");

        let response = self
            .http
            .get(&url)
            .query(&[("offset", offset), ("limit", limit)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status });
        }

        let body = response.text().await?;
        let envelope: Envelope<Vec<BookDto>> =
            serde_json::from_str(&body).map_err(ApiError::Parse)?;
        Ok(envelope
            .data
            .into_inner()
            .into_iter()
            .map(BookDto::into_record)
            .collect())
    }

    /// Fetch the full detail record for one catalog entry.
    pub async fn fetch_by_id(&self, id: u64) -> Result<BookRecord, ApiError> {
        let url = self.endpoint(&format!("book/{id}"));
        tracing::debug!(%url, id, "requesting book detail");

        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status });
        }

        let body = response.text().await?;
        let envelope: Envelope<BookDto> =
            serde_json::from_str(&body).map_err(ApiError::Parse)?;
        Ok(envelope.data.into_inner().into_record())
    }
}

use async_trait::async_trait;
use kingshelf_client::{ApiError, CatalogClient};
use kingshelf_model::BookRecord;

/// Remote collection as the task layer sees it. The indirection exists so
/// controller and task plumbing can be exercised against an in-memory
/// collection instead of a live server.
#[async_trait]
pub trait CatalogSource: Send + Sync + 'static {
    async fn fetch_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<BookRecord>, ApiError>;

    async fn fetch_by_id(&self, id: u64) -> Result<BookRecord, ApiError>;
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn fetch_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<BookRecord>, ApiError> {
        CatalogClient::fetch_page(self, offset, limit).await
    }

    async fn fetch_by_id(&self, id: u64) -> Result<BookRecord, ApiError> {
        CatalogClient::fetch_by_id(self, id).await
    }
}

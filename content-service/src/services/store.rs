use crate::query::{ListQuery, PaginationMeta};
use async_trait::async_trait;
use bson::Document;
use service_core::error::AppError;

/// Read access to content collections.
///
/// `find` and `count` take the same [`ListQuery`]; implementations must
/// apply the identical filter to both so totals describe the filtered set.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// One page of matching documents, sorted and projected.
    async fn find(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, AppError>;

    /// Number of documents matching the query's filter, ignoring pagination.
    async fn count(&self, collection: &str, query: &ListQuery) -> Result<u64, AppError>;

    /// A single document by `_id` (ObjectId hex or plain string id).
    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// A page of results together with the count it was drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub documents: Vec<Document>,
    pub total: u64,
    pub pagination: PaginationMeta,
}

/// Runs the page fetch and the count concurrently.
pub async fn execute(
    store: &dyn ContentStore,
    collection: &str,
    query: &ListQuery,
) -> Result<Page, AppError> {
    let (documents, total) = tokio::try_join!(
        store.find(collection, query),
        store.count(collection, query)
    )?;

    tracing::debug!(
        collection = %collection,
        returned = documents.len(),
        total,
        "Executed list query"
    );

    Ok(Page {
        documents,
        total,
        pagination: query.pagination().meta(total),
    })
}

use crate::query::PaginationMeta;
use crate::services::Page;
use bson::{Bson, Document};
use serde::Serialize;
use serde_json::Value;

/// Envelope for every list endpoint.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    /// Items on this page.
    pub count: usize,
    /// Items matching the filter across all pages.
    pub total: u64,
    pub pagination: PaginationMeta,
    pub data: Vec<Value>,
}

impl From<Page> for ListResponse {
    fn from(page: Page) -> Self {
        let data: Vec<Value> = page.documents.into_iter().map(document_to_json).collect();
        Self {
            success: true,
            count: data.len(),
            total: page.total,
            pagination: page.pagination,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub success: bool,
    pub data: Value,
}

impl From<Document> for ItemResponse {
    fn from(document: Document) -> Self {
        Self {
            success: true,
            data: document_to_json(document),
        }
    }
}

/// Relaxed extended JSON, except that an ObjectId `_id` becomes its plain
/// hex string.
pub fn document_to_json(mut document: Document) -> Value {
    if let Ok(id) = document.get_object_id("_id") {
        document.insert("_id", id.to_hex());
    }
    Bson::Document(document).into_relaxed_extjson()
}

use crate::dtos::{ItemResponse, ListResponse};
use crate::models::ContentType;
use crate::query::{ListParams, QueryBuilder};
use crate::services::execute;
use crate::startup::AppState;
use axum::{
    extract::{Path, RawQuery, State},
    Json,
};
use metrics::counter;
use service_core::error::AppError;

fn content_type(slug: &str) -> Result<ContentType, AppError> {
    ContentType::from_slug(slug)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Unknown content type '{}'", slug)))
}

/// `GET /api/content/:content` with filters, search, sort, fields and
/// pagination taken from the query string.
pub async fn list_content(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<ListResponse>, AppError> {
    let content_type = content_type(&slug)?;
    let params = ListParams::from_query_str(raw_query.as_deref().unwrap_or_default())
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Malformed query string: {}", e)))?;

    let query = QueryBuilder::new(params)
        .filter()
        .search(content_type.searchable_fields())
        .sort()
        .limit_fields()
        .paginate(&state.config.query.page_defaults())
        .build();

    let collection = content_type.collection();
    let page = execute(state.store.as_ref(), collection, &query).await?;

    counter!("content_list_queries_total", "collection" => collection).increment(1);
    tracing::info!(
        collection = %collection,
        page = page.pagination.page,
        limit = page.pagination.limit,
        total = page.total,
        "Listed content"
    );

    Ok(Json(ListResponse::from(page)))
}

pub async fn get_content(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<ItemResponse>, AppError> {
    let content_type = content_type(&slug)?;
    let document = state
        .store
        .find_by_id(content_type.collection(), &id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("No {} entry with id '{}'", content_type, id))
        })?;

    Ok(Json(ItemResponse::from(document)))
}

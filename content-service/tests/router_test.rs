use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use bson::doc;
use content_service::config::ContentConfig;
use content_service::services::MemoryStore;
use content_service::startup::{router, AppState};
use http_body_util::BodyExt;
use solar_calculator::RegionTable;
use std::sync::Arc;
use tower::ServiceExt;

fn app(store: MemoryStore) -> Router {
    router(AppState {
        config: ContentConfig::default(),
        store: Arc::new(store),
        regions: Arc::new(RegionTable::builtin().unwrap()),
    })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn list_route_runs_the_query_pipeline() {
    let store = MemoryStore::new();
    store
        .insert_many(
            "faqs",
            vec![
                doc! { "question": "Does net metering apply?", "category": "billing" },
                doc! { "question": "How long do panels last?", "category": "hardware" },
            ],
        )
        .await;

    let response = app(store)
        .oneshot(
            Request::builder()
                .uri("/api/content/faqs?category=billing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["category"], "billing");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = app(MemoryStore::new())
        .oneshot(Request::builder().uri("/api/nothing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn estimate_route_rejects_wrong_method() {
    let response = app(MemoryStore::new())
        .oneshot(
            Request::builder()
                .uri("/api/solar/estimate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

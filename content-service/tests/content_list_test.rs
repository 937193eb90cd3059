mod common;

use bson::{doc, DateTime, Document};
use common::TestApp;
use content_service::config::ContentConfig;

fn product(name: &str, category: &str, price: i32, created_day: i64) -> Document {
    doc! {
        "name": name,
        "category": category,
        "price": price,
        "description": format!("{} for rooftop installs", name),
        "createdAt": DateTime::from_millis(1_704_067_200_000 + created_day * 86_400_000),
        "__v": 0,
    }
}

async fn app_with_products() -> TestApp {
    let app = TestApp::spawn().await;
    app.seed(
        "products",
        vec![
            product("Solar Panel X", "panel", 200, 1),
            product("Inverter Y", "inverter", 450, 2),
            product("Solar Panel Pro", "panel", 300, 3),
            product("Battery Z", "battery", 900, 4),
            product("Bifacial Panel", "panel", 350, 5),
        ],
    )
    .await;
    app
}

fn names(body: &serde_json::Value) -> Vec<String> {
    body["data"]
        .as_array()
        .expect("data is an array")
        .iter()
        .map(|item| item["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn search_matches_only_products_containing_term() {
    let app = TestApp::spawn().await;
    app.seed(
        "products",
        vec![
            doc! { "name": "Solar Panel X" },
            doc! { "name": "Inverter Y" },
        ],
    )
    .await;

    let (status, body) = app.get_json("/api/content/products?search=panel").await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 1);
    assert_eq!(body["total"], 1);
    assert_eq!(names(&body), vec!["Solar Panel X"]);
}

#[tokio::test]
async fn total_counts_the_filtered_set_not_the_collection() {
    let app = app_with_products().await;

    let (status, body) = app
        .get_json("/api/content/products?category=panel&limit=1")
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["count"], 1);
    assert_eq!(body["total"], 3);
    assert_eq!(body["pagination"]["totalPages"], 3);
}

#[tokio::test]
async fn pagination_echoes_page_and_limit() {
    let app = app_with_products().await;

    let (_, body) = app.get_json("/api/content/products?page=2&limit=2").await;

    assert_eq!(body["count"], 2);
    assert_eq!(body["total"], 5);
    assert_eq!(
        body["pagination"],
        serde_json::json!({ "page": 2, "limit": 2, "totalPages": 3 })
    );
    // Default order is newest first, so page 2 holds the 3rd and 4th newest
    assert_eq!(names(&body), vec!["Solar Panel Pro", "Inverter Y"]);
}

#[tokio::test]
async fn invalid_page_and_limit_fall_back_to_defaults() {
    let app = app_with_products().await;

    let (status, body) = app
        .get_json("/api/content/products?page=0&limit=abc")
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 100);
    assert_eq!(body["count"], 5);
}

#[tokio::test]
async fn configured_limits_apply() {
    let mut config = ContentConfig::default();
    config.query.default_limit = 2;
    config.query.max_limit = Some(3);
    let app = TestApp::spawn_with(config).await;
    for i in 0..5 {
        app.seed("news", vec![doc! { "title": format!("Update {}", i) }])
            .await;
    }

    let (_, defaulted) = app.get_json("/api/content/news").await;
    assert_eq!(defaulted["count"], 2);

    let (_, capped) = app.get_json("/api/content/news?limit=50").await;
    assert_eq!(capped["count"], 3);
    assert_eq!(capped["pagination"]["limit"], 3);
}

#[tokio::test]
async fn sort_supports_multiple_keys_and_directions() {
    let app = app_with_products().await;

    let (_, ascending) = app.get_json("/api/content/products?sort=price").await;
    assert_eq!(
        names(&ascending),
        vec![
            "Solar Panel X",
            "Solar Panel Pro",
            "Bifacial Panel",
            "Inverter Y",
            "Battery Z"
        ]
    );

    let (_, grouped) = app
        .get_json("/api/content/products?sort=category,-price")
        .await;
    assert_eq!(
        names(&grouped),
        vec![
            "Battery Z",
            "Inverter Y",
            "Bifacial Panel",
            "Solar Panel Pro",
            "Solar Panel X"
        ]
    );
}

#[tokio::test]
async fn range_and_membership_filters_combine() {
    let app = app_with_products().await;

    let (_, ranged) = app
        .get_json("/api/content/products?price[gte]=300&price[lt]=900&sort=price")
        .await;
    assert_eq!(
        names(&ranged),
        vec!["Solar Panel Pro", "Bifacial Panel", "Inverter Y"]
    );

    let (_, members) = app
        .get_json("/api/content/products?category[in]=battery,inverter&sort=name")
        .await;
    assert_eq!(names(&members), vec!["Battery Z", "Inverter Y"]);

    let (_, repeated) = app
        .get_json("/api/content/products?category=battery&category=inverter")
        .await;
    assert_eq!(repeated["total"], 2);
}

#[tokio::test]
async fn numeric_looking_values_match_text_fields() {
    let app = TestApp::spawn().await;
    app.seed(
        "products",
        vec![
            doc! { "name": "Mono 400W", "sku": "1001", "warrantyYears": 25 },
            doc! { "name": "Poly 330W", "sku": "1002", "warrantyYears": 10 },
        ],
    )
    .await;

    let (_, by_sku) = app.get_json("/api/content/products?sku=1001").await;
    assert_eq!(names(&by_sku), vec!["Mono 400W"]);

    let (_, by_warranty) = app
        .get_json("/api/content/products?warrantyYears=10")
        .await;
    assert_eq!(names(&by_warranty), vec!["Poly 330W"]);
}

#[tokio::test]
async fn search_and_filters_are_both_required() {
    let app = app_with_products().await;

    let (_, body) = app
        .get_json("/api/content/products?search=solar&price[gt]=250")
        .await;

    assert_eq!(names(&body), vec!["Solar Panel Pro"]);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn date_filters_compare_as_dates() {
    let app = app_with_products().await;

    let (_, body) = app
        .get_json("/api/content/products?createdAt[gte]=2024-01-05&sort=createdAt")
        .await;

    assert_eq!(names(&body), vec!["Battery Z", "Bifacial Panel"]);
}

#[tokio::test]
async fn fields_limit_the_returned_keys() {
    let app = app_with_products().await;

    let (_, body) = app
        .get_json("/api/content/products?fields=name,price&limit=1")
        .await;

    let item = body["data"][0].as_object().expect("item is an object");
    let mut keys: Vec<&str> = item.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["_id", "name", "price"]);
    assert_eq!(item["_id"].as_str().map(str::len), Some(24));
}

#[tokio::test]
async fn internal_version_key_is_hidden_by_default() {
    let app = app_with_products().await;

    let (_, body) = app.get_json("/api/content/products?limit=1").await;

    let item = &body["data"][0];
    assert!(item.get("__v").is_none());
    assert!(item.get("description").is_some());
}

#[tokio::test]
async fn operator_injection_is_ignored() {
    let app = app_with_products().await;

    let (status, body) = app
        .get_json("/api/content/products?$where=1&price[$ne]=0&name[regex]=.*")
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["total"], 5);
}

#[tokio::test]
async fn unknown_content_type_is_not_found() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get_json("/api/content/users").await;

    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn empty_collection_lists_nothing() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get_json("/api/content/faqs").await;

    assert_eq!(status, 200);
    assert_eq!(body["count"], 0);
    assert_eq!(body["total"], 0);
    assert_eq!(body["pagination"]["totalPages"], 0);
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn content_types_map_to_their_collections() {
    let app = TestApp::spawn().await;
    app.seed("casestudies", vec![doc! { "title": "School rooftop, Pune" }])
        .await;

    let (_, body) = app.get_json("/api/content/case-studies?search=pune").await;

    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn single_item_is_fetched_by_id() {
    let app = TestApp::spawn().await;
    let id = app
        .store
        .insert("blogs", doc! { "title": "Net metering explained", "__v": 2 })
        .await;
    let hex = id.as_object_id().expect("generated ObjectId").to_hex();

    let (status, body) = app.get_json(&format!("/api/content/blogs/{}", hex)).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["_id"], hex);
    assert_eq!(body["data"]["title"], "Net metering explained");
    assert!(body["data"].get("__v").is_none());

    let (status, body) = app
        .get_json("/api/content/blogs/000000000000000000000000")
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
}

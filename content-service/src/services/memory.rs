use super::store::ContentStore;
use crate::query::{eval, ListQuery, Projection};
use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use service_core::error::AppError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

type Collections = HashMap<String, Vec<Document>>;

/// In-process content store evaluating list queries with the same semantics
/// as the MongoDB backend. Used for local development and the test suite.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed data is a JSON object mapping collection names to arrays of
    /// documents, in MongoDB extended JSON where types matter
    /// (`{"$date": ...}`, `{"$oid": ...}`).
    pub fn from_seed_json(raw: &str) -> Result<Self, AppError> {
        let seed: HashMap<String, Vec<serde_json::Value>> = serde_json::from_str(raw)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid seed data: {}", e)))?;

        let mut collections = Collections::new();
        for (name, values) in seed {
            let mut documents = Vec::with_capacity(values.len());
            for value in values {
                let document = match Bson::try_from(value) {
                    Ok(Bson::Document(document)) => document,
                    Ok(other) => {
                        return Err(AppError::ConfigError(anyhow::anyhow!(
                            "Seed entry in '{}' is not a document: {}",
                            name,
                            other
                        )))
                    }
                    Err(e) => {
                        return Err(AppError::ConfigError(anyhow::anyhow!(
                            "Invalid seed entry in '{}': {}",
                            name,
                            e
                        )))
                    }
                };
                documents.push(with_id(document));
            }
            tracing::info!(collection = %name, documents = documents.len(), "Seeded collection");
            collections.insert(name, documents);
        }

        Ok(Self {
            collections: Arc::new(RwLock::new(collections)),
        })
    }

    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            tracing::error!("Failed to read seed file {}: {}", path.display(), e);
            AppError::from(e)
        })?;
        Self::from_seed_json(&raw)
    }

    /// Stores `document`, assigning an ObjectId when it has no `_id`.
    /// Returns the stored id.
    pub async fn insert(&self, collection: &str, document: Document) -> Bson {
        let document = with_id(document);
        let id = document.get("_id").cloned().unwrap_or(Bson::Null);
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);
        id
    }

    pub async fn insert_many(
        &self,
        collection: &str,
        documents: impl IntoIterator<Item = Document>,
    ) -> Vec<Bson> {
        let mut ids = Vec::new();
        for document in documents {
            ids.push(self.insert(collection, document).await);
        }
        ids
    }

    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

fn with_id(mut document: Document) -> Document {
    if !document.contains_key("_id") {
        document.insert("_id", ObjectId::new());
    }
    document
}

fn id_matches(stored: Option<&Bson>, id: &str) -> bool {
    match stored {
        Some(Bson::ObjectId(object_id)) => object_id.to_hex() == id,
        Some(Bson::String(text)) => text == id,
        _ => false,
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn find(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Document> = documents
            .iter()
            .filter(|document| eval::matches(query, document))
            .collect();
        matched.sort_by(|left, right| eval::compare_documents(query.sort(), left, right));

        let pagination = query.pagination();
        Ok(matched
            .into_iter()
            .skip(to_usize(pagination.skip()))
            .take(to_usize(pagination.limit()))
            .map(|document| eval::project(query.projection(), document.clone()))
            .collect())
    }

    async fn count(&self, collection: &str, query: &ListQuery) -> Result<u64, AppError> {
        let collections = self.collections.read().await;
        let total = collections.get(collection).map_or(0, |documents| {
            documents
                .iter()
                .filter(|document| eval::matches(query, document))
                .count()
        });
        Ok(total as u64)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|documents| {
            documents
                .iter()
                .find(|document| id_matches(document.get("_id"), id))
                .cloned()
                .map(|document| eval::project(&Projection::ExcludeInternal, document))
        }))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ListParams, PageDefaults};
    use crate::services::execute;
    use bson::doc;

    fn query(raw: &str) -> ListQuery {
        ListQuery::from_params(
            ListParams::from_query_str(raw).unwrap(),
            &["name", "description"],
            &PageDefaults::default(),
        )
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (i, name) in ["Solar Panel X", "Inverter Y", "Battery Z", "Solar Mount"]
            .iter()
            .enumerate()
        {
            let price = (i as i32 + 1) * 100;
            store
                .insert("products", doc! { "name": *name, "price": price, "__v": 0 })
                .await;
        }
        store
    }

    #[tokio::test]
    async fn count_uses_the_same_filter_as_find() {
        let store = seeded().await;
        let page = execute(&store, "products", &query("search=solar&limit=1"))
            .await
            .unwrap();
        assert_eq!(page.documents.len(), 1);
        assert_eq!(page.total, 2);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn pages_do_not_overlap() {
        let store = seeded().await;
        let first = store
            .find("products", &query("sort=price&limit=2&page=1"))
            .await
            .unwrap();
        let second = store
            .find("products", &query("sort=price&limit=2&page=2"))
            .await
            .unwrap();
        let names: Vec<&str> = first
            .iter()
            .chain(second.iter())
            .map(|d| d.get_str("name").unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["Solar Panel X", "Inverter Y", "Battery Z", "Solar Mount"]
        );
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let store = seeded().await;
        let page = execute(&store, "products", &query("page=9&limit=2"))
            .await
            .unwrap();
        assert!(page.documents.is_empty());
        assert_eq!(page.total, 4);
    }

    #[tokio::test]
    async fn unknown_collection_is_empty() {
        let store = MemoryStore::new();
        let page = execute(&store, "nothing", &query("")).await.unwrap();
        assert!(page.documents.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.pagination.total_pages, 0);
    }

    #[tokio::test]
    async fn find_by_id_matches_object_id_hex() {
        let store = seeded().await;
        let id = store
            .insert("products", doc! { "name": "Cable", "__v": 3 })
            .await;
        let hex = id.as_object_id().unwrap().to_hex();

        let found = store.find_by_id("products", &hex).await.unwrap().unwrap();
        assert_eq!(found.get_str("name").unwrap(), "Cable");
        assert!(!found.contains_key("__v"));
        assert!(store
            .find_by_id("products", "000000000000000000000000")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn seed_json_accepts_extended_json() {
        let store = MemoryStore::from_seed_json(
            r#"{
                "blogs": [
                    { "_id": "welcome", "title": "Welcome", "createdAt": { "$date": "2024-01-05T00:00:00Z" } },
                    { "title": "Second", "createdAt": { "$date": "2024-02-05T00:00:00Z" } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(store.document_count("blogs").await, 2);
        let newest = store.find("blogs", &query("limit=1")).await.unwrap();
        assert_eq!(newest[0].get_str("title").unwrap(), "Second");
        assert!(newest[0].get_object_id("_id").is_ok());

        let recent = store
            .count("blogs", &query("createdAt[gte]=2024-02-01"))
            .await
            .unwrap();
        assert_eq!(recent, 1);
        assert!(store.find_by_id("blogs", "welcome").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn bundled_seed_file_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/seed/content.json");
        let store = MemoryStore::from_seed_file(path).await.unwrap();

        assert_eq!(store.document_count("products").await, 2);
        let billing = store
            .count("faqs", &query("category=billing"))
            .await
            .unwrap();
        assert_eq!(billing, 1);
    }

    #[test]
    fn seed_rejects_non_documents() {
        assert!(MemoryStore::from_seed_json(r#"{ "blogs": [1, 2] }"#).is_err());
        assert!(MemoryStore::from_seed_json("[]").is_err());
    }
}

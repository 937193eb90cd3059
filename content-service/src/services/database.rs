use super::store::ContentStore;
use crate::models::ContentType;
use crate::query::ListQuery;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    /// Default listings sort newest first, so every collection gets a
    /// `createdAt` index.
    pub async fn initialize_indexes(&self, content_types: &[ContentType]) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for content-service");

        for content_type in content_types {
            let collection = content_type.collection();
            let created_at_index = IndexModel::builder()
                .keys(doc! { "createdAt": -1, "_id": -1 })
                .options(
                    IndexOptions::builder()
                        .name("created_at_desc".to_string())
                        .build(),
                )
                .build();

            self.collection(collection)
                .create_index(created_at_index, None)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to create createdAt index on {} collection: {}",
                        collection,
                        e
                    );
                    AppError::from(e)
                })?;
            tracing::info!("Created index on {}.createdAt", collection);
        }

        Ok(())
    }

    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// Matches either an ObjectId or a plain string `_id`.
fn id_filter(id: &str) -> Document {
    match ObjectId::parse_str(id) {
        Ok(object_id) => doc! { "$or": [{ "_id": object_id }, { "_id": id }] },
        Err(_) => doc! { "_id": id },
    }
}

#[async_trait]
impl ContentStore for MongoDb {
    async fn find(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, AppError> {
        let cursor = self
            .collection(collection)
            .find(query.filter_document(), query.find_options())
            .await
            .map_err(|e| {
                tracing::error!("Failed to query {} collection: {}", collection, e);
                AppError::from(e)
            })?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn count(&self, collection: &str, query: &ListQuery) -> Result<u64, AppError> {
        let total = self
            .collection(collection)
            .count_documents(query.filter_document(), None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count {} collection: {}", collection, e);
                AppError::from(e)
            })?;
        Ok(total)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let document = self
            .collection(collection)
            .find_one(id_filter(id), None)
            .await?;
        Ok(document)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_filter_accepts_object_ids_and_strings() {
        let hex = "65f1c2a9e4b0a1b2c3d4e5f6";
        let object_id = ObjectId::parse_str(hex).unwrap();
        assert_eq!(
            id_filter(hex),
            doc! { "$or": [{ "_id": object_id }, { "_id": hex }] }
        );
        assert_eq!(id_filter("summer-offer"), doc! { "_id": "summer-offer" });
    }
}

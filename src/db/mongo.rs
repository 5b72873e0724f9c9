//! MongoDB client and collection wrapper

use bson::{doc, oid::ObjectId, Document};
use futures_util::{Stream, TryStreamExt};
use mongodb::{
    options::{ClientOptions, FindOptions, IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use std::time::Duration;
use tracing::info;

use crate::types::HrmError;

/// Server selection and connect timeout unless the URI sets its own
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Whether opening a collection creates its schema indexes
///
/// Read-only consumers open with `Skip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPolicy {
    Apply,
    Skip,
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the server answers a ping
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, HrmError> {
        let mongo = Self::lazy(uri, db_name).await?;
        mongo.ping().await?;

        info!("Connected to MongoDB database '{}'", db_name);
        Ok(mongo)
    }

    /// Build a client without contacting the server
    pub async fn lazy(uri: &str, db_name: &str) -> Result<Self, HrmError> {
        info!("Connecting to MongoDB at {}", uri);

        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| HrmError::Database(format!("Invalid MongoDB URI: {}", e)))?;
        // Timeouts given in the URI win
        options.server_selection_timeout.get_or_insert(CONNECT_TIMEOUT);
        options.connect_timeout.get_or_insert(CONNECT_TIMEOUT);

        let client = Client::with_options(options)
            .map_err(|e| HrmError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Round-trip a ping command
    pub async fn ping(&self) -> Result<(), HrmError> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| HrmError::Database(format!("MongoDB ping failed: {}", e)))?;
        Ok(())
    }

    /// Get a typed collection with its indexes applied
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, HrmError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        self.collection_with(name, IndexPolicy::Apply).await
    }

    /// Get a typed collection, creating its indexes only under `IndexPolicy::Apply`
    pub async fn collection_with<T>(
        &self,
        name: &str,
        policy: IndexPolicy,
    ) -> Result<MongoCollection<T>, HrmError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        let collection = MongoCollection {
            inner: self.client.database(&self.db_name).collection::<T>(name),
        };
        if policy == IndexPolicy::Apply {
            collection.apply_indexes().await?;
        }
        Ok(collection)
    }

    /// Untyped collection handle, for maintenance over legacy documents
    pub fn raw_collection(&self, name: &str) -> Collection<Document> {
        self.client.database(&self.db_name).collection::<Document>(name)
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// Close pooled connections and end server sessions
    pub async fn shutdown(self) {
        info!("Closing MongoDB connection to '{}'", self.db_name);
        self.client.shutdown().await;
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
{
    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), HrmError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| HrmError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document and return its generated id
    pub async fn insert_one(&self, item: T) -> Result<ObjectId, HrmError> {
        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| HrmError::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| HrmError::Database("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, HrmError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| HrmError::Database(format!("Find failed: {}", e)))
    }

    /// Find many documents by filter
    ///
    /// A document that fails to decode fails the whole read.
    pub async fn find_many(&self, filter: Document, sort: Option<Document>) -> Result<Vec<T>, HrmError> {
        let mut options = FindOptions::default();
        options.sort = sort;

        let cursor = self
            .inner
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| HrmError::Database(format!("Find failed: {}", e)))?;

        drain(cursor, "Find failed").await
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, HrmError> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| HrmError::Database(format!("Update failed: {}", e)))
    }

    /// Hard delete one document, returning whether anything was removed
    pub async fn delete_one(&self, filter: Document) -> Result<bool, HrmError> {
        let result = self
            .inner
            .delete_one(filter)
            .await
            .map_err(|e| HrmError::Database(format!("Delete failed: {}", e)))?;
        Ok(result.deleted_count > 0)
    }

    /// Count documents matching a filter
    pub async fn count(&self, filter: Document) -> Result<u64, HrmError> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| HrmError::Database(format!("Count failed: {}", e)))
    }

    /// Run an aggregation pipeline and collect the raw result documents
    pub async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, HrmError> {
        let cursor = self
            .inner
            .aggregate(pipeline)
            .await
            .map_err(|e| HrmError::Database(format!("Aggregation failed: {}", e)))?;

        drain(cursor, "Aggregation failed").await
    }

    /// Get the underlying collection for advanced operations
    pub fn inner(&self) -> &Collection<T> {
        &self.inner
    }
}


/// Collect every item of a cursor, failing on the first read error
async fn drain<S, T, E>(cursor: S, context: &str) -> Result<Vec<T>, HrmError>
where
    S: Stream<Item = std::result::Result<T, E>>,
    E: Display,
{
    cursor
        .map_err(|e| HrmError::Database(format!("{}: {}", context, e)))
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use hyper::StatusCode;

    #[tokio::test]
    async fn test_lazy_client_accepts_bare_host_uri() {
        let client = MongoClient::lazy("mongodb://localhost:27017", "hrm_test").await.unwrap();
        assert_eq!(client.db_name(), "hrm_test");
        assert!(MongoClient::lazy("localhost:27017", "hrm_test").await.is_err());
    }

    #[tokio::test]
    async fn test_drain_collects_in_order() {
        let items = stream::iter(vec![Ok::<_, String>(1), Ok(2), Ok(3)]);
        assert_eq!(drain(items, "Find failed").await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_drain_surfaces_mid_cursor_error() {
        let items = stream::iter(vec![
            Ok(1),
            Err("invalid type: string, expected DateTime".to_string()),
            Ok(3),
        ]);
        let err = drain(items, "Find failed").await.unwrap_err();
        assert!(matches!(err, HrmError::Database(ref msg) if msg.starts_with("Find failed: invalid type")));

        let (status, body) = err.into_status_code_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("DateTime"));
    }
}

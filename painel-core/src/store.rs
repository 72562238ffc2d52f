//! Document store abstraction
//!
//! Collections are addressed by slash-separated paths (`companies/{id}/projects`)
//! and hold JSON documents keyed by a string id. Callers depend only on three
//! capabilities: an atomic multi-document write, reading a whole collection and
//! an equality query with ascending ordering.
//!
//! Backends:
//! - **PostgreSQL**: `crate::db::PgDocumentStore`, one JSONB row per document
//! - **Memory**: `MemoryDocumentStore`, process-local, used for local runs and tests

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Addressing
// ============================================================================

/// Slash-separated collection path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// `companies`
    pub fn companies() -> Self {
        Self::new("companies")
    }

    /// `companies/{company_id}/{kind}`
    pub fn company(company_id: &str, kind: &str) -> Self {
        Self(format!("companies/{}/{}", company_id, kind))
    }

    /// `users/{uid}/companies`
    pub fn user_companies(uid: &str) -> Self {
        Self(format!("users/{}/companies", uid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// A single set-operation inside a batch. Writing an existing id replaces it.
#[derive(Debug, Clone)]
pub struct DocumentWrite {
    pub collection: CollectionPath,
    pub id: String,
    pub data: Value,
}

impl DocumentWrite {
    /// Write with a freshly generated id.
    pub fn new(collection: CollectionPath, data: Value) -> Self {
        Self::with_id(collection, uuid::Uuid::new_v4().simple().to_string(), data)
    }

    pub fn with_id(collection: CollectionPath, id: impl Into<String>, data: Value) -> Self {
        Self {
            collection,
            id: id.into(),
            data,
        }
    }
}

/// Equality filter on a top-level field plus an optional ascending sort.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Option<(String, Value)>,
    pub order_by: Option<String>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }
}

// ============================================================================
// DocumentStore trait
// ============================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Commit every write or none of them.
    async fn write_batch(&self, writes: Vec<DocumentWrite>) -> Result<(), StoreError>;

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError>;

    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError>;

    /// Check the backend is reachable; returns a short description on success.
    async fn health(&self) -> Result<String, StoreError> {
        Ok(self.name().to_string())
    }

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// MemoryDocumentStore
// ============================================================================

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<CollectionPath, Vec<Document>>>,
    commits: RwLock<usize>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches committed so far.
    pub async fn commits(&self) -> usize {
        *self.commits.read().await
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn write_batch(&self, writes: Vec<DocumentWrite>) -> Result<(), StoreError> {
        // Single write lock for the whole batch keeps it atomic for readers.
        let mut collections = self.collections.write().await;
        for write in writes {
            let docs = collections.entry(write.collection).or_default();
            match docs.iter_mut().find(|d| d.id == write.id) {
                Some(existing) => existing.data = write.data,
                None => docs.push(Document {
                    id: write.id,
                    data: write.data,
                }),
            }
        }
        *self.commits.write().await += 1;
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let mut docs = self.list(collection).await?;

        if let Some((field, value)) = &query.filter {
            docs.retain(|d| d.data.get(field) == Some(value));
        }

        if let Some(field) = &query.order_by {
            docs.sort_by(|a, b| compare_field(a.data.get(field), b.data.get(field)));
        }

        Ok(docs)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Ascending order with missing values last, like `ORDER BY ... ASC` in Postgres.
fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn projects() -> CollectionPath {
        CollectionPath::company("acme", "projects")
    }

    #[test]
    fn test_collection_paths() {
        assert_eq!(
            CollectionPath::company("acme", "employees").as_str(),
            "companies/acme/employees"
        );
        assert_eq!(CollectionPath::user_companies("u1").to_string(), "users/u1/companies");
    }

    #[tokio::test]
    async fn test_batch_is_visible_after_commit() {
        let store = MemoryDocumentStore::new();
        store
            .write_batch(vec![
                DocumentWrite::new(projects(), json!({"projectName": "A"})),
                DocumentWrite::new(projects(), json!({"projectName": "B"})),
            ])
            .await
            .unwrap();

        assert_eq!(store.list(&projects()).await.unwrap().len(), 2);
        assert_eq!(store.commits().await, 1);
    }

    #[tokio::test]
    async fn test_write_with_existing_id_replaces_document() {
        let store = MemoryDocumentStore::new();
        let col = CollectionPath::companies();
        store
            .write_batch(vec![DocumentWrite::with_id(col.clone(), "c1", json!({"name": "old"}))])
            .await
            .unwrap();
        store
            .write_batch(vec![DocumentWrite::with_id(col.clone(), "c1", json!({"name": "new"}))])
            .await
            .unwrap();

        let docs = store.list(&col).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].data["name"], "new");
    }

    #[tokio::test]
    async fn test_query_filters_and_sorts_ascending() {
        let store = MemoryDocumentStore::new();
        store
            .write_batch(vec![
                DocumentWrite::new(
                    projects(),
                    json!({"status": "active", "deliveryDate": "2025-03-01"}),
                ),
                DocumentWrite::new(
                    projects(),
                    json!({"status": "completed", "deliveryDate": "2025-01-01"}),
                ),
                DocumentWrite::new(
                    projects(),
                    json!({"status": "active", "deliveryDate": "2025-02-01"}),
                ),
                DocumentWrite::new(projects(), json!({"status": "active"})),
            ])
            .await
            .unwrap();

        let query = Query::all().where_eq("status", "active").order_by("deliveryDate");
        let docs = store.query(&projects(), &query).await.unwrap();

        let dates: Vec<Option<&str>> = docs
            .iter()
            .map(|d| d.data.get("deliveryDate").and_then(|v| v.as_str()))
            .collect();
        assert_eq!(dates, vec![Some("2025-02-01"), Some("2025-03-01"), None]);
    }

    #[tokio::test]
    async fn test_list_unknown_collection_is_empty() {
        let store = MemoryDocumentStore::new();
        assert!(store.list(&projects()).await.unwrap().is_empty());
    }
}

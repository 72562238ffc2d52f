use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::StorageConfig;
use crate::error::PainelError;
use crate::store::{
    CollectionPath, Document, DocumentStore, DocumentWrite, MemoryDocumentStore, Query, StoreError,
};

pub async fn create_pool(config: &StorageConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}

/// Create the `documents` table if it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            data JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            PRIMARY KEY (collection, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS documents_collection_idx ON documents (collection)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Build the configured document store backend.
///
/// Reads `[storage] backend` to select PostgreSQL or the in-memory store.
pub async fn create_store(config: &StorageConfig) -> Result<Arc<dyn DocumentStore>, PainelError> {
    match config.backend.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        "postgres" => {
            let pool = create_pool(config).await.map_err(StoreError::from)?;
            ensure_schema(&pool).await.map_err(StoreError::from)?;
            Ok(Arc::new(PgDocumentStore::new(pool)))
        }
        other => Err(PainelError::Other(format!(
            "unknown storage backend '{}'",
            other
        ))),
    }
}

// ============================================================================
// PgDocumentStore
// ============================================================================

/// Documents stored as JSONB rows keyed by (collection, id).
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn write_batch(&self, writes: Vec<DocumentWrite>) -> Result<(), StoreError> {
        let count = writes.len();
        let mut tx = self.pool.begin().await?;

        for write in writes {
            sqlx::query(
                r#"
                INSERT INTO documents (collection, id, data)
                VALUES ($1, $2, $3)
                ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data
                "#,
            )
            .bind(write.collection.as_str())
            .bind(&write.id)
            .bind(&write.data)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(count, "Committed document batch");
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        self.query(collection, &Query::all()).await
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let mut sql = String::from("SELECT id, data FROM documents WHERE collection = $1");
        let mut param = 2;

        if query.filter.is_some() {
            sql.push_str(&format!(
                " AND data -> ${}::text = ${}::jsonb",
                param,
                param + 1
            ));
            param += 2;
        }

        match query.order_by {
            Some(_) => sql.push_str(&format!(" ORDER BY data -> ${}::text ASC", param)),
            None => sql.push_str(" ORDER BY created_at, id"),
        }

        let mut q = sqlx::query_as::<_, (String, Value)>(&sql).bind(collection.as_str());
        if let Some((field, value)) = &query.filter {
            q = q.bind(field).bind(value);
        }
        if let Some(field) = &query.order_by {
            q = q.bind(field);
        }

        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(id, data)| Document { id, data })
            .collect())
    }

    async fn health(&self) -> Result<String, StoreError> {
        Ok(health_check(&self.pool).await?)
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

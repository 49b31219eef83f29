//! services/api/src/adapters/pg_store.rs
//!
//! The Postgres implementation of the `DocumentStore` port. Documents are kept
//! as JSONB rows in a single `documents` table keyed by their full path; a
//! commit runs inside one database transaction.

use crate::adapters::memory_store::apply_write;
use async_trait::async_trait;
use recipe_social_core::ports::{
    CollectionPath, Direction, DocPath, DocumentStore, PortError, PortResult, Query,
    StoredDocument, Write,
};
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use std::collections::BTreeMap;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[derive(FromRow)]
struct DocumentRecord {
    doc_id: String,
    data: Json<Value>,
}

impl DocumentRecord {
    fn to_domain(self) -> StoredDocument {
        StoredDocument {
            id: self.doc_id,
            data: self.data.0,
        }
    }
}

fn store_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict("document already exists".to_string())
        }
        _ => PortError::Store(e.to_string()),
    }
}

/// Staged state of one document inside a commit.
struct Staged {
    existed: bool,
    state: Option<Value>,
}

async fn load_for_update(conn: &mut PgConnection, path: &DocPath) -> PortResult<Option<Value>> {
    let row: Option<(Json<Value>,)> =
        sqlx::query_as("SELECT data FROM documents WHERE path = $1 FOR UPDATE")
            .bind(path.to_string())
            .fetch_optional(&mut *conn)
            .await
            .map_err(store_error)?;
    Ok(row.map(|(data,)| data.0))
}

async fn persist(conn: &mut PgConnection, path: &DocPath, staged: Staged) -> PortResult<()> {
    match (staged.existed, staged.state) {
        // A plain INSERT: a row created concurrently surfaces as a unique violation.
        (false, Some(data)) => {
            sqlx::query(
                "INSERT INTO documents (path, parent, doc_id, data) VALUES ($1, $2, $3, $4)",
            )
            .bind(path.to_string())
            .bind(path.parent().as_str())
            .bind(path.id())
            .bind(Json(data))
            .execute(&mut *conn)
            .await
            .map_err(store_error)?;
        }
        (true, Some(data)) => {
            sqlx::query("UPDATE documents SET data = $2, updated_at = now() WHERE path = $1")
                .bind(path.to_string())
                .bind(Json(data))
                .execute(&mut *conn)
                .await
                .map_err(store_error)?;
        }
        (true, None) => {
            sqlx::query("DELETE FROM documents WHERE path = $1")
                .bind(path.to_string())
                .execute(&mut *conn)
                .await
                .map_err(store_error)?;
        }
        (false, None) => {}
    }
    Ok(())
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, path: &DocPath) -> PortResult<Option<Value>> {
        let row: Option<(Json<Value>,)> =
            sqlx::query_as("SELECT data FROM documents WHERE path = $1")
                .bind(path.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;
        Ok(row.map(|(data,)| data.0))
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> PortResult<Vec<StoredDocument>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT doc_id, data FROM documents WHERE parent = ");
        builder.push_bind(collection.as_str().to_string());
        for filter in &query.filters {
            builder.push(" AND data -> ");
            builder.push_bind(filter.field.clone());
            builder.push(" = ");
            builder.push_bind(Json(filter.value.clone()));
        }
        match &query.order_by {
            Some((field, direction)) => {
                builder.push(" ORDER BY data -> ");
                builder.push_bind(field.clone());
                builder.push(match direction {
                    Direction::Ascending => " ASC NULLS FIRST",
                    Direction::Descending => " DESC NULLS LAST",
                });
                builder.push(", doc_id ASC");
            }
            None => {
                builder.push(" ORDER BY doc_id ASC");
            }
        }
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }

        let records = builder
            .build_query_as::<DocumentRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count(&self, collection: &CollectionPath) -> PortResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE parent = $1")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(count.max(0) as u64)
    }

    async fn commit(&self, writes: Vec<Write>) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let mut staged: BTreeMap<DocPath, Staged> = BTreeMap::new();
        for write in writes {
            let path = write.path().clone();
            let current = match staged.get(&path) {
                Some(entry) => entry.state.clone(),
                None => {
                    let loaded = load_for_update(&mut *tx, &path).await?;
                    staged.insert(
                        path.clone(),
                        Staged {
                            existed: loaded.is_some(),
                            state: loaded.clone(),
                        },
                    );
                    loaded
                }
            };
            let next = apply_write(write, current)?;
            if let Some(entry) = staged.get_mut(&path) {
                entry.state = next;
            }
        }

        for (path, entry) in staged {
            persist(&mut *tx, &path, entry).await?;
        }
        tx.commit().await.map_err(store_error)?;
        Ok(())
    }
}

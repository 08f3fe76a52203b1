//! `SQLite` backend.
//!
//! One `documents` table holds every collection. Rows are keyed by the
//! collection path and the document id, and the body is stored as JSON text.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};

use crate::document::{auto_id, Document, Fields, ListQuery};
use crate::error::{StoreError, StoreResult};
use crate::path::{CollectionPath, DocPath};
use crate::{shallow_merge, DocumentStore};

/// SQLite-backed document store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to a `SQLite` database, creating the file if needed.
    pub async fn connect(dsn: &str) -> StoreResult<Self> {
        let url = if dsn.starts_with("sqlite:") {
            dsn.to_string()
        } else {
            format!("sqlite:{dsn}")
        };

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| StoreError::Backend(format!("Invalid DSN '{dsn}': {e}")))?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own copy unless
        // the pool keeps exactly one connection alive.
        let in_memory = url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to connect: {e}")))?;

        tracing::debug!(dsn = %dsn, "Connected to SQLite document store");
        Ok(Self { pool })
    }

    /// Create the schema.
    pub async fn migrate(&self) -> StoreResult<()> {
        let stmts = [
            r"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)",
        ];

        for stmt in stmts {
            sqlx::query(stmt).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Shallow-merge `data` into the stored document under `BEGIN IMMEDIATE`,
    /// so concurrent merges into one document serialize on the write lock.
    async fn merge_locked(
        &self,
        path: &DocPath,
        data: Fields,
        upsert: bool,
    ) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result = merge_in(&mut conn, path, data, upsert).await;
        let finish = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };
        if let Err(e) = sqlx::query(finish).execute(&mut *conn).await {
            tracing::warn!(path = %path, error = %e, "Failed to end merge transaction");
            // Never hand a connection with an open transaction back to the pool.
            drop(conn.detach());
            return result.and(Err(e.into()));
        }
        result
    }
}

async fn fetch<'e, E>(executor: E, path: &DocPath) -> StoreResult<Option<Fields>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<(String,)> =
        sqlx::query_as("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(path.collection().key())
            .bind(path.id())
            .fetch_optional(executor)
            .await?;

    row.map(|(data,)| decode(&data)).transpose()
}

async fn write<'e, E>(executor: E, path: &DocPath, data: &Fields) -> StoreResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r"
        INSERT INTO documents (collection, id, data)
        VALUES (?, ?, ?)
        ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data
        ",
    )
    .bind(path.collection().key())
    .bind(path.id())
    .bind(serde_json::to_string(data)?)
    .execute(executor)
    .await?;
    Ok(())
}

async fn merge_in(
    conn: &mut SqliteConnection,
    path: &DocPath,
    data: Fields,
    upsert: bool,
) -> StoreResult<()> {
    let mut existing = match fetch(&mut *conn, path).await? {
        Some(existing) => existing,
        None if upsert => Fields::new(),
        None => return Err(StoreError::NotFound(path.to_string())),
    };
    shallow_merge(&mut existing, data);
    write(&mut *conn, path, &existing).await
}

fn decode(data: &str) -> StoreResult<Fields> {
    Ok(serde_json::from_str(data)?)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        Ok(fetch(&self.pool, path)
            .await?
            .map(|data| Document::new(path.id().to_string(), data)))
    }

    async fn list(
        &self,
        collection: &CollectionPath,
        query: &ListQuery,
    ) -> StoreResult<Vec<Document>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, data FROM documents WHERE collection = ? ORDER BY id")
                .bind(collection.key())
                .fetch_all(&self.pool)
                .await?;

        let docs = rows
            .into_iter()
            .map(|(id, data)| Ok(Document::new(id, decode(&data)?)))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(query.apply(docs))
    }

    async fn add(&self, collection: &CollectionPath, data: Fields) -> StoreResult<DocPath> {
        let path = collection.doc(&auto_id())?;
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES (?, ?, ?)")
            .bind(collection.key())
            .bind(path.id())
            .bind(serde_json::to_string(&data)?)
            .execute(&self.pool)
            .await?;
        Ok(path)
    }

    async fn create(&self, path: &DocPath, data: Fields) -> StoreResult<()> {
        write(&self.pool, path, &data).await
    }

    async fn update(&self, path: &DocPath, data: Fields) -> StoreResult<()> {
        self.merge_locked(path, data, false).await
    }

    async fn merge(&self, path: &DocPath, data: Fields) -> StoreResult<()> {
        self.merge_locked(path, data, true).await
    }

    async fn delete(&self, path: &DocPath) -> StoreResult<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(path.collection().key())
            .bind(path.id())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count(&self, collection: &CollectionPath) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection.key())
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

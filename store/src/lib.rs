//! Sthana document store.
//!
//! Temple records, user profiles and media asset records live in nested
//! collections of schemaless JSON documents. [`DocumentStore`] is the seam
//! between the HTTP layer and a backend; [`connect`] picks the backend from a
//! DSN.

pub mod document;
pub mod error;
pub mod memory;
pub mod path;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

pub use document::{auto_id, compare_values, Direction, Document, Fields, ListQuery, OrderBy};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use path::{CollectionPath, DocPath};
pub use sqlite::SqliteStore;

/// Operations every document backend provides.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>>;

    /// Documents directly inside `collection`, id-ordered unless `query` says otherwise.
    async fn list(&self, collection: &CollectionPath, query: &ListQuery)
        -> StoreResult<Vec<Document>>;

    /// Insert under a generated id.
    async fn add(&self, collection: &CollectionPath, data: Fields) -> StoreResult<DocPath>;

    /// Write `data` at `path`, replacing any existing document.
    async fn create(&self, path: &DocPath, data: Fields) -> StoreResult<()>;

    /// Shallow-merge `data` into an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] when the document does not exist.
    async fn update(&self, path: &DocPath, data: Fields) -> StoreResult<()>;

    /// Shallow-merge `data`, creating the document when absent.
    async fn merge(&self, path: &DocPath, data: Fields) -> StoreResult<()>;

    /// Remove a document. Deleting a missing document succeeds; subcollections are kept.
    async fn delete(&self, path: &DocPath) -> StoreResult<()>;

    async fn count(&self, collection: &CollectionPath) -> StoreResult<u64>;
}

/// Open a store from a DSN: `memory` or `sqlite:<file>` / `sqlite::memory:`.
pub async fn connect(dsn: &str) -> StoreResult<Arc<dyn DocumentStore>> {
    if dsn == "memory" || dsn == "mem" {
        return Ok(Arc::new(MemoryStore::new()));
    }

    if dsn.starts_with("sqlite:") {
        let store = SqliteStore::connect(dsn).await?;
        store.migrate().await?;
        return Ok(Arc::new(store));
    }

    Err(StoreError::UnsupportedDsn(dsn.to_string()))
}

pub(crate) fn shallow_merge(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_picks_backend() {
        assert_eq!(connect("memory").await.unwrap().backend(), "memory");
        assert_eq!(connect("sqlite::memory:").await.unwrap().backend(), "sqlite");
        assert!(matches!(
            connect("postgres://localhost/sthana").await,
            Err(StoreError::UnsupportedDsn(_))
        ));
    }
}

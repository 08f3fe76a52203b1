//! In-memory backend.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::document::{auto_id, Document, Fields, ListQuery};
use crate::error::{StoreError, StoreResult};
use crate::path::{CollectionPath, DocPath};
use crate::{shallow_merge, DocumentStore};

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

/// Documents held in process memory, keyed by collection path then id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        let collections = self.read()?;
        Ok(collections
            .get(&path.collection().key())
            .and_then(|docs| docs.get(path.id()))
            .map(|data| Document::new(path.id().to_string(), data.clone())))
    }

    async fn list(
        &self,
        collection: &CollectionPath,
        query: &ListQuery,
    ) -> StoreResult<Vec<Document>> {
        let docs: Vec<Document> = {
            let collections = self.read()?;
            collections
                .get(&collection.key())
                .map(|docs| {
                    docs.iter()
                        .map(|(id, data)| Document::new(id.clone(), data.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };
        Ok(query.apply(docs))
    }

    async fn add(&self, collection: &CollectionPath, data: Fields) -> StoreResult<DocPath> {
        let mut collections = self.write()?;
        let docs = collections.entry(collection.key()).or_default();
        let mut id = auto_id();
        while docs.contains_key(&id) {
            id = auto_id();
        }
        docs.insert(id.clone(), data);
        collection.doc(&id)
    }

    async fn create(&self, path: &DocPath, data: Fields) -> StoreResult<()> {
        let mut collections = self.write()?;
        collections
            .entry(path.collection().key())
            .or_default()
            .insert(path.id().to_string(), data);
        Ok(())
    }

    async fn update(&self, path: &DocPath, data: Fields) -> StoreResult<()> {
        let mut collections = self.write()?;
        let existing = collections
            .get_mut(&path.collection().key())
            .and_then(|docs| docs.get_mut(path.id()))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        shallow_merge(existing, data);
        Ok(())
    }

    async fn merge(&self, path: &DocPath, data: Fields) -> StoreResult<()> {
        let mut collections = self.write()?;
        let existing = collections
            .entry(path.collection().key())
            .or_default()
            .entry(path.id().to_string())
            .or_default();
        shallow_merge(existing, data);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> StoreResult<()> {
        let mut collections = self.write()?;
        let key = path.collection().key();
        if let Some(docs) = collections.get_mut(&key) {
            docs.remove(path.id());
            if docs.is_empty() {
                collections.remove(&key);
            }
        }
        Ok(())
    }

    async fn count(&self, collection: &CollectionPath) -> StoreResult<u64> {
        let collections = self.read()?;
        Ok(collections
            .get(&collection.key())
            .map_or(0, |docs| docs.len() as u64))
    }
}

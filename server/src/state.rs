use std::sync::Arc;

use sthana_config::{CollectionsConfig, SthanaConfig};
use sthana_store::{CollectionPath, DocumentStore, StoreResult};

use crate::auth::TokenVerifier;

/// Names of the top-level collections, validated once at startup.
#[derive(Debug, Clone)]
pub struct Collections {
    pub temples: CollectionPath,
    pub users: CollectionPath,
    /// Media subcollection name under each temple.
    pub media: String,
}

impl Collections {
    pub fn from_config(config: &CollectionsConfig) -> StoreResult<Self> {
        // Validates the segment even though only the name is kept.
        CollectionPath::root(&config.media)?;
        Ok(Self {
            temples: CollectionPath::root(&config.temples)?,
            users: CollectionPath::root(&config.users)?,
            media: config.media.clone(),
        })
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<TokenVerifier>,
    pub collections: Arc<Collections>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, verifier: TokenVerifier, collections: Collections) -> Self {
        Self {
            store,
            verifier: Arc::new(verifier),
            collections: Arc::new(collections),
        }
    }

    /// Build state from a loaded configuration and an opened store.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: &SthanaConfig) -> StoreResult<Self> {
        Ok(Self::new(
            store,
            TokenVerifier::from_config(&config.auth),
            Collections::from_config(&config.collections)?,
        ))
    }
}

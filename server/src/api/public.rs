//! Public, unauthenticated browsing of the directory.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use sthana_store::{Document, ListQuery, OrderBy};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub limit: Option<usize>,
    /// Case-insensitive substring match on `name`.
    pub q: Option<String>,
}

impl BrowseQuery {
    fn page_size(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

fn name_matches(doc: &Document, needle: &str) -> bool {
    doc.get_str("name")
        .is_some_and(|name| name.to_lowercase().contains(needle))
}

/// Newest temples first.
pub async fn list_temples(
    State(state): State<AppState>,
    query: Result<Query<BrowseQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Document>>> {
    let Query(query) = query?;
    let newest_first = ListQuery::all().order_by(OrderBy::desc("createdAt"));
    let mut temples = state
        .store
        .list(&state.collections.temples, &newest_first)
        .await?;

    if let Some(needle) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let needle = needle.to_lowercase();
        temples.retain(|doc| name_matches(doc, &needle));
    }
    temples.truncate(query.page_size());

    Ok(Json(temples))
}

pub async fn get_temple(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Document>> {
    let path = state.collections.temples.doc(&id)?;
    let temple = state
        .store
        .get(&path)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Temple '{id}' not found")))?;
    Ok(Json(temple))
}

/// Media asset records attached to a temple.
pub async fn list_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    let temple = state.collections.temples.doc(&id)?;
    if state.store.get(&temple).await?.is_none() {
        return Err(ApiError::not_found(format!("Temple '{id}' not found")));
    }
    let media = temple.subcollection(&state.collections.media)?;
    Ok(Json(state.store.list(&media, &ListQuery::all()).await?))
}

//! Dashboard numbers for the admin console.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use sthana_store::{Document, ListQuery, OrderBy};

use crate::error::ApiResult;
use crate::state::AppState;

pub const RECENT_TEMPLES_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: u64,
    pub recent_temples: Vec<RecentTemple>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTemple {
    pub id: String,
    pub name: Option<String>,
    pub location: Option<Value>,
    pub created_at: Option<Value>,
}

impl From<Document> for RecentTemple {
    fn from(mut doc: Document) -> Self {
        Self {
            name: doc.get_str("name").map(str::to_string),
            location: doc.data.remove("location"),
            created_at: doc.data.remove("createdAt"),
            id: doc.id,
        }
    }
}

/// User count plus the newest temples.
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let recent = ListQuery::all()
        .order_by(OrderBy::desc("createdAt"))
        .limit(RECENT_TEMPLES_LIMIT);

    let (total_users, temples) = tokio::try_join!(
        state.store.count(&state.collections.users),
        state.store.list(&state.collections.temples, &recent),
    )?;

    Ok(Json(StatsResponse {
        total_users,
        recent_temples: temples.into_iter().map(Into::into).collect(),
    }))
}

//! HTTP routes.

mod data;
mod public;
mod stats;
mod users;

use axum::{
    middleware,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::auth::{self, AdminContext};
use crate::state::AppState;

pub use data::{DataQuery, Target};
pub use stats::{RecentTemple, StatsResponse, RECENT_TEMPLES_LIMIT};

/// Admin routes, mounted under `/api/admin` behind the admin gate.
pub fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/verify", get(verify))
        .route(
            "/data",
            get(data::get).post(data::post).put(data::put).delete(data::delete),
        )
        .route("/stats", get(stats::stats))
        .route("/users/{uid}/role", put(users::set_role))
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin))
}

/// Read-only routes for the public directory.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/temples", get(public::list_temples))
        .route("/api/temples/{id}", get(public::get_temple))
        .route("/api/temples/{id}/media", get(public::list_media))
}

/// The whole API without transport layers (tracing, CORS, timeouts).
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/admin", admin_router(state.clone()))
        .merge(public_router())
        .route("/health", get(health))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Echo the admin identity; the console's route guard calls this.
async fn verify(Extension(ctx): Extension<AdminContext>) -> Json<Value> {
    Json(json!({
        "uid": ctx.uid,
        "email": ctx.email,
        "admin": true,
    }))
}

/// Server timestamp in RFC 3339 UTC with millisecond precision.
///
/// The fixed width keeps lexicographic and chronological order identical.
pub(crate) fn timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

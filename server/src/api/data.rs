//! Generic document proxy.
//!
//! One endpoint, `/api/admin/data`, addresses any collection or document up to
//! one subcollection deep through its query string and dispatches on the verb.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sthana_store::{CollectionPath, DocPath, Direction, Fields, ListQuery, OrderBy};

use super::timestamp;
use crate::auth::AdminContext;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    pub collection: Option<String>,
    pub id: Option<String>,
    pub subcollection: Option<String>,
    pub sub_id: Option<String>,
    pub order_by: Option<String>,
    pub direction: Option<String>,
    pub limit: Option<usize>,
}

/// What a [`DataQuery`] addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Collection(CollectionPath),
    Document(DocPath),
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

impl DataQuery {
    /// Resolve `collection/id/subcollection/subId` into a store path.
    pub fn target(&self) -> ApiResult<Target> {
        let collection = present(self.collection.as_ref())
            .ok_or_else(|| ApiError::bad_request("Missing 'collection' parameter"))?;
        let id = present(self.id.as_ref());
        let subcollection = present(self.subcollection.as_ref());
        let sub_id = present(self.sub_id.as_ref());

        let root = CollectionPath::root(collection)?;
        let target = match (id, subcollection, sub_id) {
            (None, None, None) => Target::Collection(root),
            (Some(id), None, None) => Target::Document(root.doc(id)?),
            (Some(id), Some(sub), None) => Target::Collection(root.doc(id)?.subcollection(sub)?),
            (Some(id), Some(sub), Some(sub_id)) => {
                Target::Document(root.doc(id)?.subcollection(sub)?.doc(sub_id)?)
            }
            (None, Some(_), _) => {
                return Err(ApiError::bad_request("'subcollection' requires 'id'"));
            }
            (_, None, Some(_)) => {
                return Err(ApiError::bad_request("'subId' requires 'subcollection'"));
            }
        };
        Ok(target)
    }

    fn list_query(&self) -> ApiResult<ListQuery> {
        let mut query = ListQuery::all();
        if let Some(field) = present(self.order_by.as_ref()) {
            let direction = match present(self.direction.as_ref()) {
                None | Some("asc") => Direction::Asc,
                Some("desc") => Direction::Desc,
                Some(other) => {
                    return Err(ApiError::bad_request(format!(
                        "Invalid direction '{other}', expected 'asc' or 'desc'"
                    )));
                }
            };
            query = query.order_by(OrderBy {
                field: field.to_string(),
                direction,
            });
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }
}

fn into_fields(body: Value) -> ApiResult<Fields> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::bad_request("Request body must be a JSON object")),
    }
}

/// GET: list a collection or read one document.
pub async fn get(
    State(state): State<AppState>,
    query: Result<Query<DataQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    match query.target()? {
        Target::Collection(collection) => {
            let docs = state.store.list(&collection, &query.list_query()?).await?;
            Ok(Json(docs).into_response())
        }
        Target::Document(path) => {
            let doc = state
                .store
                .get(&path)
                .await?
                .ok_or_else(|| ApiError::not_found("Document not found"))?;
            Ok(Json(doc).into_response())
        }
    }
}

/// POST: add to a collection under a generated id, or write at a given id.
pub async fn post(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    query: Result<Query<DataQuery>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let (Query(query), Json(body)) = (query?, body?);
    let target = query.target()?;
    let mut data = into_fields(body)?;
    let now = timestamp();
    data.insert("createdAt".into(), now.clone());
    data.insert("updatedAt".into(), now);

    let path = match target {
        Target::Collection(collection) => state.store.add(&collection, data).await?,
        Target::Document(path) => {
            state.store.create(&path, data).await?;
            path
        }
    };

    tracing::info!(uid = %ctx.uid, path = %path, "Document created");
    Ok((StatusCode::CREATED, Json(json!({ "id": path.id() }))))
}

/// PUT: shallow-merge into an existing document.
pub async fn put(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    query: Result<Query<DataQuery>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let (Query(query), Json(body)) = (query?, body?);
    let Target::Document(path) = query.target()? else {
        return Err(ApiError::bad_request("PUT requires a document id"));
    };
    let mut data = into_fields(body)?;
    data.insert("updatedAt".into(), timestamp());

    state.store.update(&path, data).await?;

    tracing::info!(uid = %ctx.uid, path = %path, "Document updated");
    Ok(Json(json!({ "success": true })))
}

/// DELETE: remove one document.
pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    query: Result<Query<DataQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let Target::Document(path) = query.target()? else {
        return Err(ApiError::bad_request("DELETE requires a document id"));
    };

    state.store.delete(&path).await?;

    tracing::info!(uid = %ctx.uid, path = %path, "Document deleted");
    Ok(Json(json!({ "success": true })))
}

//! User role management.

use std::fmt;
use std::str::FromStr;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sthana_store::Fields;

use super::timestamp;
use crate::auth::AdminContext;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Editor,
    User,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "user" => Ok(Self::User),
            other => Err(ApiError::bad_request(format!(
                "Unknown role '{other}', expected admin, editor or user"
            ))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct SetRoleResponse {
    pub uid: String,
    pub role: String,
}

/// Record a user's role on their profile document.
pub async fn set_role(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Path(uid): Path<String>,
    req: Result<Json<SetRoleRequest>, JsonRejection>,
) -> ApiResult<Json<SetRoleResponse>> {
    let Json(req) = req?;
    let role: Role = req.role.parse()?;
    let path = state.collections.users.doc(&uid)?;

    let mut patch = Fields::new();
    patch.insert("role".into(), Value::String(role.to_string()));
    patch.insert("updatedAt".into(), timestamp());
    state.store.merge(&path, patch).await?;

    tracing::info!(by = %ctx.uid, uid = %uid, role = %role, "User role updated");
    Ok(Json(SetRoleResponse {
        uid,
        role: role.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles() {
        for role in [Role::Admin, Role::Editor, Role::User] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }
}

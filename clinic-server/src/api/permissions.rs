use crate::auth::AuthContext;
use crate::errors::ApiError;
use crate::openapi::PERMISSIONS_TAG;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/permissions", get(list_permissions))
        .route(
            "/api/v1/permissions/{role_name}",
            get(list_permissions_by_role),
        )
}

/// A named permission on a protected resource
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub(crate) struct PermissionItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A protected resource and the permissions registered on it
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AppPermission {
    pub resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_display_name: Option<String>,
    pub permissions: Vec<PermissionItem>,
}

#[utoipa::path(
    get,
    path = "/api/v1/permissions",
    tag = PERMISSIONS_TAG,
    responses(
        (status = 200, description = "All resources with their permissions", body = Vec<AppPermission>),
        (status = 403, description = "Missing permission:read permission")
    )
)]
async fn list_permissions(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<Vec<AppPermission>>, ApiError> {
    ctx.require("PERMISSION_permission:read")?;

    let resources = state.admin.list_resources().await?;
    let mut result = Vec::with_capacity(resources.len());
    for resource in resources {
        let permissions = state.admin.resource_permissions(&resource.id).await?;
        result.push(AppPermission {
            resource_name: resource.name,
            resource_display_name: resource.display_name,
            permissions: permissions
                .into_iter()
                .map(|policy| PermissionItem {
                    name: policy.name,
                    description: policy.description,
                })
                .collect(),
        });
    }
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/permissions/{role_name}",
    tag = PERMISSIONS_TAG,
    responses(
        (status = 200, description = "Permission names granted through the role", body = Vec<String>),
        (status = 403, description = "Missing permission:read permission"),
        (status = 404, description = "Unknown role")
    )
)]
async fn list_permissions_by_role(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(role_name): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    ctx.require("PERMISSION_permission:read")?;

    let permissions = state.admin.permissions_by_role(&role_name).await?;
    Ok(Json(permissions))
}

use crate::api::permissions::PermissionItem;
use crate::auth::AuthContext;
use crate::errors::ApiError;
use crate::models::{Page, PageParams};
use crate::openapi::ROLES_TAG;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use http::StatusCode;
use keycloak_client::admin::RoleRepresentation;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/roles", get(list_roles).post(create_role))
        .route(
            "/api/v1/roles/{role_name}/permissions",
            put(assign_permissions),
        )
}

/// A realm role, as exposed by this API
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub(crate) struct KcRole {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

impl From<RoleRepresentation> for KcRole {
    fn from(role: RoleRepresentation) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
        }
    }
}

/// Payload for creating a role
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub(crate) struct KcRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Payload for assigning scope permissions to a role
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub(crate) struct AssignPermissionsRequest {
    pub permissions: Vec<PermissionItem>,
}

#[utoipa::path(
    get,
    path = "/api/v1/roles",
    tag = ROLES_TAG,
    params(PageParams),
    responses(
        (status = 200, description = "One page of realm roles", body = Page<KcRole>),
        (status = 403, description = "Missing app_role:read permission")
    )
)]
async fn list_roles(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<KcRole>>, ApiError> {
    ctx.require("PERMISSION_app_role:read")?;

    let roles = state.admin.list_roles(params.offset(), params.size).await?;
    let total = state.admin.count_roles().await?;
    Ok(Json(Page {
        items: roles.into_iter().map(KcRole::from).collect(),
        page: params.page,
        size: params.size,
        total,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/roles",
    tag = ROLES_TAG,
    request_body = KcRoleRequest,
    responses(
        (status = 201, description = "Role and its backing policy created", body = KcRole),
        (status = 403, description = "Missing app_role:create permission")
    )
)]
async fn create_role(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(request): Json<KcRoleRequest>,
) -> Result<(StatusCode, Json<KcRole>), ApiError> {
    ctx.require("PERMISSION_app_role:create")?;

    let created = state
        .admin
        .create_role(&request.name, request.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(KcRole::from(created))))
}

#[utoipa::path(
    put,
    path = "/api/v1/roles/{role_name}/permissions",
    tag = ROLES_TAG,
    request_body = AssignPermissionsRequest,
    responses(
        (status = 200, description = "Permissions assigned to the role"),
        (status = 403, description = "Missing permission:assign permission"),
        (status = 404, description = "Unknown role or permission")
    )
)]
async fn assign_permissions(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(role_name): Path<String>,
    Json(request): Json<AssignPermissionsRequest>,
) -> Result<StatusCode, ApiError> {
    ctx.require("PERMISSION_permission:assign")?;

    let names: Vec<String> = request
        .permissions
        .into_iter()
        .map(|permission| permission.name)
        .collect();
    state
        .admin
        .assign_permissions_to_role(&role_name, &names)
        .await?;
    Ok(StatusCode::OK)
}

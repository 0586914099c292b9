use crate::auth::AuthContext;
use crate::errors::ApiError;
use crate::models::{Page, PageParams};
use crate::openapi::USERS_TAG;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use http::StatusCode;
use keycloak_client::admin::{NewUser, UserRepresentation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/users", get(list_users).post(create_user))
        .route("/api/v1/users/me", get(get_me))
        .route("/api/v1/users/{id}", put(update_user).delete(delete_user))
}

/// A realm user account, as exposed by this API
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub(crate) struct KcUser {
    pub id: Option<String>,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
}

impl From<UserRepresentation> for KcUser {
    fn from(user: UserRepresentation) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            enabled: user.enabled,
        }
    }
}

/// Payload for creating or updating a user account
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub(crate) struct KcUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

/// A resolved permission from the caller's RPT
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub(crate) struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsid: Option<String>,
    pub rsname: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// The caller's identity and permissions, read from the RPT claims
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UserInfos {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub permissions: Vec<Permission>,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = USERS_TAG,
    params(PageParams),
    responses(
        (status = 200, description = "One page of realm users", body = Page<KcUser>),
        (status = 403, description = "Missing account:read permission"),
        (status = 502, description = "Identity provider unavailable")
    )
)]
async fn list_users(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<KcUser>>, ApiError> {
    ctx.require("PERMISSION_account:read")?;

    let users = state.admin.list_users(params.offset(), params.size).await?;
    let total = state.admin.count_users().await?;
    Ok(Json(Page {
        items: users.into_iter().map(KcUser::from).collect(),
        page: params.page,
        size: params.size,
        total,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = USERS_TAG,
    request_body = KcUserRequest,
    responses(
        (status = 201, description = "User created", body = KcUser),
        (status = 403, description = "Missing account:create permission")
    )
)]
async fn create_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(request): Json<KcUserRequest>,
) -> Result<(StatusCode, Json<KcUser>), ApiError> {
    ctx.require("PERMISSION_account:create")?;

    let created = state
        .admin
        .create_user(&NewUser {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            password: request.password,
            role: request.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(KcUser::from(created))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = USERS_TAG,
    request_body = KcUserRequest,
    responses(
        (status = 200, description = "User updated", body = bool),
        (status = 403, description = "Missing account:update permission")
    )
)]
async fn update_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(request): Json<KcUserRequest>,
) -> Result<Json<bool>, ApiError> {
    ctx.require("PERMISSION_account:update")?;

    state
        .admin
        .update_user(&id, &request.first_name, &request.last_name, &request.email)
        .await?;
    Ok(Json(true))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = USERS_TAG,
    responses(
        (status = 200, description = "User deleted", body = bool),
        (status = 403, description = "Missing account:delete permission"),
        (status = 404, description = "Unknown username")
    )
)]
async fn delete_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<bool>, ApiError> {
    ctx.require("PERMISSION_account:delete")?;

    // The route takes the username; the admin API resolves it to an id.
    state.admin.delete_user(&id).await?;
    Ok(Json(true))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = USERS_TAG,
    responses(
        (status = 200, description = "The caller's identity and permissions", body = UserInfos),
        (status = 401, description = "Not authenticated")
    )
)]
async fn get_me(ctx: AuthContext) -> Json<UserInfos> {
    let permissions = ctx
        .claims()
        .get("authorization")
        .and_then(|authorization| authorization.get("permissions"))
        .cloned()
        .and_then(|permissions| serde_json::from_value(permissions).ok())
        .unwrap_or_default();

    Json(UserInfos {
        username: ctx.username().map(str::to_string),
        first_name: ctx.claim_str("given_name").map(str::to_string),
        last_name: ctx.claim_str("family_name").map(str::to_string),
        email: ctx.claim_str("email").map(str::to_string),
        permissions,
    })
}

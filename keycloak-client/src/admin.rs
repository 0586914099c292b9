//! Administrative Keycloak operations, delegated verbatim to the admin REST
//! API and authenticated via the client-credentials grant.

use crate::error::KeycloakError;
use crate::{KeycloakConfig, TokenResponse};
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Seconds subtracted from a token's lifetime before it is considered stale.
const TOKEN_EXPIRY_SKEW: u64 = 30;

/// Fallback lifetime when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_TTL: u64 = 60;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub required_actions: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRepresentation<'a> {
    r#type: &'a str,
    value: &'a str,
    temporary: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RoleRepresentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ClientRepresentation {
    pub id: String,
    pub client_id: String,
}

/// An authorization resource registered on the resource server client.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRepresentation {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PolicyRepresentation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RolePolicyRepresentation {
    name: String,
    description: String,
    r#type: &'static str,
    logic: &'static str,
    roles: Vec<RoleDefinition>,
}

#[derive(Debug, Serialize)]
struct RoleDefinition {
    id: String,
    required: bool,
}

/// A scope-based permission on the resource server client.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScopePermissionRepresentation {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_strategy: Option<String>,
}

/// Input for user creation; the caller's password and initial realm role are
/// applied right after the account exists.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Client for the Keycloak admin REST API.
///
/// Obtains service-account tokens via the client-credentials grant and caches
/// them in-process until shortly before expiry. All operations are simple
/// passthroughs; none of them retries.
#[derive(Clone)]
pub struct AdminClient {
    config: KeycloakConfig,
    client: Client,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl AdminClient {
    pub fn new(config: KeycloakConfig) -> Result<Self, KeycloakError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .connect_timeout(Duration::from_secs(2))
            .build()?;
        Ok(Self {
            config,
            client,
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// Returns a valid service-account token, fetching a new one when the
    /// cached token is missing or about to expire.
    async fn admin_token(&self) -> Result<String, KeycloakError> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if Instant::now() < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        debug!("Fetching admin token from: {}", self.config.token_url());
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        let response = self
            .client
            .post(self.config.token_url())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(KeycloakError::Status { status, body });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| KeycloakError::Decode(e.to_string()))?;
        let ttl = token
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_TTL)
            .saturating_sub(TOKEN_EXPIRY_SKEW);
        *guard = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(ttl),
        });
        Ok(token.access_token)
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, KeycloakError> {
        let token = self.admin_token().await?;
        let response = self
            .client
            .get(self.config.admin_url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<StatusCode, KeycloakError> {
        let token = self.admin_token().await?;
        let response = self
            .client
            .post(self.config.admin_url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::check(response).await
    }

    async fn put<T: Serialize>(&self, path: &str, body: &T) -> Result<StatusCode, KeycloakError> {
        let token = self.admin_token().await?;
        let response = self
            .client
            .put(self.config.admin_url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::check(response).await
    }

    async fn delete(&self, path: &str) -> Result<StatusCode, KeycloakError> {
        let token = self.admin_token().await?;
        let response = self
            .client
            .delete(self.config.admin_url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::check(response).await
    }

    async fn parse<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, KeycloakError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(KeycloakError::Status { status, body });
        }
        response
            .json()
            .await
            .map_err(|e| KeycloakError::Decode(e.to_string()))
    }

    async fn check(response: reqwest::Response) -> Result<StatusCode, KeycloakError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KeycloakError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(status)
    }

    // ---- users ----

    pub async fn list_users(
        &self,
        first: usize,
        max: usize,
    ) -> Result<Vec<UserRepresentation>, KeycloakError> {
        self.get(&format!("/users?first={first}&max={max}")).await
    }

    pub async fn count_users(&self) -> Result<u64, KeycloakError> {
        self.get("/users/count").await
    }

    pub async fn search_users(
        &self,
        username: &str,
    ) -> Result<Vec<UserRepresentation>, KeycloakError> {
        self.get(&format!("/users?search={username}")).await
    }

    /// Creates a realm user, sets its permanent password and grants it the
    /// requested realm role.
    pub async fn create_user(&self, new_user: &NewUser) -> Result<UserRepresentation, KeycloakError> {
        let user = UserRepresentation {
            id: None,
            username: new_user.email.clone(),
            first_name: Some(new_user.first_name.clone()),
            last_name: Some(new_user.last_name.clone()),
            email: Some(new_user.email.clone()),
            enabled: true,
            email_verified: true,
            required_actions: Vec::new(),
        };
        self.post("/users", &user).await?;

        let matches = self.search_users(&new_user.email).await?;
        let user_id = matches
            .first()
            .and_then(|u| u.id.clone())
            .ok_or_else(|| KeycloakError::NotFound(format!("user {}", new_user.email)))?;

        let credential = CredentialRepresentation {
            r#type: "password",
            value: &new_user.password,
            temporary: false,
        };
        self.put(&format!("/users/{user_id}/reset-password"), &credential)
            .await?;

        let role: RoleRepresentation = self.get(&format!("/roles/{}", new_user.role)).await?;
        self.post(&format!("/users/{user_id}/role-mappings/realm"), &vec![role])
            .await?;

        info!("User created: {}", new_user.email);
        Ok(UserRepresentation {
            id: Some(user_id),
            username: new_user.email.clone(),
            first_name: Some(new_user.first_name.clone()),
            last_name: Some(new_user.last_name.clone()),
            email: Some(new_user.email.clone()),
            enabled: true,
            email_verified: true,
            required_actions: Vec::new(),
        })
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<(), KeycloakError> {
        let mut user: UserRepresentation = self.get(&format!("/users/{user_id}")).await?;
        user.first_name = Some(first_name.to_string());
        user.last_name = Some(last_name.to_string());
        user.email = Some(email.to_string());
        user.username = email.to_string();
        self.put(&format!("/users/{user_id}"), &user).await?;
        Ok(())
    }

    /// Deletes the user matching `username`; resolving the id first because
    /// the admin API only deletes by id.
    pub async fn delete_user(&self, username: &str) -> Result<(), KeycloakError> {
        let matches = self.search_users(username).await?;
        let user_id = matches
            .first()
            .and_then(|u| u.id.clone())
            .ok_or_else(|| KeycloakError::NotFound(format!("user {username}")))?;
        self.delete(&format!("/users/{user_id}")).await?;
        Ok(())
    }

    // ---- roles ----

    pub async fn list_roles(
        &self,
        first: usize,
        max: usize,
    ) -> Result<Vec<RoleRepresentation>, KeycloakError> {
        self.get(&format!("/roles?first={first}&max={max}")).await
    }

    pub async fn count_roles(&self) -> Result<u64, KeycloakError> {
        let all: Vec<RoleRepresentation> = self.get("/roles").await?;
        Ok(all.len() as u64)
    }

    /// Creates a realm role and the role policy backing it on the resource
    /// server client.
    pub async fn create_role(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<RoleRepresentation, KeycloakError> {
        let role = RoleRepresentation {
            id: None,
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        self.post("/roles", &role).await?;

        let created: RoleRepresentation = self.get(&format!("/roles/{name}")).await?;
        self.create_role_policy(&created.name).await?;
        Ok(created)
    }

    async fn create_role_policy(&self, role_name: &str) -> Result<(), KeycloakError> {
        let client_uuid = self.resource_server_id().await?;
        let policy = RolePolicyRepresentation {
            name: role_name.to_string(),
            description: format!("Policy for role {role_name}"),
            r#type: "role",
            logic: "POSITIVE",
            roles: vec![RoleDefinition {
                id: role_name.to_string(),
                required: true,
            }],
        };
        let status = self
            .post(
                &format!("/clients/{client_uuid}/authz/resource-server/policy/role"),
                &policy,
            )
            .await?;
        if status == StatusCode::CREATED {
            info!("Policy created for role {role_name}");
        } else {
            warn!("Unexpected status creating policy for role {role_name}: {status}");
        }
        Ok(())
    }

    /// Resolves the internal UUID of the resource server client.
    async fn resource_server_id(&self) -> Result<String, KeycloakError> {
        let clients: Vec<ClientRepresentation> = self
            .get(&format!("/clients?clientId={}", self.config.client_id))
            .await?;
        clients
            .first()
            .map(|c| c.id.clone())
            .ok_or_else(|| KeycloakError::NotFound(format!("client {}", self.config.client_id)))
    }

    // ---- authorization resources and permissions ----

    pub async fn list_resources(&self) -> Result<Vec<ResourceRepresentation>, KeycloakError> {
        let client_uuid = self.resource_server_id().await?;
        self.get(&format!(
            "/clients/{client_uuid}/authz/resource-server/resource"
        ))
        .await
    }

    /// Permissions attached to a resource, as policy summaries.
    pub async fn resource_permissions(
        &self,
        resource_id: &str,
    ) -> Result<Vec<PolicyRepresentation>, KeycloakError> {
        let client_uuid = self.resource_server_id().await?;
        self.get(&format!(
            "/clients/{client_uuid}/authz/resource-server/policy?resource={resource_id}&permission=true"
        ))
        .await
    }

    /// Names of the permissions that depend on a role's policy.
    pub async fn permissions_by_role(&self, role_name: &str) -> Result<Vec<String>, KeycloakError> {
        let client_uuid = self.resource_server_id().await?;
        let policy = self.find_policy(&client_uuid, role_name).await?;
        let dependents: Vec<PolicyRepresentation> = self
            .get(&format!(
                "/clients/{client_uuid}/authz/resource-server/policy/{}/dependentPolicies",
                policy.id
            ))
            .await?;
        Ok(dependents.into_iter().map(|p| p.name).collect())
    }

    /// Associates a role's policy with each named scope permission, keeping
    /// already-associated policies and forcing an affirmative decision
    /// strategy. Permissions already carrying the policy are left untouched.
    pub async fn assign_permissions_to_role(
        &self,
        role_name: &str,
        permission_names: &[String],
    ) -> Result<(), KeycloakError> {
        let client_uuid = self.resource_server_id().await?;
        let policy = self.find_policy(&client_uuid, role_name).await?;

        for name in permission_names {
            let mut permission = self.find_scope_permission(&client_uuid, name).await?;
            let associated: Vec<PolicyRepresentation> = self
                .get(&format!(
                    "/clients/{client_uuid}/authz/resource-server/policy/{}/associatedPolicies",
                    permission.id
                ))
                .await?;

            let mut current: Vec<String> = associated.into_iter().map(|p| p.name).collect();
            if current.contains(&policy.name) {
                continue;
            }
            current.push(policy.name.clone());
            permission.policies = Some(current);
            permission.decision_strategy = Some("AFFIRMATIVE".to_string());
            self.put(
                &format!(
                    "/clients/{client_uuid}/authz/resource-server/permission/scope/{}",
                    permission.id
                ),
                &permission,
            )
            .await?;
        }
        Ok(())
    }

    async fn find_policy(
        &self,
        client_uuid: &str,
        name: &str,
    ) -> Result<PolicyRepresentation, KeycloakError> {
        self.get::<Option<PolicyRepresentation>>(&format!(
            "/clients/{client_uuid}/authz/resource-server/policy/search?name={name}"
        ))
        .await?
        .ok_or_else(|| KeycloakError::NotFound(format!("policy {name}")))
    }

    async fn find_scope_permission(
        &self,
        client_uuid: &str,
        name: &str,
    ) -> Result<ScopePermissionRepresentation, KeycloakError> {
        self.get::<Option<ScopePermissionRepresentation>>(&format!(
            "/clients/{client_uuid}/authz/resource-server/permission/scope/search?name={name}"
        ))
        .await?
        .ok_or_else(|| KeycloakError::NotFound(format!("permission {name}")))
    }
}

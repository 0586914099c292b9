//! # keycloak-client
//!
//! A crate for interacting with a Keycloak identity provider.
//!
//! ## Components
//!
//! - **AuthzClient:** exchanges access tokens for UMA2 Requesting Party
//!   Tokens (RPTs) against the realm token endpoint.
//! - **AdminClient:** administrative operations (users, roles, policies,
//!   permissions) authenticated via the client-credentials grant.

pub mod admin;
pub mod error;

pub use crate::admin::AdminClient;
pub use crate::error::KeycloakError;

use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// UMA2 grant type used to obtain an RPT.
const UMA_TICKET_GRANT: &str = "urn:ietf:params:oauth:grant-type:uma-ticket";

/// Static Keycloak connection settings, loaded once at startup and shared
/// read-only by every request-handling task.
#[derive(Debug, Deserialize, Clone)]
pub struct KeycloakConfig {
    /// Base URL of the Keycloak server (default: http://localhost:8080)
    #[serde(default)]
    pub server_url: String,

    /// Realm name (default: clinic)
    #[serde(default)]
    pub realm: String,

    /// Client id of the resource server
    #[serde(default)]
    pub client_id: String,

    /// Client secret of the resource server
    #[serde(default)]
    pub client_secret: String,

    /// Timeout for Keycloak requests in seconds (default: 5)
    #[serde(default)]
    pub timeout: u64,
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            realm: "clinic".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout: 5,
        }
    }
}

impl KeycloakConfig {
    /// Realm OIDC token endpoint.
    pub fn token_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.server_url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Realm OIDC discovery document.
    pub fn discovery_url(&self) -> String {
        format!(
            "{}/realms/{}/.well-known/openid-configuration",
            self.server_url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Admin REST endpoint for the realm; `path` must start with `/`.
    pub fn admin_url(&self, path: &str) -> String {
        format!(
            "{}/admin/realms/{}{}",
            self.server_url.trim_end_matches('/'),
            self.realm,
            path
        )
    }
}

/// Shape of the token endpoint response, for both the UMA2 and the
/// client-credentials grants.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Client for the realm authorization (UMA2) endpoint.
///
/// Holds a single long-lived HTTP client; one exchange call is made per
/// inbound request, with no caching of the returned RPT.
#[derive(Clone)]
pub struct AuthzClient {
    config: KeycloakConfig,
    client: Client,
}

impl AuthzClient {
    pub fn new(config: KeycloakConfig) -> Result<Self, KeycloakError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .connect_timeout(Duration::from_secs(2))
            .build()?;
        Ok(Self { config, client })
    }

    /// Exchanges an access token for an RPT.
    ///
    /// Sends the UMA2 ticket grant to the realm token endpoint with the
    /// caller's token as bearer credentials and returns the `access_token`
    /// field of the response. Any failure is terminal; no retries.
    pub async fn exchange(&self, access_token: &str) -> Result<String, KeycloakError> {
        let url = self.config.token_url();
        debug!("Exchanging access token for RPT at: {}", url);

        let params = [
            ("grant_type", UMA_TICKET_GRANT),
            ("audience", self.config.client_id.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
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
        Ok(token.access_token)
    }

    /// Checks that the realm is reachable by fetching its discovery document.
    pub async fn health(&self) -> bool {
        match self.client.get(self.config.discovery_url()).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub fn config(&self) -> &KeycloakConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_url() {
        let config = KeycloakConfig {
            server_url: "http://idp:8080/".to_string(),
            realm: "clinic".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.token_url(),
            "http://idp:8080/realms/clinic/protocol/openid-connect/token"
        );
    }

    #[test]
    fn test_admin_url() {
        let config = KeycloakConfig {
            server_url: "http://idp:8080".to_string(),
            realm: "clinic".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.admin_url("/users/count"),
            "http://idp:8080/admin/realms/clinic/users/count"
        );
    }
}

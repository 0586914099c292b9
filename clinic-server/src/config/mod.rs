use config::{Config as ConfigCrate, ConfigError};
use keycloak_client::KeycloakConfig;
use serde::Deserialize;

/// Main configuration structure for the clinic server
#[derive(Debug, Deserialize, Clone)]
pub struct ClinicConfig {
    /// The port the server will listen to (default: 8081)
    #[serde(default)]
    pub port: u16,

    /// Keycloak connection settings
    #[serde(default)]
    pub keycloak: KeycloakConfig,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            keycloak: KeycloakConfig::default(),
        }
    }
}

impl ClinicConfig {
    /// Creates a new Config instance from environment variables
    pub fn new() -> Result<Self, String> {
        ConfigCrate::builder()
            .add_source(
                config::Environment::with_prefix("CLINIC")
                    .prefix_separator("_")
                    .separator("_")
                    .convert_case(config::Case::Snake),
            )
            .build()
            .map_err(|e: ConfigError| e.to_string())?
            .try_deserialize()
            .map_err(|e| e.to_string())
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(keycloak_mock: &wiremock::MockServer) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            keycloak: KeycloakConfig {
                server_url: keycloak_mock.uri(),
                realm: "clinic".to_string(),
                client_id: "clinic-backend".to_string(),
                client_secret: "test_client_secret".to_string(),
                timeout: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClinicConfig::default();
        assert_eq!(config.port, 8081);
        assert_eq!(config.keycloak.server_url, "http://localhost:8080");
        assert_eq!(config.keycloak.realm, "clinic");
        assert_eq!(config.keycloak.timeout, 5);
    }
}

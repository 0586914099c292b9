use thiserror::Error;

/// Errors raised while talking to the Keycloak server.
///
/// Every cause of a failed token exchange collapses into one of these
/// variants; callers treat them uniformly as a single failure class.
#[derive(Debug, Error)]
pub enum KeycloakError {
    #[error("failed to send request to Keycloak: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Keycloak request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode Keycloak response: {0}")]
    Decode(String),

    #[error("{0} not found")]
    NotFound(String),
}

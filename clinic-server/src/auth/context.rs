use crate::errors::ApiError;
use axum::extract::FromRequestParts;
use http::request::Parts;
use serde_json::Value;

/// The authenticated caller, attached to the request by the claims
/// middleware: the decoded RPT claims plus their flattened authorities.
#[derive(Debug, Clone)]
pub struct AuthContext {
    claims: Value,
    authorities: Vec<String>,
}

impl AuthContext {
    pub fn new(claims: Value, authorities: Vec<String>) -> Self {
        Self { claims, authorities }
    }

    /// Matches against the authority collection as a set; duplicate entries
    /// are harmless.
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    /// Fails with 403 when the caller does not hold `authority`.
    pub fn require(&self, authority: &str) -> Result<(), ApiError> {
        if self.has_authority(authority) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Missing required authority: {authority}"
            )))
        }
    }

    pub fn claims(&self) -> &Value {
        &self.claims
    }

    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }

    pub fn username(&self) -> Option<&str> {
        self.claim_str("preferred_username")
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use keycloak_client::KeycloakError;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub detail: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a detail message and status code
    pub fn new<S: ToString>(detail: S, status_code: StatusCode) -> Self {
        Self {
            detail: detail.to_string(),
            status_code,
        }
    }

    /// Create new Internal Server Error (500) with a detail message
    pub fn internal<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create new Unauthorized Error (401) with a detail message
    pub fn unauthorized<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::UNAUTHORIZED)
    }

    /// Create new Forbidden Error (403) with a detail message
    pub fn forbidden<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::FORBIDDEN)
    }

    /// Create new Not Found Error (404) with a detail message
    pub fn not_found<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::NOT_FOUND)
    }

    /// Create new Conflict Error (409) with a detail message
    pub fn conflict<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::CONFLICT)
    }

    /// Create new Bad Gateway (502) with a detail message
    pub fn bad_gateway<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::BAD_GATEWAY)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code;
        let body = json!({
            "detail": self.detail,
        });
        (status_code, Json(body)).into_response()
    }
}

impl From<KeycloakError> for ApiError {
    fn from(err: KeycloakError) -> Self {
        match err {
            KeycloakError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            KeycloakError::Request(_) => ApiError::bad_gateway("Failed to send request to Keycloak"),
            KeycloakError::Status { status, .. } => {
                ApiError::bad_gateway(format!("Keycloak request failed with status: {status}"))
            }
            KeycloakError::Decode(e) => {
                ApiError::internal(format!("Failed to parse Keycloak response: {e}"))
            }
        }
    }
}

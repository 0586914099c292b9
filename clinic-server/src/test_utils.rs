use crate::config::ClinicConfig;
use crate::create_app;
use crate::state::tests::create_test_state;
use axum::body::Body;
use axum::Router;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// URL-encoded form of the UMA2 ticket grant, for matching exchange calls.
const UMA_TICKET_GRANT_PARAM: &str =
    "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Auma-ticket";

/// Test fixture wiring the real router against a mocked Keycloak server.
///
/// Requests built by the fixture carry `Authorization: Bearer
/// test-access-token`; mounting an exchange mock decides which RPT (and
/// therefore which authorities) the pipeline sees.
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration settings
    pub config: ClinicConfig,
    /// Mock server standing in for Keycloak
    pub keycloak_mock: MockServer,
}

impl TestFixture {
    pub async fn new() -> Self {
        // Initialize test logger
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let keycloak_mock = MockServer::start().await;
        let config = ClinicConfig::for_test_with_mocks(&keycloak_mock);
        let state = create_test_state(config.clone());
        let app = create_app(state).await;

        Self {
            app,
            config,
            keycloak_mock,
        }
    }

    /// Forges a compact JWT carrying `claims`; the claims middleware decodes
    /// payloads without signature verification, so tests can mint RPTs.
    pub fn forge_rpt(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.sig")
    }

    /// Claims for a test user holding the given "resource:scope" permissions.
    pub fn claims_with_permissions(permissions: &[&str]) -> Value {
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for permission in permissions {
            let (resource, scope) = permission
                .split_once(':')
                .expect("permission must be of the form resource:scope");
            match grouped.iter_mut().find(|(r, _)| r == resource) {
                Some((_, scopes)) => scopes.push(scope.to_string()),
                None => grouped.push((resource.to_string(), vec![scope.to_string()])),
            }
        }
        let permissions: Vec<Value> = grouped
            .iter()
            .map(|(resource, scopes)| json!({"rsname": resource, "scopes": scopes}))
            .collect();

        json!({
            "exp": Utc::now().timestamp() + 300,
            "preferred_username": "test-user",
            "email": "test-user@clinic.io",
            "given_name": "Test",
            "family_name": "User",
            "scope": "openid",
            "authorization": {"permissions": permissions}
        })
    }

    /// Mounts the UMA2 exchange endpoint returning an RPT with `claims`.
    pub async fn mock_exchange_with_claims(&self, claims: &Value) {
        Mock::given(method("POST"))
            .and(path("/realms/clinic/protocol/openid-connect/token"))
            .and(body_string_contains(UMA_TICKET_GRANT_PARAM))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": Self::forge_rpt(claims),
                "expires_in": 300
            })))
            .mount(&self.keycloak_mock)
            .await;
    }

    /// Mounts the exchange endpoint granting the given permissions.
    pub async fn mock_exchange_with_permissions(&self, permissions: &[&str]) {
        self.mock_exchange_with_claims(&Self::claims_with_permissions(permissions))
            .await;
    }

    /// Mounts the client-credentials grant used by the admin client.
    pub async fn mock_admin_token(&self) {
        Mock::given(method("POST"))
            .and(path("/realms/clinic/protocol/openid-connect/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "admin-token",
                "expires_in": 300
            })))
            .mount(&self.keycloak_mock)
            .await;
    }

    /// Mounts the realm discovery document used by the readiness check.
    pub async fn mock_discovery(&self) {
        Mock::given(method("GET"))
            .and(path("/realms/clinic/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": format!("{}/realms/clinic", self.config.keycloak.server_url)
            })))
            .mount(&self.keycloak_mock)
            .await;
    }

    /// Creates a request builder with the standard test headers.
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Authorization", "Bearer test-access-token")
            .header("Content-Type", "application/json")
    }

    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(Method::POST, uri)
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn put<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(Method::PUT, uri)
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn delete(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::DELETE, uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a request and returns a TestResponse.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let text = String::from_utf8(body.to_vec()).unwrap_or_default();
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse { status, json, text }
    }
}

/// Response from a test request with convenient access to status and body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
    /// Raw response body
    pub text: String,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {} but got {} with body: {}",
            expected, self.status, self.text
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Converts the response body to the specified type.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}

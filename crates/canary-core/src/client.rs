//! HTTP client for the Canary cloud API.
//!
//! The client keeps a cookie jar for its whole lifetime, so the cookies set by
//! the login page are replayed on the credentials POST as one logical session.
//!
//! # Example
//!
//! ```no_run
//! use canary_core::client::CanaryClient;
//! use canary_core::{CanaryApi, Credentials};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CanaryClient::new(canary_core::client::DEFAULT_BASE_URL)?;
//!
//! let session = client.login(&Credentials::new("me@example.com", "secret")).await?;
//! let locations = client.locations(&session).await?;
//! println!("Found {} location(s)", locations.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use canary_types::{DeviceId, Location, SensorReading};

use crate::error::{AuthFailure, Error, Result};
use crate::session::{Credentials, Session};
use crate::traits::CanaryApi;

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://my.canary.is";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const XSRF_COOKIE: &str = "XSRF-TOKEN";
const XSRF_HEADER: &str = "X-XSRF-TOKEN";

/// HTTP client for the Canary API.
#[derive(Debug, Clone)]
pub struct CanaryClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
}

impl CanaryClient {
    /// Create a new client with the default timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The API base URL (e.g., "https://my.canary.is")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new client with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;

        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Create a client with a custom reqwest Client.
    ///
    /// The client must have its cookie store enabled for login to work.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the login page and extract the `XSRF-TOKEN` cookie.
    async fn xsrf_token(&self) -> Result<String> {
        let url = self.endpoint("/login");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network { url, source: e })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Auth(AuthFailure::Rejected {
                status: status.as_u16(),
            }));
        }

        response
            .cookies()
            .find(|cookie| cookie.name() == XSRF_COOKIE && !cookie.value().is_empty())
            .map(|cookie| cookie.value().to_string())
            .ok_or(Error::Auth(AuthFailure::MissingXsrfToken))
    }

    async fn get_authenticated<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        session: &Session,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(&url)
            .bearer_auth(session.token())
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Network {
                url: url.clone(),
                source: e,
            })?;

        handle_response(url, response).await
    }
}

#[async_trait]
impl CanaryApi for CanaryClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let xsrf_token = self.xsrf_token().await?;
        debug!("Got XSRF token, posting credentials");

        let url = self.endpoint("/api/auth/login");
        let response = self
            .client
            .post(&url)
            .header(XSRF_HEADER, &xsrf_token)
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|e| Error::Network {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Auth(AuthFailure::Rejected {
                status: status.as_u16(),
            }));
        }

        let body: LoginResponse = read_json(url, response).await?;

        body.access_token
            .filter(|token| !token.is_empty())
            .map(Session::new)
            .ok_or(Error::Auth(AuthFailure::MissingAccessToken))
    }

    async fn locations(&self, session: &Session) -> Result<Vec<Location>> {
        let url = self.endpoint("/api/locations");
        self.get_authenticated(url, session, &[]).await
    }

    async fn readings(
        &self,
        session: &Session,
        device_id: &DeviceId,
    ) -> Result<Vec<SensorReading>> {
        let url = self.endpoint("/api/readings");
        let query = [
            ("deviceId", device_id.to_string()),
            ("type", "canary".to_string()),
        ];
        self.get_authenticated(url, session, &query).await
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    let base_url = base_url.trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::InvalidConfig(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url)
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    url: String,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        read_json(url, response).await
    } else {
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| status.to_string());

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Read the whole body, then parse it. A body cut off mid-transfer is a
/// transport failure, not a shape mismatch.
async fn read_json<T: serde::de::DeserializeOwned>(
    url: String,
    response: reqwest::Response,
) -> Result<T> {
    let body = response.bytes().await.map_err(|e| Error::Network {
        url: url.clone(),
        source: e,
    })?;
    serde_json::from_slice(&body).map_err(|e| Error::Decode { url, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;

    fn credentials() -> Credentials {
        Credentials::new("user@example.com", "hunter2")
    }

    #[test]
    fn test_client_creation() {
        let client = CanaryClient::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(client.base_url(), "https://my.canary.is");
    }

    #[test]
    fn test_client_normalizes_url() {
        let client = CanaryClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.endpoint("/login"), "http://localhost:8080/login");
    }

    #[test]
    fn test_client_invalid_url() {
        let result = CanaryClient::new("my.canary.is");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut server = mockito::Server::new_async().await;
        let login_page = server
            .mock("GET", "/login")
            .with_status(200)
            .with_header("set-cookie", "XSRF-TOKEN=xsrf-abc; Path=/")
            .with_body("<html></html>")
            .expect(1)
            .create_async()
            .await;
        let auth = server
            .mock("POST", "/api/auth/login")
            .match_header("x-xsrf-token", "xsrf-abc")
            .match_body(Matcher::Json(json!({
                "username": "user@example.com",
                "password": "hunter2",
            })))
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "bearer-xyz", "token_type": "Bearer"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = CanaryClient::new(&server.url()).unwrap();
        let session = client.login(&credentials()).await.unwrap();

        assert_eq!(session.token(), "bearer-xyz");
        login_page.assert_async().await;
        auth.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_without_xsrf_cookie_skips_post() {
        let mut server = mockito::Server::new_async().await;
        let login_page = server
            .mock("GET", "/login")
            .with_status(200)
            .with_header("set-cookie", "session_id=abc; Path=/")
            .expect(1)
            .create_async()
            .await;
        let auth = server
            .mock("POST", "/api/auth/login")
            .expect(0)
            .create_async()
            .await;

        let client = CanaryClient::new(&server.url()).unwrap();
        let result = client.login(&credentials()).await;

        assert!(matches!(
            result,
            Err(Error::Auth(AuthFailure::MissingXsrfToken))
        ));
        login_page.assert_async().await;
        auth.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/login")
            .with_header("set-cookie", "XSRF-TOKEN=xsrf-abc; Path=/")
            .create_async()
            .await;
        server
            .mock("POST", "/api/auth/login")
            .with_status(401)
            .with_body(r#"{"error": "invalid credentials"}"#)
            .create_async()
            .await;

        let client = CanaryClient::new(&server.url()).unwrap();
        let result = client.login(&credentials()).await;

        assert!(matches!(
            result,
            Err(Error::Auth(AuthFailure::Rejected { status: 401 }))
        ));
    }

    #[tokio::test]
    async fn test_login_missing_access_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/login")
            .with_header("set-cookie", "XSRF-TOKEN=xsrf-abc; Path=/")
            .create_async()
            .await;
        server
            .mock("POST", "/api/auth/login")
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "ok"}"#)
            .create_async()
            .await;

        let client = CanaryClient::new(&server.url()).unwrap();
        let result = client.login(&credentials()).await;

        assert!(matches!(
            result,
            Err(Error::Auth(AuthFailure::MissingAccessToken))
        ));
    }

    #[tokio::test]
    async fn test_locations_sends_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/locations")
            .match_header("authorization", "Bearer tok")
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id": 1, "devices": [{"id": 42, "serial_number": "A"}]}]"#,
            )
            .create_async()
            .await;

        let client = CanaryClient::new(&server.url()).unwrap();
        let locations = client.locations(&Session::new("tok")).await.unwrap();

        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].devices[0].id, DeviceId::Number(42));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_readings_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/readings")
            .match_header("authorization", "Bearer tok")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("deviceId".into(), "42".into()),
                Matcher::UrlEncoded("type".into(), "canary".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"sensor_type": "temperature", "value": 21.5},
                    {"sensor_type": "humidity", "value": 40}]"#,
            )
            .create_async()
            .await;

        let client = CanaryClient::new(&server.url()).unwrap();
        let readings = client
            .readings(&Session::new("tok"), &DeviceId::Number(42))
            .await
            .unwrap();

        assert_eq!(
            readings,
            vec![
                SensorReading::new("temperature", 21.5),
                SensorReading::new("humidity", 40.0),
            ]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/locations")
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "token expired"}"#)
            .create_async()
            .await;

        let client = CanaryClient::new(&server.url()).unwrap();
        let err = client.locations(&Session::new("tok")).await.unwrap_err();

        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "token expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/readings")
            .match_query(Matcher::Any)
            .with_body("not json")
            .create_async()
            .await;

        let client = CanaryClient::new(&server.url()).unwrap();
        let err = client
            .readings(&Session::new("tok"), &DeviceId::Number(1))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Decode { .. }));
    }

    #[tokio::test]
    async fn test_truncated_body_is_network_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/readings")
            .match_query(Matcher::Any)
            .with_chunked_body(|w| {
                w.write_all(br#"[{"sensor_type": "temp"#)?;
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                ))
            })
            .create_async()
            .await;

        let client = CanaryClient::new(&server.url()).unwrap();
        let err = client
            .readings(&Session::new("tok"), &DeviceId::Number(1))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network { .. }), "got {err:?}");
    }
}

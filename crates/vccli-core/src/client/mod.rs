//! Client handle for the vCenter REST API.
//!
//! A `ClientHandle` owns the base URL, the credentials and the current session
//! token, and routes every request through the authenticating interceptor.
//! Clones share the same token and lock.

mod transport;

pub use reqwest::{Request, Response};
pub use transport::Transport;

use std::sync::Arc;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::auth::session::{decode_session_info, join_path, SESSION_PATH};
use crate::auth::{AuthInterceptor, Credentials, SessionInfo, SessionState};
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// One logical connection to a vCenter API.
pub struct ClientHandle<T = reqwest::Client> {
    interceptor: Arc<AuthInterceptor<T>>,
}

impl<T> Clone for ClientHandle<T> {
    fn clone(&self) -> Self {
        Self {
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

impl ClientHandle<reqwest::Client> {
    /// Create a client for `base_url` with default settings.
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        Self::from_config(ClientConfig::new(base_url, username, password))
    }

    /// Create a client backed by a `reqwest::Client` built from `config`.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Self::with_transport(config, client)
    }
}

impl<T: Transport> ClientHandle<T> {
    /// Create a client that sends everything through `transport`.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let credentials = Credentials::new(config.username, config.password);
        let state = SessionState::new(base_url, credentials, config.auth_timeout);

        Ok(Self {
            interceptor: Arc::new(AuthInterceptor::new(state, transport)),
        })
    }

    pub fn base_url(&self) -> &Url {
        self.interceptor.state().base_url()
    }

    pub fn username(&self) -> &str {
        self.interceptor.state().credentials().username()
    }

    /// Current session token; empty before the first authenticated request.
    pub async fn token(&self) -> String {
        self.interceptor.state().token().await
    }

    /// Absolute URL for an API path, e.g. `/api/vcenter/vm`.
    pub fn url(&self, path: &str) -> Url {
        join_path(self.base_url(), path)
    }

    /// Send `request` with a valid session token attached.
    ///
    /// The response comes back unmodified, including error statuses.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        debug!(method = %request.method(), url = %request.url(), "sending request");
        self.interceptor.intercept(request).await
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.execute(Request::new(Method::GET, self.url(path))).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response> {
        let mut request = Request::new(Method::POST, self.url(path));
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *request.body_mut() = Some(serde_json::to_vec(body).map_err(Error::Encode)?.into());

        self.execute(request).await
    }

    /// GET `path` and decode a successful JSON response.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let response = Self::check_response(self.get(path).await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Owner and creation time of the session this client currently holds.
    pub async fn session_info(&self) -> Result<SessionInfo> {
        let response = self.get(SESSION_PATH).await?;
        decode_session_info(response).await.map_err(Error::session_info)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(Error::from_status(status, &body))
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let invalid = |reason: String| Error::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;

    use super::*;
    use crate::testing::FakeTransport;

    const SESSION_OK: &str = r#"{"user":"admin","created_time":"2024-01-01T00:00:00Z"}"#;

    /// A server whose only valid token is "abc123".
    fn server() -> FakeTransport {
        FakeTransport::new(|req| {
            let token = req.header("vmware-api-session-id").unwrap_or("");
            match (req.method.as_str(), req.url.path()) {
                ("GET", "/api/session") if token == "abc123" => (200, SESSION_OK.into()),
                ("GET", "/api/session") => (401, String::new()),
                ("POST", "/api/session") => (201, "\"abc123\"".into()),
                ("GET", "/api/vcenter/vm") => (200, r#"[{"vm":"vm-1","name":"web-01"}]"#.into()),
                ("POST", "/api/vcenter/vm") => (201, "\"vm-2\"".into()),
                _ => (404, r#"{"error_type":"NOT_FOUND"}"#.into()),
            }
        })
    }

    fn handle() -> ClientHandle<FakeTransport> {
        ClientHandle::with_transport(
            ClientConfig::new("https://vc.example", "admin", "secret"),
            server(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_base_url() {
        assert!(parse_base_url("https://vc.example").is_ok());
        assert!(matches!(
            parse_base_url("not a url"),
            Err(Error::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            parse_base_url("mailto:admin@vc.example"),
            Err(Error::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        assert!(ClientHandle::new("::", "admin", "secret").is_err());
        let client = ClientHandle::new("https://vc.example/sdk", "admin", "secret").unwrap();
        assert_eq!(client.username(), "admin");
        assert_eq!(client.url("/api/session").as_str(), "https://vc.example/sdk/api/session");
    }

    #[tokio::test]
    async fn test_token_starts_empty() {
        assert_eq!(handle().token().await, "");
    }

    #[tokio::test]
    async fn test_get_json_authenticates_first() {
        let client = handle();

        let vms: serde_json::Value = client.get_json("/api/vcenter/vm").await.unwrap();
        assert_eq!(vms[0]["name"], "web-01");
        assert_eq!(client.token().await, "abc123");
    }

    #[tokio::test]
    async fn test_get_json_maps_error_status() {
        let err = handle()
            .get_json::<serde_json::Value>("/api/vcenter/host")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_get_returns_error_status_unmodified() {
        let response = handle().get("/api/vcenter/host").await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_json_sets_body_and_headers() {
        let client = handle();
        let response = client
            .post_json("/api/vcenter/vm", &serde_json::json!({"name": "web-02"}))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let requests = client.interceptor.transport().requests();
        let post = requests.last().unwrap();
        assert_eq!(post.header("content-type"), Some("application/json"));
        assert_eq!(post.header("vmware-api-session-id"), Some("abc123"));
    }

    #[tokio::test]
    async fn test_clones_share_session() {
        let client = handle();
        let clone = client.clone();

        client.get("/api/vcenter/vm").await.unwrap();
        clone.get("/api/vcenter/vm").await.unwrap();

        assert_eq!(clone.token().await, "abc123");
        assert_eq!(
            client.interceptor.transport().session_calls(Method::POST),
            1
        );
    }

    #[tokio::test]
    async fn test_session_info() {
        let info = handle().session_info().await.unwrap();
        assert_eq!(info.user, "admin");
    }

    #[test]
    fn test_from_config_applies_timeout() {
        let config = ClientConfig::new("https://vc.example", "admin", "secret")
            .with_request_timeout(Some(Duration::from_secs(5)));
        assert!(ClientHandle::from_config(config).is_ok());
    }
}

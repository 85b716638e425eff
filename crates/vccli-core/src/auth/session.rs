//! Session introspection and creation against `<base>/api/session`.

use std::future::Future;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Request, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::client::Transport;
use crate::error::{Error, Result};

/// Header carrying the session token on every authenticated request.
pub const VMWARE_SESSION_ID: HeaderName = HeaderName::from_static("vmware-api-session-id");

/// Path of the session endpoint, relative to the base URL.
pub const SESSION_PATH: &str = "api/session";

/// Owner and creation time of a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user: String,
    pub created_time: DateTime<Utc>,
}

/// Join `path` under `base`, keeping any path prefix the base already has.
pub fn join_path(base: &Url, path: &str) -> Url {
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url.set_query(query);
    url.set_fragment(None);
    url
}

/// Strip the JSON string quotes the API wraps around a new token.
pub fn unquote_token(body: &str) -> &str {
    body.trim_matches('"')
}

/// Run `fut`, failing with `Error::Cancelled` once `deadline` is reached.
pub(crate) async fn with_deadline<F, T>(deadline: Option<Instant>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| Error::Cancelled)?,
        None => fut.await,
    }
}

/// Check whether `token` designates a live session.
///
/// A 401 comes back as [`Error::NotAuthenticated`]; any other non-200 status
/// is an [`Error::UnexpectedStatus`] with the raw body. An undecodable 200
/// body is an error too, never an invalid session.
pub async fn validate_session<T>(
    transport: &T,
    base_url: &Url,
    token: &str,
    deadline: Option<Instant>,
) -> Result<SessionInfo>
where
    T: Transport + ?Sized,
{
    with_deadline(deadline, async {
        let mut request = Request::new(Method::GET, join_path(base_url, SESSION_PATH));
        request
            .headers_mut()
            .insert(VMWARE_SESSION_ID, HeaderValue::from_str(token)?);

        debug!(url = %request.url(), "validating session");
        let response = transport.send(request).await?;
        decode_session_info(response).await
    })
    .await
}

/// Map an introspection response to its outcome.
pub(crate) async fn decode_session_info(response: Response) -> Result<SessionInfo> {
    match response.status() {
        StatusCode::OK => {
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        }
        StatusCode::UNAUTHORIZED => Err(Error::NotAuthenticated),
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(Error::from_status(status, &body))
        }
    }
}

/// Exchange basic credentials for a new session token.
///
/// `basic_auth_value` is the base64 of `username:password`. A token that is
/// not a valid header value is an [`Error::InvalidHeader`].
pub async fn create_session<T>(
    transport: &T,
    base_url: &Url,
    basic_auth_value: &str,
    deadline: Option<Instant>,
) -> Result<String>
where
    T: Transport + ?Sized,
{
    with_deadline(deadline, async {
        let mut request = Request::new(Method::POST, join_path(base_url, SESSION_PATH));
        let headers = request.headers_mut();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", basic_auth_value))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        debug!(url = %request.url(), "creating session");
        let response = transport.send(request).await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status, &body));
        }

        let body = response.text().await?;
        let token = unquote_token(&body);
        // A token that can't be sent back would wedge every later validation.
        HeaderValue::from_str(token)?;
        Ok(token.to_string())
    })
    .await
}

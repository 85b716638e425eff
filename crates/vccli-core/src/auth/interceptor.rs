//! Request interceptor that keeps a live session token on every request.
//!
//! Every request runs the same sequence under the handle's exclusive lock:
//! validate the held token, create a new session if the API reports it as
//! not authenticated, then attach the token. The lock is released before the
//! request itself is sent, so only token maintenance is serialized.
//!
//! Only a 401 from the introspection endpoint triggers a new session. A 401
//! on the caller's own request is returned to the caller untouched.

use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest::{Request, Response, Url};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::credentials::Credentials;
use super::session::{create_session, validate_session, VMWARE_SESSION_ID};
use crate::client::Transport;
use crate::error::{Error, Result};

/// Token state shared by every clone of a client handle.
pub struct SessionState {
    base_url: Url,
    credentials: Credentials,
    /// Empty until the first session is created.
    token: Mutex<String>,
    auth_timeout: Option<Duration>,
}

impl SessionState {
    pub fn new(base_url: Url, credentials: Credentials, auth_timeout: Option<Duration>) -> Self {
        Self {
            base_url,
            credentials,
            token: Mutex::new(String::new()),
            auth_timeout,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Snapshot of the current token. Waits for any refresh in progress.
    pub async fn token(&self) -> String {
        self.token.lock().await.clone()
    }
}

/// Wraps a transport and authenticates everything sent through it.
pub struct AuthInterceptor<T> {
    state: SessionState,
    transport: T,
}

impl<T: Transport> AuthInterceptor<T> {
    pub fn new(state: SessionState, transport: T) -> Self {
        Self { state, transport }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Authenticate `request`, then send it through the inner transport.
    ///
    /// The response is returned as the transport produced it, whatever its
    /// status.
    pub async fn intercept(&self, mut request: Request) -> Result<Response> {
        self.authorize(&mut request).await?;
        Ok(self.transport.send(request).await?)
    }

    /// Make sure a live token is held and attach it to `request`.
    ///
    /// The request's own timeout (or the configured auth timeout) is one
    /// deadline shared by validation and creation. A request timeout is
    /// shortened to whatever is left of it once the token is attached.
    ///
    /// Dropping the returned future releases the lock and leaves the previous
    /// token in place.
    pub async fn authorize(&self, request: &mut Request) -> Result<()> {
        let deadline = request
            .timeout()
            .copied()
            .or(self.state.auth_timeout)
            .map(|timeout| Instant::now() + timeout);

        let mut token = self.state.token.lock().await;

        match validate_session(&self.transport, &self.state.base_url, &token, deadline).await {
            Ok(info) => {
                debug!(user = %info.user, "session is valid");
            }
            Err(Error::NotAuthenticated) => {
                debug!("session is not authenticated, creating a new one");

                let new_token = create_session(
                    &self.transport,
                    &self.state.base_url,
                    &self.state.credentials.basic_auth_value(),
                    deadline,
                )
                .await
                .map_err(|e| {
                    warn!(error = %e, "can't create session");
                    e.create_session()
                })?;

                info!(user = self.state.credentials.username(), "new session created");
                *token = new_token;
            }
            Err(e) => {
                warn!(error = %e, "can't get session info");
                return Err(e.session_info());
            }
        }

        request
            .headers_mut()
            .insert(VMWARE_SESSION_ID, HeaderValue::from_str(&token)?);
        drop(token);

        if let (Some(timeout), Some(deadline)) = (request.timeout_mut().as_mut(), deadline) {
            *timeout = deadline.saturating_duration_since(Instant::now());
        }
        Ok(())
    }
}

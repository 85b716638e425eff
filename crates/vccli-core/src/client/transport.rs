//! The capability that actually puts a request on the wire.

use async_trait::async_trait;
use reqwest::{Request, Response};

/// Sends one HTTP request and returns the raw response.
///
/// `reqwest::Client` is the production implementation. The authenticating
/// interceptor wraps a `Transport` and uses it for the session calls as well
/// as for the caller's request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn send(&self, request: Request) -> reqwest::Result<Response> {
        self.execute(request).await
    }
}

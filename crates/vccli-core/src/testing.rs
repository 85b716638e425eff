//! Scripted in-memory transport for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Request, Response, Url};

use crate::client::Transport;

/// What the fake saw for one outgoing request.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_session_call(&self, method: Method) -> bool {
        self.method == method && self.url.path() == "/api/session"
    }
}

type Handler = Box<dyn Fn(&RecordedRequest) -> (u16, String) + Send + Sync>;

/// Answers every request with `(status, body)` from a handler closure.
pub(crate) struct FakeTransport {
    handler: Handler,
    delay: Option<Duration>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sleep this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn session_calls(&self, method: Method) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.is_session_call(method.clone()))
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: Request) -> reqwest::Result<Response> {
        let recorded = RecordedRequest {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            timeout: request.timeout().copied(),
        };
        self.requests.lock().unwrap().push(recorded.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let (status, body) = (self.handler)(&recorded);
        let response = http::Response::builder()
            .status(status)
            .body(body)
            .unwrap();
        Ok(Response::from(response))
    }
}

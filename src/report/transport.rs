//! HTTP transport used to fetch reports.
//!
//! # Responsibilities
//! - Issue a GET with optional per-request basic auth
//! - Expose status and content type before the body is read
//! - Enforce the overall request timeout
//!
//! # Design Decisions
//! - Credentials are attached to each request, never to client defaults,
//!   so targets sharing one client never see each other's credentials
//! - Timeouts are reported distinctly from other request errors

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Credentials sent as an `Authorization: Basic` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Errors raised by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// A response whose headers have been received.
#[async_trait]
pub trait TransportResponse: Send {
    fn status(&self) -> u16;

    /// Raw `Content-Type` header value, if any.
    fn content_type(&self) -> Option<&str>;

    /// Read the remaining body.
    async fn body(self: Box<Self>) -> Result<Bytes, TransportError>;
}

/// Abstract HTTP GET.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &Url,
        auth: Option<&BasicAuth>,
    ) -> Result<Box<dyn TransportResponse>, TransportError>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    fn map_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Request(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &Url,
        auth: Option<&BasicAuth>,
    ) -> Result<Box<dyn TransportResponse>, TransportError> {
        let mut request = self.client.get(url.clone());
        if let Some(auth) = auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }

        let response = request.send().await.map_err(|e| self.map_error(e))?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(Box::new(ReqwestResponse {
            response,
            content_type,
            timeout: self.timeout,
        }))
    }
}

struct ReqwestResponse {
    response: reqwest::Response,
    content_type: Option<String>,
    timeout: Duration,
}

#[async_trait]
impl TransportResponse for ReqwestResponse {
    fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    async fn body(self: Box<Self>) -> Result<Bytes, TransportError> {
        let timeout = self.timeout;
        self.response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Body(e.to_string())
            }
        })
    }
}

/// Scripted transport for unit tests.
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone)]
    pub enum Scripted {
        Respond {
            status: u16,
            content_type: Option<&'static str>,
            body: String,
        },
        Fail(&'static str),
    }

    impl Scripted {
        pub fn json(status: u16, body: impl Into<String>) -> Self {
            Scripted::Respond {
                status,
                content_type: Some("application/json; charset=utf-8"),
                body: body.into(),
            }
        }

        pub fn text(status: u16, body: impl Into<String>) -> Self {
            Scripted::Respond {
                status,
                content_type: Some("text/plain"),
                body: body.into(),
            }
        }
    }

    /// Returns the scripted outcome for a URL and records each request.
    #[derive(Default)]
    pub struct ScriptedTransport {
        routes: Mutex<HashMap<String, Scripted>>,
        pub requests: Mutex<Vec<(String, Option<BasicAuth>)>>,
    }

    impl ScriptedTransport {
        pub fn set(&self, url: &str, outcome: Scripted) {
            self.routes.lock().unwrap().insert(url.to_string(), outcome);
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    struct ScriptedResponse {
        status: u16,
        content_type: Option<&'static str>,
        body: String,
    }

    #[async_trait]
    impl TransportResponse for ScriptedResponse {
        fn status(&self) -> u16 {
            self.status
        }

        fn content_type(&self) -> Option<&str> {
            self.content_type
        }

        async fn body(self: Box<Self>) -> Result<Bytes, TransportError> {
            Ok(Bytes::from(self.body))
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(
            &self,
            url: &Url,
            auth: Option<&BasicAuth>,
        ) -> Result<Box<dyn TransportResponse>, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), auth.cloned()));
            let outcome = self.routes.lock().unwrap().get(url.as_str()).cloned();
            match outcome {
                Some(Scripted::Respond { status, content_type, body }) => {
                    Ok(Box::new(ScriptedResponse { status, content_type, body }))
                }
                Some(Scripted::Fail(reason)) => Err(TransportError::Request(reason.to_string())),
                None => Err(TransportError::Request("connection refused".to_string())),
            }
        }
    }
}

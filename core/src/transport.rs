//! The blocking GET boundary.
//!
//! `MoodleClient` never performs I/O itself. `Transport` is the one seam where
//! a request leaves the process; `UreqTransport` is the default, backed by a
//! pooled `ureq::Agent` that can be shared between threads.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport {
    /// Perform the GET described by `request` and return status and body.
    /// Non-2xx statuses are data, not errors.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// `timeout` bounds the whole request; when it elapses the request is
    /// aborted and `TransportError::TimedOut` is returned.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let started = Instant::now();
        let mut builder = self.agent.get(&request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        let mut response = builder.call().map_err(|e| {
            debug!(function = %request.function, error = %e, "moodle request failed");
            transport_error(e)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.body_mut().read_to_string().map_err(|e| match e {
            ureq::Error::Timeout(_) => TransportError::TimedOut,
            other => TransportError::Body(other.to_string()),
        })?;

        debug!(
            function = %request.function,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "moodle request completed"
        );
        Ok(HttpResponse { status, headers, body })
    }
}

fn transport_error(e: ureq::Error) -> TransportError {
    match e {
        ureq::Error::Timeout(_) => TransportError::TimedOut,
        other => TransportError::Unreachable(other.to_string()),
    }
}

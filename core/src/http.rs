//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `MoodleClient` builds an
//! `HttpRequest` and parses an `HttpResponse` without touching the network;
//! a [`Transport`](crate::transport::Transport) (or the caller) performs the
//! actual GET in between.
//!
//! Every Moodle web-service call is a GET, so there is no method field.

/// A GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Fully-qualified URL including the encoded query string.
    pub url: String,
    /// Name of the remote function, kept for logging without the query string.
    pub function: String,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A 200 response carrying `body`, handy for feeding canned payloads to `parse`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

//! Typed client for the Moodle web-service REST API.
//!
//! # Overview
//! Every Moodle web-service call is a GET carrying `wsfunction=<name>` and a
//! flat set of string parameters, answered with JSON. This crate encodes those
//! calls, decodes each endpoint's response into its own wire shape, promotes
//! service warnings and exception envelopes to errors, and maps the wire
//! shapes into a stable domain model.
//!
//! # Design
//! - `MoodleClient` is stateless: `build` produces an `HttpRequest`, `parse`
//!   consumes an `HttpResponse`. It never touches the network.
//! - `Moodle` adds a blocking `Transport` (ureq by default) and exposes one
//!   method per remote capability.
//! - Each endpoint is a `WsFunction` type with its own decode target; there
//!   is no dynamically typed catch-all response.
//! - Callers get a fully mapped result or exactly one `ApiError`, never both.

pub mod client;
pub mod config;
pub mod course;
pub mod error;
pub mod function;
pub mod grade;
pub mod http;
pub mod query;
pub mod quiz;
pub mod transport;
pub mod types;
pub mod warning;

pub use client::{Moodle, MoodleClient};
pub use config::Config;
pub use error::{ApiError, Result, TransportError};
pub use function::WsFunction;
pub use http::{HttpRequest, HttpResponse};
pub use query::RemoteCall;
pub use transport::{Transport, UreqTransport};
pub use types::{
    AttemptReview, AttemptState, Course, CourseClassification, CourseTimeline, GradeItem, Quiz, QuizAttempt,
    QuizQuestion, Student, UserGrade,
};
pub use warning::{Warning, Warnings};

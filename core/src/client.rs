//! Request builder, response parser and blocking facade for Moodle.
//!
//! # Design
//! `MoodleClient` holds only the endpoint URL and optional token and carries
//! no mutable state between calls. `build` produces an `HttpRequest` for any
//! `WsFunction` and `parse` turns the matching `HttpResponse` into that
//! function's output. `Moodle` pairs a client with a `Transport` and performs
//! build, send and parse in one blocking call. Nothing here logs, caches or
//! retries; the first failure is returned.

use crate::config::Config;
use crate::course::{GetEnrolledCoursesByTimelineClassification, GetEnrolledUsers};
use crate::error::{ApiError, Result};
use crate::function::WsFunction;
use crate::grade::GetGradeItems;
use crate::http::{HttpRequest, HttpResponse};
use crate::query::{encode_url, RemoteCall};
use crate::quiz::{GetAttemptReview, GetQuizzesByCourses, GetUserAttempts, ProcessAttempt, StartAttempt};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    AttemptReview, AttemptState, Course, CourseClassification, Quiz, QuizAttempt, Student, UserGrade,
};
use crate::warning::check_exception;

/// Keys the client sets itself; a call cannot override them.
const RESERVED_KEYS: [&str; 2] = ["wstoken", "moodlewsrestformat"];

/// Synchronous, stateless request builder and response parser.
#[derive(Debug, Clone)]
pub struct MoodleClient {
    base_url: String,
    token: Option<String>,
}

impl MoodleClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build<F: WsFunction>(&self, function: &F) -> HttpRequest {
        self.build_call(&function.call())
    }

    /// Build a GET for an arbitrary remote call. `wstoken` and
    /// `moodlewsrestformat=json` precede the call's own parameters; a call
    /// parameter under either key is dropped.
    pub fn build_call(&self, call: &RemoteCall) -> HttpRequest {
        let mut pairs = Vec::new();
        if let Some(token) = &self.token {
            pairs.push(("wstoken".to_string(), token.clone()));
        }
        pairs.push(("moodlewsrestformat".to_string(), "json".to_string()));
        pairs.extend(
            call.pairs()
                .into_iter()
                .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str())),
        );
        HttpRequest {
            url: encode_url(&self.base_url, &pairs),
            function: call.function().to_string(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }

    /// Status check, exception envelope, JSON decode, then the function's own
    /// warning check and mapping.
    pub fn parse<F: WsFunction>(&self, response: HttpResponse) -> Result<F::Output> {
        check_status(&response, 200)?;
        check_exception(&response.body)?;
        let decoded: F::Response = serde_json::from_str(&response.body)?;
        F::into_output(decoded)
    }
}

fn check_status(response: &HttpResponse, expected: u16) -> Result<()> {
    if response.status == expected {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

/// Blocking Moodle client: one method per remote capability.
#[derive(Debug, Clone)]
pub struct Moodle<T = UreqTransport> {
    client: MoodleClient,
    transport: T,
}

impl Moodle<UreqTransport> {
    pub fn from_config(config: &Config) -> Self {
        let mut client = MoodleClient::new(&config.base_url);
        if let Some(token) = &config.token {
            client = client.with_token(token.clone());
        }
        Self::new(client, UreqTransport::with_timeout(config.timeout))
    }
}

impl<T: Transport> Moodle<T> {
    pub fn new(client: MoodleClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &MoodleClient {
        &self.client
    }

    pub fn call<F: WsFunction>(&self, function: &F) -> Result<F::Output> {
        let request = self.client.build(function);
        let response = self.transport.send(&request)?;
        self.client.parse::<F>(response)
    }

    pub fn enrolled_courses(&self, classification: CourseClassification) -> Result<Vec<Course>> {
        let timeline = self.call(&GetEnrolledCoursesByTimelineClassification::new(classification))?;
        Ok(timeline.courses)
    }

    pub fn enrolled_students(&self, course_id: i64) -> Result<Vec<Student>> {
        self.call(&GetEnrolledUsers { course_id })
    }

    pub fn grade_items(&self, user_id: i64, course_id: i64) -> Result<Vec<UserGrade>> {
        self.call(&GetGradeItems { user_id, course_id })
    }

    pub fn quizzes(&self, course_id: i64) -> Result<Vec<Quiz>> {
        self.call(&GetQuizzesByCourses {
            course_ids: vec![course_id],
        })
    }

    pub fn user_attempts(&self, quiz_id: i64) -> Result<Vec<QuizAttempt>> {
        self.call(&GetUserAttempts { quiz_id })
    }

    pub fn attempt_review(&self, attempt_id: i64) -> Result<AttemptReview> {
        self.call(&GetAttemptReview { attempt_id })
    }

    pub fn start_attempt(&self, quiz_id: i64) -> Result<QuizAttempt> {
        self.call(&StartAttempt {
            quiz_id,
            force_new: false,
        })
    }

    pub fn process_attempt(&self, attempt_id: i64, finish_attempt: bool, time_up: bool) -> Result<AttemptState> {
        self.call(&ProcessAttempt {
            attempt_id,
            finish_attempt,
            time_up,
        })
    }
}

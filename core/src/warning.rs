//! Service warnings and exception envelopes.
//!
//! Moodle reports soft failures as a `warnings` list next to (or instead of)
//! the payload, and hard failures as an `{"exception", "errorcode", "message"}`
//! object sent with status 200. This client promotes both to errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

use crate::error::ApiError;

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Warning {
    #[serde_as(as = "DefaultOnNull")]
    pub item: String,
    pub itemid: Option<i64>,
    #[serde_as(as = "DefaultOnNull")]
    pub warningcode: String,
    #[serde_as(as = "DefaultOnNull")]
    pub message: String,
}

/// The `warnings` list carried by most response shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Warnings(pub Vec<Warning>);

impl Warnings {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.0.iter()
    }

    /// Fail with `ServiceWarning` when at least one warning is present.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ServiceWarning(self))
        }
    }
}

impl fmt::Display for Warnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, w) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "[{}] {}", w.warningcode, w.message)?;
        }
        Ok(())
    }
}

/// Moodle's error envelope.
#[derive(Debug, Deserialize)]
struct ExceptionEnvelope {
    exception: String,
    #[serde(default)]
    errorcode: String,
    #[serde(default)]
    message: String,
}

/// Detect an exception envelope in `body`.
///
/// Only a JSON object with a string `exception` member qualifies; anything
/// else is left for the endpoint's own decoder.
pub(crate) fn check_exception(body: &str) -> Result<(), ApiError> {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') || !trimmed.contains("\"exception\"") {
        return Ok(());
    }
    match serde_json::from_str::<ExceptionEnvelope>(trimmed) {
        Ok(env) => Err(ApiError::Exception {
            exception: env.exception,
            errorcode: env.errorcode,
            message: env.message,
        }),
        Err(_) => Ok(()),
    }
}

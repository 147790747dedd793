//! Domain model returned to callers.
//!
//! # Design
//! These types are independent of the wire shapes in `course`, `grade` and
//! `quiz`. Every value is built fresh from one decoded response and never
//! mutated afterwards. Nullable wire data stays `Option` here so an absent id
//! or flag is never confused with `0` or `false`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Convert Unix seconds to a UTC timestamp. Seconds outside chrono's range
/// clamp to the epoch.
pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_else(|| {
        debug!(secs, "timestamp out of range, using the epoch");
        DateTime::<Utc>::default()
    })
}

/// `Some` only for a strictly positive value; Moodle writes `0` for "never".
pub(crate) fn from_unix_nonzero(secs: i64) -> Option<DateTime<Utc>> {
    (secs > 0).then(|| from_unix(secs))
}

/// Timeline bucket used when listing enrolled courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseClassification {
    Past,
    /// Courses running now ("present").
    InProgress,
    Future,
}

impl CourseClassification {
    pub fn as_str(self) -> &'static str {
        match self {
            CourseClassification::Past => "past",
            CourseClassification::InProgress => "inprogress",
            CourseClassification::Future => "future",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub full_name: String,
    pub short_name: String,
    pub full_name_display: String,
    pub summary: String,
    pub summary_format: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub visible: bool,
    pub hidden: bool,
    pub is_favourite: bool,
    pub show_short_name: bool,
    pub progress: Option<i32>,
    pub has_progress: bool,
    pub view_url: String,
    pub course_image: String,
    pub course_category: String,
}

/// One page of `core_course_get_enrolled_courses_by_timeline_classification`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseTimeline {
    pub courses: Vec<Course>,
    /// Raw offset for the next page; this client does not follow it.
    pub next_offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    /// Institutional identifier (`idnumber`).
    pub code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Short name of the first role, or empty.
    pub role: String,
    /// Every group name followed by a single space.
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGrade {
    pub course_id: i64,
    pub user_id: i64,
    pub user_full_name: String,
    pub max_depth: i32,
    pub grade_items: Vec<GradeItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeItem {
    pub id: i64,
    pub item_name: String,
    pub item_type: String,
    pub item_module: Option<String>,
    pub item_instance: i64,
    pub item_number: Option<i64>,
    pub category_id: Option<i64>,
    pub outcome_id: Option<i64>,
    pub scale_id: Option<i64>,
    pub locked: Option<bool>,
    pub cm_id: Option<i64>,
    pub grade_raw: Option<f64>,
    pub grade_date_submitted: Option<DateTime<Utc>>,
    pub grade_date_graded: Option<DateTime<Utc>>,
    pub grade_hidden_by_date: bool,
    pub grade_needs_update: bool,
    pub grade_is_hidden: bool,
    pub grade_is_locked: Option<bool>,
    pub grade_is_overridden: Option<bool>,
    pub grade_formatted: String,
    pub grade_min: f64,
    pub grade_max: f64,
    pub range_formatted: String,
    pub feedback: String,
    pub feedback_format: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub course_id: i64,
    pub course_module_id: i64,
    pub name: String,
    pub intro: String,
    pub intro_format: i32,
    /// The epoch when the quiz has no opening restriction.
    pub time_open: DateTime<Utc>,
    pub time_close: DateTime<Utc>,
    /// Seconds; `0` means unlimited.
    pub time_limit: i64,
    pub preferred_behaviour: String,
    /// Allowed attempts; `0` means unlimited.
    pub attempts: i32,
    pub grade_method: i32,
    pub decimal_points: i32,
    pub question_decimal_points: i32,
    pub sum_grades: f64,
    pub grade: f64,
    pub has_feedback: bool,
    pub section: i64,
    pub visible: bool,
    pub group_mode: i32,
    pub grouping_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptState {
    NotStarted,
    InProgress,
    Overdue,
    Submitted,
    Finished,
    Abandoned,
    /// Any state string this crate does not name, kept verbatim.
    #[serde(untagged)]
    Other(String),
}

impl Default for AttemptState {
    fn default() -> Self {
        AttemptState::Other(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub attempt: i32,
    pub unique_id: i64,
    pub layout: String,
    pub current_page: i32,
    pub preview: bool,
    pub state: AttemptState,
    pub time_start: DateTime<Utc>,
    /// The epoch while the attempt is still open.
    pub time_finish: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
    pub time_modified_offline: DateTime<Utc>,
    pub time_check_state: Option<DateTime<Utc>>,
    /// `None` until the attempt has been graded.
    pub sum_grades: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub slot: i32,
    pub question_type: String,
    pub page: i32,
    pub html: String,
    pub sequence_check: i64,
    pub last_action_time: DateTime<Utc>,
    pub has_autosaved_step: bool,
    pub flagged: bool,
    pub number: Option<i32>,
    pub state: Option<String>,
    pub status: Option<String>,
    pub blocked_by_previous: bool,
    pub mark: Option<String>,
    pub max_mark: Option<f64>,
}

/// Result of `mod_quiz_get_attempt_review`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptReview {
    /// Formatted grade, empty or `"notyetgraded"` when unavailable.
    pub grade: String,
    pub attempt: QuizAttempt,
    pub questions: Vec<QuizQuestion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_seconds_convert_to_utc() {
        assert_eq!(from_unix(1000).timestamp(), 1000);
        assert_eq!(from_unix(0), DateTime::<Utc>::default());
    }

    #[test]
    fn out_of_range_seconds_clamp_to_epoch() {
        assert_eq!(from_unix(i64::MAX).timestamp(), 0);
    }

    #[test]
    fn nonzero_helper_treats_zero_and_negative_as_absent() {
        assert_eq!(from_unix_nonzero(0), None);
        assert_eq!(from_unix_nonzero(-5), None);
        assert_eq!(from_unix_nonzero(60).map(|t| t.timestamp()), Some(60));
    }

    #[test]
    fn classification_wire_values() {
        assert_eq!(CourseClassification::Past.as_str(), "past");
        assert_eq!(CourseClassification::InProgress.as_str(), "inprogress");
        assert_eq!(CourseClassification::Future.as_str(), "future");
    }

    #[test]
    fn attempt_state_decodes_known_and_unknown() {
        let s: AttemptState = serde_json::from_str(r#""inprogress""#).unwrap();
        assert_eq!(s, AttemptState::InProgress);
        let s: AttemptState = serde_json::from_str(r#""notstarted""#).unwrap();
        assert_eq!(s, AttemptState::NotStarted);
        let s: AttemptState = serde_json::from_str(r#""paused""#).unwrap();
        assert_eq!(s, AttemptState::Other("paused".to_string()));
        assert_eq!(serde_json::to_string(&s).unwrap(), r#""paused""#);
    }
}

//! Quiz endpoints: listing, attempts, review, start and process.
//!
//! Domain types stay close to the wire shape. Mapping only converts Unix
//! seconds to timestamps and `0`/`1` integers to `bool`. A `0` time is kept
//! as the epoch; only `timecheckstate`, nullable on the wire, is optional.

use serde::Deserialize;
use serde_with::{serde_as, DefaultOnNull};

use crate::error::Result;
use crate::function::WsFunction;
use crate::query::RemoteCall;
use crate::types::{from_unix, AttemptReview, AttemptState, Quiz, QuizAttempt, QuizQuestion};
use crate::warning::Warnings;

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuizResponse {
    pub id: i64,
    pub course: i64,
    pub coursemodule: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub name: String,
    #[serde_as(as = "DefaultOnNull")]
    pub intro: String,
    pub introformat: i32,
    pub timeopen: i64,
    pub timeclose: i64,
    pub timelimit: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub preferredbehaviour: String,
    pub attempts: i32,
    pub grademethod: i32,
    pub decimalpoints: i32,
    pub questiondecimalpoints: i32,
    pub sumgrades: f64,
    pub grade: f64,
    pub hasfeedback: i32,
    pub section: i64,
    pub visible: i32,
    pub groupmode: i32,
    pub groupingid: i64,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuizAttemptResponse {
    pub id: i64,
    pub quiz: i64,
    pub userid: i64,
    pub attempt: i32,
    pub uniqueid: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub layout: String,
    pub currentpage: i32,
    pub preview: i32,
    #[serde_as(as = "DefaultOnNull")]
    pub state: AttemptState,
    pub timestart: i64,
    pub timefinish: i64,
    pub timemodified: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub timemodifiedoffline: i64,
    pub timecheckstate: Option<i64>,
    pub sumgrades: Option<f64>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuizQuestionResponse {
    pub slot: i32,
    #[serde(rename = "type")]
    #[serde_as(as = "DefaultOnNull")]
    pub question_type: String,
    pub page: i32,
    #[serde_as(as = "DefaultOnNull")]
    pub html: String,
    pub sequencecheck: i64,
    pub lastactiontime: i64,
    pub hasautosavedstep: bool,
    pub flagged: bool,
    pub number: Option<i32>,
    pub state: Option<String>,
    pub status: Option<String>,
    pub blockedbyprevious: bool,
    pub mark: Option<String>,
    pub maxmark: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuizzesResponse {
    pub quizzes: Vec<QuizResponse>,
    pub warnings: Warnings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserAttemptsResponse {
    pub attempts: Vec<QuizAttemptResponse>,
    pub warnings: Warnings,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AttemptReviewResponse {
    #[serde_as(as = "DefaultOnNull")]
    pub grade: String,
    pub attempt: QuizAttemptResponse,
    pub questions: Vec<QuizQuestionResponse>,
    pub warnings: Warnings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StartAttemptResponse {
    pub attempt: QuizAttemptResponse,
    pub warnings: Warnings,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcessAttemptResponse {
    #[serde_as(as = "DefaultOnNull")]
    pub state: AttemptState,
    pub warnings: Warnings,
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// `mod_quiz_get_quizzes_by_courses`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetQuizzesByCourses {
    pub course_ids: Vec<i64>,
}

impl WsFunction for GetQuizzesByCourses {
    const NAME: &'static str = "mod_quiz_get_quizzes_by_courses";
    type Response = QuizzesResponse;
    type Output = Vec<Quiz>;

    fn call(&self) -> RemoteCall {
        RemoteCall::new(Self::NAME).array("courseids", &self.course_ids)
    }

    fn into_output(response: Self::Response) -> Result<Self::Output> {
        response.warnings.into_result()?;
        Ok(response.quizzes.into_iter().map(Quiz::from).collect())
    }
}

/// `mod_quiz_get_user_attempts`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetUserAttempts {
    pub quiz_id: i64,
}

impl WsFunction for GetUserAttempts {
    const NAME: &'static str = "mod_quiz_get_user_attempts";
    type Response = UserAttemptsResponse;
    type Output = Vec<QuizAttempt>;

    fn call(&self) -> RemoteCall {
        RemoteCall::new(Self::NAME).param("quizid", self.quiz_id)
    }

    fn into_output(response: Self::Response) -> Result<Self::Output> {
        response.warnings.into_result()?;
        Ok(response.attempts.into_iter().map(QuizAttempt::from).collect())
    }
}

/// `mod_quiz_get_attempt_review`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetAttemptReview {
    pub attempt_id: i64,
}

impl WsFunction for GetAttemptReview {
    const NAME: &'static str = "mod_quiz_get_attempt_review";
    type Response = AttemptReviewResponse;
    type Output = AttemptReview;

    fn call(&self) -> RemoteCall {
        RemoteCall::new(Self::NAME).param("attemptid", self.attempt_id)
    }

    fn into_output(response: Self::Response) -> Result<Self::Output> {
        response.warnings.into_result()?;
        Ok(AttemptReview {
            grade: response.grade,
            attempt: QuizAttempt::from(response.attempt),
            questions: response.questions.into_iter().map(QuizQuestion::from).collect(),
        })
    }
}

/// `mod_quiz_start_attempt`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartAttempt {
    pub quiz_id: i64,
    /// Ask Moodle to start a new attempt even if the current one is resumable.
    pub force_new: bool,
}

impl WsFunction for StartAttempt {
    const NAME: &'static str = "mod_quiz_start_attempt";
    type Response = StartAttemptResponse;
    type Output = QuizAttempt;

    fn call(&self) -> RemoteCall {
        let call = RemoteCall::new(Self::NAME).param("quizid", self.quiz_id);
        if self.force_new {
            call.flag("forcenew", true)
        } else {
            call
        }
    }

    fn into_output(response: Self::Response) -> Result<Self::Output> {
        response.warnings.into_result()?;
        Ok(QuizAttempt::from(response.attempt))
    }
}

/// `mod_quiz_process_attempt`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAttempt {
    pub attempt_id: i64,
    pub finish_attempt: bool,
    pub time_up: bool,
}

impl WsFunction for ProcessAttempt {
    const NAME: &'static str = "mod_quiz_process_attempt";
    type Response = ProcessAttemptResponse;
    type Output = AttemptState;

    fn call(&self) -> RemoteCall {
        RemoteCall::new(Self::NAME)
            .param("attemptid", self.attempt_id)
            .flag("finishattempt", self.finish_attempt)
            .flag("timeup", self.time_up)
    }

    fn into_output(response: Self::Response) -> Result<Self::Output> {
        response.warnings.into_result()?;
        Ok(response.state)
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

impl From<QuizResponse> for Quiz {
    fn from(res: QuizResponse) -> Self {
        Quiz {
            id: res.id,
            course_id: res.course,
            course_module_id: res.coursemodule,
            name: res.name,
            intro: res.intro,
            intro_format: res.introformat,
            time_open: from_unix(res.timeopen),
            time_close: from_unix(res.timeclose),
            time_limit: res.timelimit,
            preferred_behaviour: res.preferredbehaviour,
            attempts: res.attempts,
            grade_method: res.grademethod,
            decimal_points: res.decimalpoints,
            question_decimal_points: res.questiondecimalpoints,
            sum_grades: res.sumgrades,
            grade: res.grade,
            has_feedback: res.hasfeedback != 0,
            section: res.section,
            visible: res.visible != 0,
            group_mode: res.groupmode,
            grouping_id: res.groupingid,
        }
    }
}

impl From<QuizAttemptResponse> for QuizAttempt {
    fn from(res: QuizAttemptResponse) -> Self {
        QuizAttempt {
            id: res.id,
            quiz_id: res.quiz,
            user_id: res.userid,
            attempt: res.attempt,
            unique_id: res.uniqueid,
            layout: res.layout,
            current_page: res.currentpage,
            preview: res.preview != 0,
            state: res.state,
            time_start: from_unix(res.timestart),
            time_finish: from_unix(res.timefinish),
            time_modified: from_unix(res.timemodified),
            time_modified_offline: from_unix(res.timemodifiedoffline),
            time_check_state: res.timecheckstate.map(from_unix),
            sum_grades: res.sumgrades,
        }
    }
}

impl From<QuizQuestionResponse> for QuizQuestion {
    fn from(res: QuizQuestionResponse) -> Self {
        QuizQuestion {
            slot: res.slot,
            question_type: res.question_type,
            page: res.page,
            html: res.html,
            sequence_check: res.sequencecheck,
            last_action_time: from_unix(res.lastactiontime),
            has_autosaved_step: res.hasautosavedstep,
            flagged: res.flagged,
            number: res.number,
            state: res.state,
            status: res.status,
            blocked_by_previous: res.blockedbyprevious,
            mark: res.mark,
            max_mark: res.maxmark,
        }
    }
}

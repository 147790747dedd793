//! Grade report endpoint (`gradereport_user_get_grade_items`).
//!
//! # Design
//! Ids and flags that Moodle may send as `null` stay `Option` all the way into
//! `GradeItem`. The two grade dates deliberately use different absence rules:
//! `gradedatesubmitted` is absent only when the wire value is `null`, while
//! `gradedategraded` is absent whenever it is not strictly positive.

use serde::Deserialize;
use serde_with::{serde_as, DefaultOnNull};

use crate::error::Result;
use crate::function::WsFunction;
use crate::query::RemoteCall;
use crate::types::{from_unix, from_unix_nonzero, GradeItem, UserGrade};
use crate::warning::Warnings;

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GradeItemResponse {
    pub id: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub itemname: String,
    #[serde_as(as = "DefaultOnNull")]
    pub itemtype: String,
    pub itemmodule: Option<String>,
    pub iteminstance: i64,
    pub itemnumber: Option<i64>,
    pub categoryid: Option<i64>,
    pub outcomeid: Option<i64>,
    pub scaleid: Option<i64>,
    pub locked: Option<bool>,
    pub cmid: Option<i64>,
    pub graderaw: Option<f64>,
    pub gradedatesubmitted: Option<i64>,
    #[serde_as(as = "DefaultOnNull")]
    pub gradedategraded: i64,
    pub gradehiddenbydate: bool,
    pub gradeneedsupdate: bool,
    pub gradeishidden: bool,
    pub gradeislocked: Option<bool>,
    pub gradeisoverridden: Option<bool>,
    #[serde_as(as = "DefaultOnNull")]
    pub gradeformatted: String,
    pub grademin: f64,
    pub grademax: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub rangeformatted: String,
    #[serde_as(as = "DefaultOnNull")]
    pub feedback: String,
    pub feedbackformat: i32,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserGradeResponse {
    pub courseid: i64,
    pub userid: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub userfullname: String,
    pub maxdepth: i32,
    pub gradeitems: Vec<GradeItemResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GradeItemsResponse {
    pub usergrades: Vec<UserGradeResponse>,
    pub warnings: Warnings,
}

/// `gradereport_user_get_grade_items`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetGradeItems {
    pub user_id: i64,
    pub course_id: i64,
}

impl WsFunction for GetGradeItems {
    const NAME: &'static str = "gradereport_user_get_grade_items";
    type Response = GradeItemsResponse;
    type Output = Vec<UserGrade>;

    fn call(&self) -> RemoteCall {
        RemoteCall::new(Self::NAME)
            .param("userid", self.user_id)
            .param("courseid", self.course_id)
    }

    fn into_output(response: Self::Response) -> Result<Self::Output> {
        response.warnings.into_result()?;
        Ok(response.usergrades.into_iter().map(UserGrade::from).collect())
    }
}

impl From<UserGradeResponse> for UserGrade {
    fn from(res: UserGradeResponse) -> Self {
        UserGrade {
            course_id: res.courseid,
            user_id: res.userid,
            user_full_name: res.userfullname,
            max_depth: res.maxdepth,
            grade_items: res.gradeitems.into_iter().map(GradeItem::from).collect(),
        }
    }
}

impl From<GradeItemResponse> for GradeItem {
    fn from(res: GradeItemResponse) -> Self {
        GradeItem {
            id: res.id,
            item_name: res.itemname,
            item_type: res.itemtype,
            item_module: res.itemmodule,
            item_instance: res.iteminstance,
            item_number: res.itemnumber,
            category_id: res.categoryid,
            outcome_id: res.outcomeid,
            scale_id: res.scaleid,
            locked: res.locked,
            cm_id: res.cmid,
            grade_raw: res.graderaw,
            grade_date_submitted: res.gradedatesubmitted.map(from_unix),
            grade_date_graded: from_unix_nonzero(res.gradedategraded),
            grade_hidden_by_date: res.gradehiddenbydate,
            grade_needs_update: res.gradeneedsupdate,
            grade_is_hidden: res.gradeishidden,
            grade_is_locked: res.gradeislocked,
            grade_is_overridden: res.gradeisoverridden,
            grade_formatted: res.gradeformatted,
            grade_min: res.grademin,
            grade_max: res.grademax,
            range_formatted: res.rangeformatted,
            feedback: res.feedback,
            feedback_format: res.feedbackformat,
        }
    }
}

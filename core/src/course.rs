//! Course and enrolled-user endpoints.
//!
//! # Design
//! Wire structs mirror the JSON exactly and tolerate missing keys
//! (`#[serde(default)]`) and `null` scalars (`DefaultOnNull`). Mapping into
//! `Course` / `Student` happens in plain `From` impls with no error path.

use serde::Deserialize;
use serde_with::{serde_as, DefaultOnNull};

use crate::error::Result;
use crate::function::WsFunction;
use crate::query::RemoteCall;
use crate::types::{from_unix, Course, CourseClassification, CourseTimeline, Student};

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CourseResponse {
    pub id: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub fullname: String,
    #[serde_as(as = "DefaultOnNull")]
    pub shortname: String,
    #[serde_as(as = "DefaultOnNull")]
    pub summary: String,
    pub summaryformat: i32,
    pub startdate: i64,
    pub enddate: i64,
    pub visible: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub fullnamedisplay: String,
    #[serde_as(as = "DefaultOnNull")]
    pub viewurl: String,
    #[serde_as(as = "DefaultOnNull")]
    pub courseimage: String,
    pub progress: Option<i32>,
    pub hasprogress: bool,
    pub isfavourite: bool,
    pub hidden: bool,
    pub showshortname: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub coursecategory: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnrolledCoursesResponse {
    pub courses: Vec<CourseResponse>,
    pub nextoffset: i64,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroupResponse {
    pub id: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub name: String,
    #[serde_as(as = "DefaultOnNull")]
    pub description: String,
    pub descriptionformat: i32,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoleResponse {
    pub roleid: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub name: String,
    #[serde_as(as = "DefaultOnNull")]
    pub shortname: String,
    pub sortorder: i32,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StudentResponse {
    pub id: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub firstname: String,
    #[serde_as(as = "DefaultOnNull")]
    pub lastname: String,
    #[serde_as(as = "DefaultOnNull")]
    pub fullname: String,
    #[serde_as(as = "DefaultOnNull")]
    pub email: String,
    #[serde_as(as = "DefaultOnNull")]
    pub idnumber: String,
    #[serde_as(as = "DefaultOnNull")]
    pub groups: Vec<GroupResponse>,
    #[serde_as(as = "DefaultOnNull")]
    pub roles: Vec<RoleResponse>,
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// `core_course_get_enrolled_courses_by_timeline_classification`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetEnrolledCoursesByTimelineClassification {
    pub classification: CourseClassification,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl GetEnrolledCoursesByTimelineClassification {
    pub fn new(classification: CourseClassification) -> Self {
        Self {
            classification,
            offset: None,
            limit: None,
        }
    }
}

impl WsFunction for GetEnrolledCoursesByTimelineClassification {
    const NAME: &'static str = "core_course_get_enrolled_courses_by_timeline_classification";
    type Response = EnrolledCoursesResponse;
    type Output = CourseTimeline;

    fn call(&self) -> RemoteCall {
        let mut call = RemoteCall::new(Self::NAME).param("classification", self.classification.as_str());
        if let Some(offset) = self.offset {
            call = call.param("offset", offset);
        }
        if let Some(limit) = self.limit {
            call = call.param("limit", limit);
        }
        call
    }

    fn into_output(response: Self::Response) -> Result<Self::Output> {
        Ok(CourseTimeline {
            courses: response.courses.into_iter().map(Course::from).collect(),
            next_offset: response.nextoffset,
        })
    }
}

/// `core_enrol_get_enrolled_users`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetEnrolledUsers {
    pub course_id: i64,
}

impl WsFunction for GetEnrolledUsers {
    const NAME: &'static str = "core_enrol_get_enrolled_users";
    type Response = Vec<StudentResponse>;
    type Output = Vec<Student>;

    fn call(&self) -> RemoteCall {
        RemoteCall::new(Self::NAME).param("courseid", self.course_id)
    }

    fn into_output(response: Self::Response) -> Result<Self::Output> {
        Ok(response.into_iter().map(Student::from).collect())
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

impl From<CourseResponse> for Course {
    fn from(res: CourseResponse) -> Self {
        Course {
            id: res.id,
            // The display name is the plain full name; `fullnamedisplay` is
            // decoded but unused.
            full_name_display: res.fullname.clone(),
            full_name: res.fullname,
            short_name: res.shortname,
            summary: res.summary,
            summary_format: res.summaryformat,
            start_date: from_unix(res.startdate),
            // Both dates come from `startdate`; `enddate` is decoded but unused.
            end_date: from_unix(res.startdate),
            visible: res.visible,
            hidden: res.hidden,
            is_favourite: res.isfavourite,
            show_short_name: res.showshortname,
            progress: res.progress,
            has_progress: res.hasprogress,
            view_url: res.viewurl,
            course_image: res.courseimage,
            course_category: res.coursecategory,
        }
    }
}

impl From<StudentResponse> for Student {
    fn from(res: StudentResponse) -> Self {
        let group: String = res.groups.iter().map(|g| format!("{} ", g.name)).collect();
        let role = res.roles.into_iter().next().map(|r| r.shortname).unwrap_or_default();
        Student {
            id: res.id,
            code: res.idnumber,
            first_name: res.firstname,
            last_name: res.lastname,
            email: res.email,
            role,
            group,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_json() -> &'static str {
        r#"{
            "id": 12,
            "fullname": "Operating Systems",
            "shortname": "OS",
            "idnumber": "",
            "summary": "<p>Kernels</p>",
            "summaryformat": 1,
            "startdate": 1000,
            "enddate": 2000,
            "visible": true,
            "fullnamedisplay": "Operating Systems (2024)",
            "viewurl": "https://lms.example.edu/course/view.php?id=12",
            "courseimage": "data:image/svg+xml;base64,AAA",
            "progress": null,
            "hasprogress": false,
            "isfavourite": true,
            "hidden": false,
            "showshortname": false,
            "coursecategory": "Computer Science",
            "pdfexportfont": "freesans"
        }"#
    }

    #[test]
    fn course_end_date_copies_start_date() {
        let res: CourseResponse = serde_json::from_str(course_json()).unwrap();
        assert_eq!(res.enddate, 2000);
        let course = Course::from(res);
        assert_eq!(course.start_date.timestamp(), 1000);
        assert_eq!(course.end_date.timestamp(), 1000);
    }

    #[test]
    fn course_display_name_copies_full_name() {
        let res: CourseResponse = serde_json::from_str(course_json()).unwrap();
        assert_eq!(res.fullnamedisplay, "Operating Systems (2024)");
        let course = Course::from(res);
        assert_eq!(course.full_name_display, "Operating Systems");
    }

    #[test]
    fn course_fields_map_through() {
        let course = Course::from(serde_json::from_str::<CourseResponse>(course_json()).unwrap());
        assert_eq!(course.id, 12);
        assert_eq!(course.full_name, "Operating Systems");
        assert_eq!(course.short_name, "OS");
        assert_eq!(course.summary_format, 1);
        assert_eq!(course.progress, None);
        assert!(course.is_favourite);
        assert_eq!(course.course_category, "Computer Science");
    }

    #[test]
    fn course_mapping_is_idempotent() {
        let res: CourseResponse = serde_json::from_str(course_json()).unwrap();
        assert_eq!(Course::from(res.clone()), Course::from(res));
    }

    #[test]
    fn course_tolerates_missing_and_null_fields() {
        let res: CourseResponse = serde_json::from_str(r#"{"id":1,"fullname":null}"#).unwrap();
        let course = Course::from(res);
        assert_eq!(course.full_name, "");
        assert_eq!(course.start_date.timestamp(), 0);
    }

    #[test]
    fn student_group_joins_every_name_with_trailing_space() {
        let res: StudentResponse = serde_json::from_str(
            r#"{"id":5,"idnumber":"F123","groups":[{"name":"A"},{"name":"B"}],"roles":[]}"#,
        )
        .unwrap();
        let student = Student::from(res);
        assert_eq!(student.group, "A B ");
        assert_eq!(student.role, "");
        assert_eq!(student.code, "F123");
    }

    #[test]
    fn student_single_group_keeps_trailing_space() {
        let res: StudentResponse = serde_json::from_str(r#"{"groups":[{"name":"GroupA"}]}"#).unwrap();
        assert_eq!(Student::from(res).group, "GroupA ");
    }

    #[test]
    fn student_without_groups_has_empty_group() {
        let res: StudentResponse = serde_json::from_str(r#"{"id":1,"groups":null}"#).unwrap();
        assert_eq!(Student::from(res).group, "");
    }

    #[test]
    fn student_role_is_first_shortname() {
        let res: StudentResponse = serde_json::from_str(
            r#"{"firstname":"Ada","lastname":"Lovelace","roles":[
                {"roleid":5,"name":"Student","shortname":"student","sortorder":0},
                {"roleid":3,"name":"Teacher","shortname":"editingteacher","sortorder":1}
            ]}"#,
        )
        .unwrap();
        let student = Student::from(res);
        assert_eq!(student.role, "student");
        assert_eq!(student.first_name, "Ada");
        assert_eq!(student.last_name, "Lovelace");
    }

    #[test]
    fn timeline_call_includes_paging_only_when_set() {
        let f = GetEnrolledCoursesByTimelineClassification::new(CourseClassification::Future);
        assert_eq!(f.call().pairs().len(), 2);
        let f = GetEnrolledCoursesByTimelineClassification {
            offset: Some(20),
            limit: Some(10),
            ..f
        };
        let pairs = f.call().pairs();
        assert_eq!(pairs[1], ("classification".to_string(), "future".to_string()));
        assert_eq!(pairs[2], ("offset".to_string(), "20".to_string()));
        assert_eq!(pairs[3], ("limit".to_string(), "10".to_string()));
    }

    #[test]
    fn timeline_output_keeps_next_offset() {
        let res: EnrolledCoursesResponse =
            serde_json::from_str(&format!(r#"{{"courses":[{}],"nextoffset":1}}"#, course_json())).unwrap();
        let timeline = GetEnrolledCoursesByTimelineClassification::into_output(res).unwrap();
        assert_eq!(timeline.courses.len(), 1);
        assert_eq!(timeline.next_offset, 1);
    }
}

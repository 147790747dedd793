use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// Token accepted by the mock; any other `wstoken` is rejected.
pub const TOKEN: &str = "mock-token";
pub const REST_PATH: &str = "/webservice/rest/server.php";

/// The user every token belongs to.
pub const CURRENT_USER: i64 = 3;

const CLOCK_START: i64 = 1_700_000_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub quiz: i64,
    pub userid: i64,
    pub attempt: i64,
    pub uniqueid: i64,
    pub layout: String,
    pub currentpage: i64,
    pub preview: i64,
    pub state: String,
    pub timestart: i64,
    pub timefinish: i64,
    pub timemodified: i64,
    pub timemodifiedoffline: i64,
    pub timecheckstate: Option<i64>,
    pub sumgrades: Option<f64>,
}

/// Seeded site content plus the attempts created while serving.
pub struct Site {
    courses: Vec<(&'static str, Value)>,
    users: Vec<(i64, Value)>,
    grades: Vec<((i64, i64), Value)>,
    quizzes: Vec<Value>,
    attempts: Vec<Attempt>,
    clock: i64,
}

pub type Db = Arc<RwLock<Site>>;

impl Site {
    pub fn seeded() -> Self {
        let course = |id: i64, name: &str, short: &str, start: i64, end: i64| {
            json!({
                "id": id,
                "fullname": name,
                "shortname": short,
                "idnumber": "",
                "summary": format!("<p>{name}</p>"),
                "summaryformat": 1,
                "startdate": start,
                "enddate": end,
                "visible": true,
                "fullnamedisplay": name,
                "viewurl": format!("http://localhost/course/view.php?id={id}"),
                "courseimage": "",
                "progress": null,
                "hasprogress": false,
                "isfavourite": false,
                "hidden": false,
                "showshortname": false,
                "coursecategory": "Computer Science"
            })
        };
        Self {
            courses: vec![
                ("inprogress", course(2, "Operating Systems", "OS", 1_693_526_400, 1_704_067_200)),
                ("past", course(3, "Compilers", "CC", 1_661_990_400, 1_672_531_200)),
                ("future", course(5, "Distributed Systems", "DS", 1_725_148_800, 1_735_689_600)),
            ],
            users: vec![
                (
                    2,
                    json!({
                        "id": 3, "firstname": "Ada", "lastname": "Lovelace", "fullname": "Ada Lovelace",
                        "email": "ada@example.edu", "idnumber": "F1001",
                        "groups": [
                            {"id": 1, "name": "A", "description": "", "descriptionformat": 1},
                            {"id": 2, "name": "B", "description": "", "descriptionformat": 1}
                        ],
                        "roles": [{"roleid": 5, "name": "", "shortname": "student", "sortorder": 0}],
                        "enrolledcourses": [{"id": 2, "fullname": "Operating Systems", "shortname": "OS"}]
                    }),
                ),
                (
                    2,
                    json!({
                        "id": 4, "firstname": "Alan", "lastname": "Turing", "fullname": "Alan Turing",
                        "email": "alan@example.edu", "idnumber": "F1002",
                        "groups": [], "roles": []
                    }),
                ),
            ],
            grades: vec![(
                (CURRENT_USER, 2),
                json!({
                    "courseid": 2, "userid": 3, "userfullname": "Ada Lovelace", "maxdepth": 2,
                    "gradeitems": [
                        {
                            "id": 10, "itemname": "Week 1 quiz", "itemtype": "mod", "itemmodule": "quiz",
                            "iteminstance": 7, "itemnumber": 0, "categoryid": 1, "outcomeid": null,
                            "scaleid": null, "locked": false, "cmid": 70, "graderaw": 8.0,
                            "gradedatesubmitted": 1_699_990_000, "gradedategraded": 1_699_990_600,
                            "gradehiddenbydate": false, "gradeneedsupdate": false, "gradeishidden": false,
                            "gradeislocked": false, "gradeisoverridden": false, "gradeformatted": "8.00",
                            "grademin": 0, "grademax": 10, "rangeformatted": "0&ndash;10",
                            "feedback": "", "feedbackformat": 0
                        },
                        {
                            "id": 11, "itemname": null, "itemtype": "course", "itemmodule": null,
                            "iteminstance": 1, "itemnumber": null, "categoryid": null, "outcomeid": null,
                            "scaleid": null, "locked": null, "graderaw": null,
                            "gradedatesubmitted": null, "gradedategraded": null,
                            "gradehiddenbydate": false, "gradeneedsupdate": false, "gradeishidden": false,
                            "gradeislocked": null, "gradeisoverridden": null, "gradeformatted": "-",
                            "grademin": 0, "grademax": 100, "rangeformatted": "0&ndash;100",
                            "feedback": null, "feedbackformat": 0
                        }
                    ]
                }),
            )],
            quizzes: vec![json!({
                "id": 7, "course": 2, "coursemodule": 70, "name": "Week 1 quiz", "intro": "",
                "introformat": 1, "timeopen": 0, "timeclose": 1_704_000_000, "timelimit": 0,
                "preferredbehaviour": "deferredfeedback", "attempts": 0, "grademethod": 1,
                "decimalpoints": 2, "questiondecimalpoints": -1, "sumgrades": 10.0, "grade": 10.0,
                "hasfeedback": 0, "section": 1, "visible": 1, "groupmode": 0, "groupingid": 0
            })],
            attempts: Vec::new(),
            clock: CLOCK_START,
        }
    }

    fn tick(&mut self) -> i64 {
        self.clock += 60;
        self.clock
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Site::seeded()));
    Router::new().route(REST_PATH, get(rest)).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type Params = Vec<(String, String)>;

fn param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn int_param(params: &Params, key: &str) -> Option<i64> {
    param(params, key).and_then(|v| v.parse().ok())
}

/// Values of `key[0]`, `key[1]`, ... in index order.
fn array_param(params: &Params, key: &str) -> Vec<String> {
    let mut indexed: Vec<(usize, String)> = params
        .iter()
        .filter_map(|(k, v)| {
            let index = k.strip_prefix(key)?.strip_prefix('[')?.strip_suffix(']')?;
            Some((index.parse().ok()?, v.clone()))
        })
        .collect();
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, v)| v).collect()
}

fn exception(errorcode: &str, message: &str) -> Value {
    json!({
        "exception": "moodle_exception",
        "errorcode": errorcode,
        "message": message
    })
}

fn missing(key: &str) -> Value {
    exception("invalidparameter", &format!("Invalid parameter value detected (Missing required key: {key})"))
}

async fn rest(State(db): State<Db>, Query(params): Query<Params>) -> Json<Value> {
    if param(&params, "wstoken") != Some(TOKEN) {
        return Json(exception("invalidtoken", "Invalid token - token not found"));
    }
    let function = param(&params, "wsfunction").unwrap_or_default();
    tracing::info!(function, "dispatching web-service call");

    let body = match function {
        "core_course_get_enrolled_courses_by_timeline_classification" => enrolled_courses(&db, &params).await,
        "core_enrol_get_enrolled_users" => enrolled_users(&db, &params).await,
        "gradereport_user_get_grade_items" => grade_items(&db, &params).await,
        "mod_quiz_get_quizzes_by_courses" => quizzes_by_courses(&db, &params).await,
        "mod_quiz_get_user_attempts" => user_attempts(&db, &params).await,
        "mod_quiz_get_attempt_review" => attempt_review(&db, &params).await,
        "mod_quiz_start_attempt" => start_attempt(&db, &params).await,
        "mod_quiz_process_attempt" => process_attempt(&db, &params).await,
        _ => exception(
            "invalidrecord",
            "Can't find data record in database table external_functions.",
        ),
    };
    Json(body)
}

async fn enrolled_courses(db: &Db, params: &Params) -> Value {
    let Some(classification) = param(params, "classification") else {
        return missing("classification");
    };
    if !["past", "inprogress", "future"].contains(&classification) {
        return exception("invalidparameter", "Invalid parameter value detected");
    }
    let site = db.read().await;
    let courses: Vec<Value> = site
        .courses
        .iter()
        .filter(|(c, _)| *c == classification)
        .map(|(_, course)| course.clone())
        .collect();
    let offset = int_param(params, "offset").unwrap_or(0);
    json!({ "courses": courses, "nextoffset": offset + courses.len() as i64 })
}

async fn enrolled_users(db: &Db, params: &Params) -> Value {
    let Some(course_id) = int_param(params, "courseid") else {
        return missing("courseid");
    };
    let site = db.read().await;
    if !site.courses.iter().any(|(_, c)| c["id"] == course_id) {
        return exception("invalidrecord", "Can't find data record in database table course.");
    }
    let users: Vec<Value> = site
        .users
        .iter()
        .filter(|(c, _)| *c == course_id)
        .map(|(_, u)| u.clone())
        .collect();
    Value::Array(users)
}

async fn grade_items(db: &Db, params: &Params) -> Value {
    let Some(user_id) = int_param(params, "userid") else {
        return missing("userid");
    };
    let Some(course_id) = int_param(params, "courseid") else {
        return missing("courseid");
    };
    let site = db.read().await;
    match site.grades.iter().find(|(key, _)| *key == (user_id, course_id)) {
        Some((_, grades)) => json!({ "usergrades": [grades], "warnings": [] }),
        None => json!({
            "usergrades": [],
            "warnings": [{
                "item": "user",
                "itemid": user_id,
                "warningcode": "nogrades",
                "message": "No grades found for this user in this course"
            }]
        }),
    }
}

async fn quizzes_by_courses(db: &Db, params: &Params) -> Value {
    let site = db.read().await;
    let mut quizzes = Vec::new();
    let mut warnings = Vec::new();
    for raw in array_param(params, "courseids") {
        let Ok(course_id) = raw.parse::<i64>() else {
            return exception("invalidparameter", "Invalid parameter value detected");
        };
        if !site.courses.iter().any(|(_, c)| c["id"] == course_id) {
            warnings.push(json!({
                "item": "course",
                "itemid": course_id,
                "warningcode": "1",
                "message": "No access rights in course context"
            }));
            continue;
        }
        quizzes.extend(site.quizzes.iter().filter(|q| q["course"] == course_id).cloned());
    }
    json!({ "quizzes": quizzes, "warnings": warnings })
}

async fn user_attempts(db: &Db, params: &Params) -> Value {
    let Some(quiz_id) = int_param(params, "quizid") else {
        return missing("quizid");
    };
    let site = db.read().await;
    if !site.quizzes.iter().any(|q| q["id"] == quiz_id) {
        return exception("invalidrecord", "Can't find data record in database table quiz.");
    }
    let attempts: Vec<&Attempt> = site.attempts.iter().filter(|a| a.quiz == quiz_id).collect();
    json!({ "attempts": attempts, "warnings": [] })
}

async fn attempt_review(db: &Db, params: &Params) -> Value {
    let Some(attempt_id) = int_param(params, "attemptid") else {
        return missing("attemptid");
    };
    let site = db.read().await;
    let Some(attempt) = site.attempts.iter().find(|a| a.id == attempt_id) else {
        return exception("invalidrecord", "Can't find data record in database table quiz_attempts.");
    };
    if attempt.state != "finished" {
        return exception("noreviewattempt", "You are not allowed to review this attempt.");
    }
    let grade = attempt.sumgrades.map(|g| format!("{g:.2}")).unwrap_or_else(|| "notyetgraded".to_string());
    json!({
        "grade": grade,
        "attempt": attempt,
        "additionaldata": [],
        "questions": [
            {
                "slot": 1, "type": "multichoice", "page": 0, "html": "<div class=\"que\">1</div>",
                "sequencecheck": 2, "lastactiontime": attempt.timefinish, "hasautosavedstep": false,
                "flagged": false, "number": 1, "state": "gradedright", "status": "Correct",
                "blockedbyprevious": false, "mark": "5.00", "maxmark": 5.0
            },
            {
                "slot": 2, "type": "truefalse", "page": 0, "html": "<div class=\"que\">2</div>",
                "sequencecheck": 2, "lastactiontime": attempt.timefinish, "hasautosavedstep": false,
                "flagged": true, "number": 2, "state": "gradedpartial", "status": "Partially correct",
                "blockedbyprevious": false, "mark": "3.00", "maxmark": 5.0
            }
        ],
        "warnings": []
    })
}

async fn start_attempt(db: &Db, params: &Params) -> Value {
    let Some(quiz_id) = int_param(params, "quizid") else {
        return missing("quizid");
    };
    let mut site = db.write().await;
    if !site.quizzes.iter().any(|q| q["id"] == quiz_id) {
        return exception("invalidrecord", "Can't find data record in database table quiz.");
    }
    if site.attempts.iter().any(|a| a.quiz == quiz_id && a.state == "inprogress") {
        return exception(
            "attemptstillinprogress",
            "Cannot start a new attempt: the previous one is still in progress.",
        );
    }
    let now = site.tick();
    let number = site.attempts.iter().filter(|a| a.quiz == quiz_id).count() as i64 + 1;
    let id = site.attempts.len() as i64 + 40;
    let attempt = Attempt {
        id,
        quiz: quiz_id,
        userid: CURRENT_USER,
        attempt: number,
        uniqueid: 900 + id,
        layout: "1,2,0".to_string(),
        currentpage: 0,
        preview: 0,
        state: "inprogress".to_string(),
        timestart: now,
        timefinish: 0,
        timemodified: now,
        timemodifiedoffline: 0,
        timecheckstate: None,
        sumgrades: None,
    };
    site.attempts.push(attempt.clone());
    json!({ "attempt": attempt, "warnings": [] })
}

async fn process_attempt(db: &Db, params: &Params) -> Value {
    let Some(attempt_id) = int_param(params, "attemptid") else {
        return missing("attemptid");
    };
    let finish = param(params, "finishattempt") == Some("1");
    let time_up = param(params, "timeup") == Some("1");
    let mut site = db.write().await;
    let now = site.tick();
    let Some(attempt) = site.attempts.iter_mut().find(|a| a.id == attempt_id) else {
        return exception("invalidrecord", "Can't find data record in database table quiz_attempts.");
    };
    if attempt.state == "finished" {
        return exception("attemptalreadyclosed", "This attempt has already been finished.");
    }
    attempt.timemodified = now;
    if finish || time_up {
        attempt.state = "finished".to_string();
        attempt.timefinish = now;
        attempt.sumgrades = Some(8.0);
    }
    json!({ "state": attempt.state, "warnings": [] })
}

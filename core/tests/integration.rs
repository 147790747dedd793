//! End-to-end run against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every `Moodle`
//! method over real HTTP through `UreqTransport`. Validates that request
//! encoding, exception and warning handling, and mapping agree with what a
//! Moodle REST endpoint actually sends.

use std::time::{Duration, Instant};

use moodle_core::{
    ApiError, AttemptState, Config, CourseClassification, Moodle, MoodleClient, TransportError, UreqTransport,
};

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn moodle(site: &str) -> Moodle {
    let config = Config::for_site(site)
        .with_token(mock_server::TOKEN)
        .with_timeout(Duration::from_secs(10));
    Moodle::from_config(&config)
}

#[test]
fn course_and_grade_reads() {
    let site = start_server();
    let moodle = moodle(&site);

    // Step 1: courses by classification.
    let present = moodle.enrolled_courses(CourseClassification::InProgress).unwrap();
    assert_eq!(present.len(), 1);
    assert_eq!(present[0].id, 2);
    assert_eq!(present[0].short_name, "OS");
    assert_eq!(present[0].start_date.timestamp(), 1_693_526_400);
    assert_eq!(present[0].end_date, present[0].start_date);
    assert_eq!(moodle.enrolled_courses(CourseClassification::Past).unwrap()[0].id, 3);
    assert_eq!(moodle.enrolled_courses(CourseClassification::Future).unwrap()[0].id, 5);

    // Step 2: enrolled students.
    let students = moodle.enrolled_students(2).unwrap();
    assert_eq!(students.len(), 2);
    assert_eq!(students[0].code, "F1001");
    assert_eq!(students[0].group, "A B ");
    assert_eq!(students[0].role, "student");
    assert_eq!(students[1].group, "");
    assert_eq!(students[1].role, "");

    // Step 3: grade items, including the null-heavy course total.
    let grades = moodle.grade_items(mock_server::CURRENT_USER, 2).unwrap();
    assert_eq!(grades.len(), 1);
    let items = &grades[0].grade_items;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].grade_raw, Some(8.0));
    assert_eq!(items[0].item_module.as_deref(), Some("quiz"));
    assert!(items[0].grade_date_graded.is_some());
    assert_eq!(items[1].item_name, "");
    assert_eq!(items[1].category_id, None);
    assert_eq!(items[1].grade_date_submitted, None);
    assert_eq!(items[1].grade_date_graded, None);

    // Step 4: grade items with a warning.
    let err = moodle.grade_items(4, 2).unwrap_err();
    match err {
        ApiError::ServiceWarning(w) => assert_eq!(w.0[0].warningcode, "nogrades"),
        other => panic!("expected ServiceWarning, got {other:?}"),
    }

    // Step 5: unknown course is a Moodle exception.
    let err = moodle.enrolled_students(99).unwrap_err();
    assert!(matches!(err, ApiError::Exception { ref errorcode, .. } if errorcode == "invalidrecord"));
}

#[test]
fn quiz_attempt_lifecycle() {
    let site = start_server();
    let moodle = moodle(&site);

    // Step 1: list quizzes.
    let quizzes = moodle.quizzes(2).unwrap();
    assert_eq!(quizzes.len(), 1);
    let quiz = &quizzes[0];
    assert_eq!(quiz.name, "Week 1 quiz");
    assert_eq!(quiz.time_open.timestamp(), 0);
    assert_eq!(quiz.time_close.timestamp(), 1_704_000_000);
    assert!(quiz.visible);

    // Step 2: no attempts yet.
    assert!(moodle.user_attempts(quiz.id).unwrap().is_empty());

    // Step 3: start an attempt.
    let attempt = moodle.start_attempt(quiz.id).unwrap();
    assert_eq!(attempt.state, AttemptState::InProgress);
    assert_eq!(attempt.time_finish.timestamp(), 0);
    assert_eq!(attempt.sum_grades, None);

    // Step 4: starting again while in progress fails.
    let err = moodle.start_attempt(quiz.id).unwrap_err();
    assert!(matches!(err, ApiError::Exception { ref errorcode, .. } if errorcode == "attemptstillinprogress"));

    // Step 5: save without finishing.
    assert_eq!(
        moodle.process_attempt(attempt.id, false, false).unwrap(),
        AttemptState::InProgress
    );

    // Step 6: finish.
    assert_eq!(
        moodle.process_attempt(attempt.id, true, false).unwrap(),
        AttemptState::Finished
    );

    // Step 7: review.
    let review = moodle.attempt_review(attempt.id).unwrap();
    assert_eq!(review.grade, "8.00");
    assert_eq!(review.attempt.state, AttemptState::Finished);
    assert!(review.attempt.time_finish.timestamp() > 0);
    assert_eq!(review.questions.len(), 2);
    assert!(review.questions[1].flagged);

    // Step 8: the attempt is listed as finished.
    let attempts = moodle.user_attempts(quiz.id).unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].sum_grades, Some(8.0));
}

#[test]
fn unknown_course_in_quiz_listing_is_a_warning() {
    let site = start_server();
    let err = moodle(&site).quizzes(99).unwrap_err();
    assert!(matches!(err, ApiError::ServiceWarning(_)));
}

#[test]
fn bad_token_is_an_exception() {
    let site = start_server();
    let config = Config::for_site(&site).with_token("wrong");
    let err = Moodle::from_config(&config)
        .enrolled_courses(CourseClassification::Past)
        .unwrap_err();
    assert!(matches!(err, ApiError::Exception { ref errorcode, .. } if errorcode == "invalidtoken"));
}

#[test]
fn wrong_path_is_http_error() {
    let site = start_server();
    let moodle = Moodle::new(
        MoodleClient::new(&format!("{site}/nowhere")).with_token(mock_server::TOKEN),
        UreqTransport::new(),
    );
    let err = moodle.enrolled_students(2).unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 404, .. }));
}

#[test]
fn unreachable_server_is_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let moodle = Moodle::new(
        MoodleClient::new(&format!("http://{addr}/webservice/rest/server.php")),
        UreqTransport::with_timeout(Some(Duration::from_secs(5))),
    );
    let err = moodle.enrolled_students(2).unwrap_err();
    assert!(matches!(err, ApiError::Transport(TransportError::Unreachable(_))));
}

#[test]
fn silent_server_times_out() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept and hold connections without ever answering.
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming() {
            held.push(stream);
        }
    });

    let moodle = Moodle::new(
        MoodleClient::new(&format!("http://{addr}/webservice/rest/server.php")).with_token("t"),
        UreqTransport::with_timeout(Some(Duration::from_millis(200))),
    );
    let started = Instant::now();
    let err = moodle.enrolled_students(2).unwrap_err();
    assert!(matches!(err, ApiError::Transport(TransportError::TimedOut)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
}

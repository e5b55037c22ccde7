use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};
use tower::ServiceExt;

use crate::test_support::{self, TestContext};

struct Tokens {
    teacher: String,
    student: String,
}

fn tokens(ctx: &TestContext) -> Tokens {
    Tokens {
        teacher: test_support::bearer_token("teacher-1", "teacher", ctx.state.settings()),
        student: test_support::bearer_token("student-1", "student", ctx.state.settings()),
    }
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(test_support::json_request(method, uri, Some(token), body))
        .await
        .expect("response");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

async fn create_quiz(app: &Router, token: &str, extra: Value) -> String {
    let mut payload = json!({ "course_id": "course-1", "title": "Mechanics quiz" });
    if let (Some(target), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
        target.extend(extra.clone());
    }

    let (status, body) = call(app, Method::POST, "/api/v1/quizzes", token, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    body["id"].as_str().expect("quiz id").to_string()
}

async fn add_question(app: &Router, token: &str, quiz_id: &str, question: Value) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        &format!("/api/v1/quizzes/{quiz_id}/questions"),
        token,
        Some(question),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    body["id"].as_str().expect("question id").to_string()
}

async fn publish(app: &Router, token: &str, quiz_id: &str) -> Value {
    let (status, body) =
        call(app, Method::POST, &format!("/api/v1/quizzes/{quiz_id}/publish"), token, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    body
}

fn rfc3339(offset: Duration) -> String {
    (OffsetDateTime::now_utc() + offset).format(&Rfc3339).expect("format")
}

#[tokio::test]
async fn out_of_range_max_attempts_snaps_to_one() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    for requested in [0, 4, -2] {
        let (status, body) = call(
            &ctx.app,
            Method::POST,
            "/api/v1/quizzes",
            &tokens.teacher,
            Some(json!({ "course_id": "course-1", "title": "Clamp", "max_attempts": requested })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "response: {body}");
        assert_eq!(body["max_attempts"], 1);
        assert_eq!(body["is_published"], false);
        assert_eq!(body["total_points"], 0);
    }

    let quiz_id = create_quiz(&ctx.app, &tokens.teacher, json!({ "max_attempts": 2 })).await;
    let (status, body) = call(
        &ctx.app,
        Method::PATCH,
        &format!("/api/v1/quizzes/{quiz_id}"),
        &tokens.teacher,
        Some(json!({ "max_attempts": 9, "title": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["max_attempts"], 2);
    assert_eq!(body["title"], "Renamed");
}

#[tokio::test]
async fn publish_totals_points_and_freezes_questions() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    let quiz_id = create_quiz(&ctx.app, &tokens.teacher, json!({})).await;
    let mut question_ids = Vec::new();
    for points in [3, 5, 2] {
        question_ids.push(
            add_question(
                &ctx.app,
                &tokens.teacher,
                &quiz_id,
                json!({ "type": "true_false", "content": "Is g constant?", "answer": "true", "points": points }),
            )
            .await,
        );
    }

    let published = publish(&ctx.app, &tokens.teacher, &quiz_id).await;
    assert_eq!(published["total_points"], 10);
    assert_eq!(published["is_published"], true);

    let (status, body) = call(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/quizzes/{quiz_id}/questions"),
        &tokens.teacher,
        Some(json!({ "type": "true_false", "content": "Late", "answer": "false" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
    assert_eq!(body["code"], "conflict");

    let question_uri = format!("/api/v1/questions/{}", question_ids[0]);
    let (status, _) = call(
        &ctx.app,
        Method::PUT,
        &question_uri,
        &tokens.teacher,
        Some(json!({ "points": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&ctx.app, Method::DELETE, &question_uri, &tokens.teacher, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Republishing is allowed and recomputes.
    let again = publish(&ctx.app, &tokens.teacher, &quiz_id).await;
    assert_eq!(again["total_points"], 10);
}

#[tokio::test]
async fn question_validation_rejects_bad_shapes() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);
    let quiz_id = create_quiz(&ctx.app, &tokens.teacher, json!({})).await;
    let uri = format!("/api/v1/quizzes/{quiz_id}/questions");

    let too_many: Vec<String> = (0..11).map(|i| format!("option {i}")).collect();
    let cases = [
        json!({ "type": "essay", "content": "Discuss", "answer": "" }),
        json!({ "type": "single_choice", "content": "Pick", "answer": "A", "options": too_many }),
        json!({ "type": "single_choice", "content": "Pick", "answer": "A" }),
        json!({ "type": "multiple_choice", "content": "Pick", "answer": "A,B", "options": ["A", "B"] }),
        json!({ "type": "fill_blank", "content": "Fill", "answer": "x", "match_rule": "fuzzy" }),
    ];

    for case in cases {
        let (status, body) =
            call(&ctx.app, Method::POST, &uri, &tokens.teacher, Some(case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case {case} -> {body}");
        assert_eq!(body["code"], "invalid_input");
    }

    let (status, body) = call(
        &ctx.app,
        Method::POST,
        &uri,
        &tokens.teacher,
        Some(json!({ "type": "fill_blank", "content": "Fill", "answer": "x", "points": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["points"], 1);
    assert_eq!(body["match_rule"], "exact_trim");
}

#[tokio::test]
async fn student_flow_grades_and_limits_attempts() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    let quiz_id = create_quiz(
        &ctx.app,
        &tokens.teacher,
        json!({ "time_limit": 30, "max_attempts": 2 }),
    )
    .await;
    let choice_id = add_question(
        &ctx.app,
        &tokens.teacher,
        &quiz_id,
        json!({
            "type": "multiple_choice",
            "content": "Vector quantities?",
            "options": ["A", "B", "C"],
            "answer": "[\"A\",\"C\"]",
            "points": 4
        }),
    )
    .await;
    let blank_id = add_question(
        &ctx.app,
        &tokens.teacher,
        &quiz_id,
        json!({
            "type": "fill_blank",
            "content": "Capital of France?",
            "answer": "[\"Paris\",\"巴黎\"]",
            "match_rule": "exact_trim",
            "points": 2
        }),
    )
    .await;

    // Drafts are invisible to students.
    let (status, body) = call(
        &ctx.app,
        Method::GET,
        &format!("/api/v1/quizzes/{quiz_id}"),
        &tokens.student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "unavailable");

    publish(&ctx.app, &tokens.teacher, &quiz_id).await;

    let (status, detail) = call(
        &ctx.app,
        Method::GET,
        &format!("/api/v1/quizzes/{quiz_id}"),
        &tokens.student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    for question in detail["questions"].as_array().expect("questions") {
        assert!(question.get("answer").is_none(), "answer leaked: {question}");
    }

    let start_uri = format!("/api/v1/quizzes/{quiz_id}/start");
    let (status, started) = call(&ctx.app, Method::POST, &start_uri, &tokens.student, None).await;
    assert_eq!(status, StatusCode::OK, "response: {started}");
    assert_eq!(started["resumed"], false);
    assert_eq!(started["attempt"]["attempt_number"], 1);
    assert_eq!(started["attempt"]["max_score"], 6);
    assert_eq!(started["attempt"]["status"], "in_progress");

    let started_at = OffsetDateTime::parse(
        started["attempt"]["started_at"].as_str().expect("started_at"),
        &Rfc3339,
    )
    .expect("started_at");
    let deadline = OffsetDateTime::parse(
        started["attempt"]["deadline"].as_str().expect("deadline"),
        &Rfc3339,
    )
    .expect("deadline");
    assert_eq!(deadline - started_at, Duration::minutes(30));

    let (status, resumed) = call(&ctx.app, Method::POST, &start_uri, &tokens.student, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resumed["resumed"], true);
    assert_eq!(resumed["attempt"]["id"], started["attempt"]["id"]);

    // Once attempted, the quiz can no longer be unpublished.
    let (status, _) = call(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/quizzes/{quiz_id}/unpublish"),
        &tokens.teacher,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let submit_uri = format!("/api/v1/quizzes/{quiz_id}/submit");
    let answers = json!({ "answers": { choice_id.clone(): ["C", "A"], blank_id.clone(): " paris " } });
    let (status, submitted) =
        call(&ctx.app, Method::POST, &submit_uri, &tokens.student, Some(answers)).await;
    assert_eq!(status, StatusCode::OK, "response: {submitted}");
    assert_eq!(submitted["score"], 6);
    assert_eq!(submitted["max_score"], 6);
    assert_eq!(submitted["attempt"]["status"], "submitted");

    let (status, body) = call(
        &ctx.app,
        Method::POST,
        &submit_uri,
        &tokens.student,
        Some(json!({ "answers": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "response: {body}");

    let (status, second) = call(&ctx.app, Method::POST, &start_uri, &tokens.student, None).await;
    assert_eq!(status, StatusCode::OK, "response: {second}");
    assert_eq!(second["resumed"], false);
    assert_eq!(second["attempt"]["attempt_number"], 2);

    // The open second attempt counts toward the limit, so it cannot be reopened.
    let (status, body) = call(&ctx.app, Method::POST, &start_uri, &tokens.student, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "limit_exceeded");

    // No end time, so answers stay hidden from the student.
    let result_uri = format!("/api/v1/quizzes/{quiz_id}/result");
    let (status, result) = call(&ctx.app, Method::GET, &result_uri, &tokens.student, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["answers_revealed"], false);
    assert!(result.get("questions").is_none());
    assert!(result["attempts"][1].get("answer_snapshot").is_none());

    let (status, result) = call(&ctx.app, Method::GET, &result_uri, &tokens.teacher, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["attempts"].as_array().expect("attempts").len(), 2);
    assert!(result["questions"][0]["answer"].is_string());

    let (status, list) = call(
        &ctx.app,
        Method::GET,
        "/api/v1/courses/course-1/quizzes",
        &tokens.student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let row = list
        .as_array()
        .expect("list")
        .iter()
        .find(|item| item["id"] == quiz_id.as_str())
        .expect("quiz listed");
    assert_eq!(row["attempt_count"], 2);
    assert_eq!(row["best_score"], 6);

    let (status, stats) =
        call(&ctx.app, Method::GET, "/api/v1/me/quiz-stats", &tokens.student, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["quizzes_taken"], 1);
    assert_eq!(stats["quizzes_avg_score"], 100.0);
}

#[tokio::test]
async fn window_and_reveal_rules() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    let future = create_quiz(
        &ctx.app,
        &tokens.teacher,
        json!({ "start_time": rfc3339(Duration::hours(1)), "end_time": rfc3339(Duration::hours(2)) }),
    )
    .await;
    publish(&ctx.app, &tokens.teacher, &future).await;
    let (status, body) = call(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/quizzes/{future}/start"),
        &tokens.student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "unavailable");

    let closed = create_quiz(
        &ctx.app,
        &tokens.teacher,
        json!({
            "start_time": rfc3339(Duration::hours(-3)),
            "end_time": rfc3339(Duration::hours(-1)),
            "show_answer_after_end": true
        }),
    )
    .await;
    add_question(
        &ctx.app,
        &tokens.teacher,
        &closed,
        json!({ "type": "single_choice", "content": "Unit of force?", "options": ["N", "J"], "answer": "N" }),
    )
    .await;
    publish(&ctx.app, &tokens.teacher, &closed).await;

    let (status, body) = call(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/quizzes/{closed}/start"),
        &tokens.student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Quiz has ended");

    let (status, result) = call(
        &ctx.app,
        Method::GET,
        &format!("/api/v1/quizzes/{closed}/result"),
        &tokens.student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["answers_revealed"], true);
    assert_eq!(result["questions"][0]["answer"], "N");

    let (status, body) = call(
        &ctx.app,
        Method::PATCH,
        &format!("/api/v1/quizzes/{closed}"),
        &tokens.teacher,
        Some(json!({ "end_time": rfc3339(Duration::hours(-5)) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, body) = call(
        &ctx.app,
        Method::PATCH,
        &format!("/api/v1/quizzes/{closed}"),
        &tokens.teacher,
        Some(json!({ "end_time": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["end_time"], Value::Null);
}

#[tokio::test]
async fn concurrent_starts_share_one_attempt() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    // Room for a second attempt, so a start that runs after the first commits
    // resumes instead of hitting the limit.
    let quiz_id = create_quiz(&ctx.app, &tokens.teacher, json!({ "max_attempts": 2 })).await;
    publish(&ctx.app, &tokens.teacher, &quiz_id).await;

    let uri = format!("/api/v1/quizzes/{quiz_id}/start");
    let (first, second) = tokio::join!(
        call(&ctx.app, Method::POST, &uri, &tokens.student, None),
        call(&ctx.app, Method::POST, &uri, &tokens.student, None),
    );

    assert_eq!(first.0, StatusCode::OK, "response: {}", first.1);
    assert_eq!(second.0, StatusCode::OK, "response: {}", second.1);
    assert_eq!(first.1["attempt"]["id"], second.1["attempt"]["id"]);
    assert_eq!(first.1["attempt"]["attempt_number"], 1);

    let mut flags = [first.1["resumed"].clone(), second.1["resumed"].clone()];
    flags.sort_by_key(|flag| flag.as_bool());
    assert_eq!(flags, [json!(false), json!(true)]);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = $1")
        .bind(&quiz_id)
        .fetch_one(ctx.state.db())
        .await
        .expect("count");
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn late_submission_is_refused_without_score() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    let quiz_id = create_quiz(&ctx.app, &tokens.teacher, json!({})).await;
    publish(&ctx.app, &tokens.teacher, &quiz_id).await;

    let (status, started) = call(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/quizzes/{quiz_id}/start"),
        &tokens.student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let attempt_id = started["attempt"]["id"].as_str().expect("attempt id").to_string();

    sqlx::query("UPDATE quiz_attempts SET deadline = deadline - INTERVAL '2 days' WHERE id = $1")
        .bind(&attempt_id)
        .execute(ctx.state.db())
        .await
        .expect("backdate");

    let (status, body) = call(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/quizzes/{quiz_id}/submit"),
        &tokens.student,
        Some(json!({ "answers": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "limit_exceeded");

    // The write itself refuses a passed deadline, whatever the caller checked.
    let recorded = crate::repositories::attempts::record_submission(
        ctx.state.db(),
        crate::repositories::attempts::RecordSubmission {
            id: &attempt_id,
            answers: json!({}),
            answer_snapshot: Vec::new(),
            score: 0,
            submitted_at: crate::core::time::primitive_now_utc(),
        },
    )
    .await
    .expect("record");
    assert!(!recorded);

    let score: Option<i32> = sqlx::query_scalar("SELECT score FROM quiz_attempts WHERE id = $1")
        .bind(&attempt_id)
        .fetch_one(ctx.state.db())
        .await
        .expect("score");
    assert!(score.is_none());
}

#[tokio::test]
async fn delete_removes_children() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    let quiz_id = create_quiz(&ctx.app, &tokens.teacher, json!({})).await;
    add_question(
        &ctx.app,
        &tokens.teacher,
        &quiz_id,
        json!({ "type": "true_false", "content": "Light is a wave?", "answer": "true" }),
    )
    .await;
    publish(&ctx.app, &tokens.teacher, &quiz_id).await;
    let (status, _) = call(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/quizzes/{quiz_id}/start"),
        &tokens.student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/v1/quizzes/{quiz_id}");
    let (status, _) = call(&ctx.app, Method::DELETE, &uri, &tokens.teacher, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for table in ["questions", "quiz_attempts"] {
        let rows: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE quiz_id = $1"))
                .bind(&quiz_id)
                .fetch_one(ctx.state.db())
                .await
                .expect("count");
        assert_eq!(rows, 0, "{table} left behind");
    }

    let (status, _) = call(&ctx.app, Method::GET, &uri, &tokens.teacher, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn start_at_attempt_limit_is_refused_even_when_open() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    let quiz_id = create_quiz(&ctx.app, &tokens.teacher, json!({ "max_attempts": 1 })).await;
    publish(&ctx.app, &tokens.teacher, &quiz_id).await;

    let uri = format!("/api/v1/quizzes/{quiz_id}/start");
    let (status, first) = call(&ctx.app, Method::POST, &uri, &tokens.student, None).await;
    assert_eq!(status, StatusCode::OK, "response: {first}");
    assert_eq!(first["resumed"], false);

    let (status, body) = call(&ctx.app, Method::POST, &uri, &tokens.student, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "response: {body}");
    assert_eq!(body["code"], "limit_exceeded");
}

#[tokio::test]
async fn unpublish_waits_for_inflight_start() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    let quiz_id = create_quiz(&ctx.app, &tokens.teacher, json!({})).await;
    publish(&ctx.app, &tokens.teacher, &quiz_id).await;

    // Same locking as a start: share lock on the quiz, then the insert.
    let mut tx = ctx.state.db().begin().await.expect("begin");
    sqlx::query("SELECT id FROM quizzes WHERE id = $1 FOR SHARE")
        .bind(&quiz_id)
        .execute(&mut *tx)
        .await
        .expect("share lock");
    sqlx::query(
        "INSERT INTO quiz_attempts (
            id, quiz_id, student_id, attempt_number, started_at, deadline, max_score,
            created_at, updated_at
        ) VALUES ($1, $2, 'student-1', 1, NOW(), NOW() + INTERVAL '1 hour', 0, NOW(), NOW())",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&quiz_id)
    .execute(&mut *tx)
    .await
    .expect("insert attempt");

    let app = ctx.app.clone();
    let teacher = tokens.teacher.clone();
    let uri = format!("/api/v1/quizzes/{quiz_id}/unpublish");
    let unpublish = tokio::spawn(async move { call(&app, Method::POST, &uri, &teacher, None).await });

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert!(!unpublish.is_finished(), "unpublish did not wait for the start");
    tx.commit().await.expect("commit");

    let (status, body) = unpublish.await.expect("join");
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
    assert_eq!(body["code"], "conflict");

    let published: bool = sqlx::query_scalar("SELECT is_published FROM quizzes WHERE id = $1")
        .bind(&quiz_id)
        .fetch_one(ctx.state.db())
        .await
        .expect("quiz");
    assert!(published);
}

#[tokio::test]
async fn result_ordering_differs_for_staff_and_students() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    let quiz_id = create_quiz(&ctx.app, &tokens.teacher, json!({ "max_attempts": 3 })).await;
    let question_id = add_question(
        &ctx.app,
        &tokens.teacher,
        &quiz_id,
        json!({ "type": "true_false", "content": "Sound travels in vacuum?", "answer": "false", "points": 5 }),
    )
    .await;
    publish(&ctx.app, &tokens.teacher, &quiz_id).await;

    let start_uri = format!("/api/v1/quizzes/{quiz_id}/start");
    let submit_uri = format!("/api/v1/quizzes/{quiz_id}/submit");
    for answer in ["true", "false"] {
        let (status, _) = call(&ctx.app, Method::POST, &start_uri, &tokens.student, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(
            &ctx.app,
            Method::POST,
            &submit_uri,
            &tokens.student,
            Some(json!({ "answers": { question_id.clone(): answer } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
    }
    // Third attempt stays open and ungraded.
    let (status, _) = call(&ctx.app, Method::POST, &start_uri, &tokens.student, None).await;
    assert_eq!(status, StatusCode::OK);

    let result_uri = format!("/api/v1/quizzes/{quiz_id}/result");

    let (status, staff) = call(&ctx.app, Method::GET, &result_uri, &tokens.teacher, None).await;
    assert_eq!(status, StatusCode::OK);
    let scores: Vec<Value> = staff["attempts"]
        .as_array()
        .expect("attempts")
        .iter()
        .map(|attempt| attempt["score"].clone())
        .collect();
    assert_eq!(scores, vec![json!(5), json!(0), Value::Null]);

    let (status, own) = call(&ctx.app, Method::GET, &result_uri, &tokens.student, None).await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<Value> = own["attempts"]
        .as_array()
        .expect("attempts")
        .iter()
        .map(|attempt| attempt["attempt_number"].clone())
        .collect();
    assert_eq!(numbers, vec![json!(3), json!(2), json!(1)]);
}

#[tokio::test]
async fn listing_hides_drafts_from_students() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    let draft = create_quiz(&ctx.app, &tokens.teacher, json!({ "course_id": "course-optics" })).await;
    let live = create_quiz(&ctx.app, &tokens.teacher, json!({ "course_id": "course-optics" })).await;
    publish(&ctx.app, &tokens.teacher, &live).await;

    let uri = "/api/v1/courses/course-optics/quizzes";

    let (status, staff) = call(&ctx.app, Method::GET, uri, &tokens.teacher, None).await;
    assert_eq!(status, StatusCode::OK);
    let staff_ids: Vec<&str> = staff
        .as_array()
        .expect("list")
        .iter()
        .filter_map(|quiz| quiz["id"].as_str())
        .collect();
    assert_eq!(staff_ids.len(), 2);
    assert!(staff_ids.contains(&draft.as_str()));
    assert!(staff_ids.contains(&live.as_str()));

    let (status, student) = call(&ctx.app, Method::GET, uri, &tokens.student, None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = student.as_array().expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], live.as_str());
    assert_eq!(rows[0]["attempt_count"], 0);
    assert_eq!(rows[0]["best_score"], Value::Null);
}

#[tokio::test]
async fn frozen_quiz_wins_over_payload_errors() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let tokens = tokens(&ctx);

    let quiz_id = create_quiz(&ctx.app, &tokens.teacher, json!({})).await;
    let question_id = add_question(
        &ctx.app,
        &tokens.teacher,
        &quiz_id,
        json!({ "type": "single_choice", "content": "Unit of charge?", "options": ["C", "A"], "answer": "C" }),
    )
    .await;
    publish(&ctx.app, &tokens.teacher, &quiz_id).await;

    let (status, body) = call(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/quizzes/{quiz_id}/questions"),
        &tokens.teacher,
        Some(json!({ "type": "essay", "content": "", "answer": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
    assert_eq!(body["code"], "conflict");

    let (status, body) = call(
        &ctx.app,
        Method::PATCH,
        &format!("/api/v1/questions/{question_id}"),
        &tokens.teacher,
        Some(json!({ "content": "", "match_rule": "fuzzy", "options": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
    assert_eq!(body["code"], "conflict");
}

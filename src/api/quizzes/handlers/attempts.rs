use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{require_permission, CurrentUser};
use crate::api::validation::validate_answers_size;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::QuestionSnapshot;
use crate::repositories;
use crate::schemas::attempt::{
    AttemptResponse, QuizResultResponse, StartAttemptResponse, SubmitAttemptResponse,
    SubmitRequest,
};
use crate::schemas::quiz::QuizResponse;
use crate::services::attempt_policy::{
    answers_revealed, check_attempt_limit, check_deadline, check_start_window, compute_deadline,
    AttemptRejection,
};
use crate::services::grading::grade_submission;
use crate::services::permissions::Permission;

use super::super::helpers;

/// The attempt limit counts every attempt, including one still open, so a
/// student at the limit cannot reopen it. Below the limit an open attempt is
/// resumed rather than a new one created.
pub(in crate::api::quizzes) async fn start_quiz(
    Path(quiz_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<StartAttemptResponse>, ApiError> {
    let caller = require_permission(&user, Permission::QuizTake)?;
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let quiz = repositories::quizzes::find_by_id_for_share(&mut *tx, &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?;
    let Some(quiz) = quiz else {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    };

    check_start_window(&quiz, now)?;

    let prior = repositories::attempts::count_for_student(&mut *tx, &quiz.id, &caller.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
    check_attempt_limit(prior, quiz.max_attempts)?;

    let existing = repositories::attempts::find_in_progress(&mut *tx, &quiz.id, &caller.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?;

    let (attempt, resumed) = match existing {
        Some(attempt) => (attempt, true),
        None => {
            let attempt_number = i32::try_from(prior + 1)
                .map_err(|e| ApiError::internal(e, "Attempt number out of range"))?;
            let attempt_id = Uuid::new_v4().to_string();

            let created = repositories::attempts::create_if_no_active(
                &mut *tx,
                repositories::attempts::NewAttempt {
                    id: &attempt_id,
                    quiz_id: &quiz.id,
                    student_id: &caller.id,
                    attempt_number,
                    started_at: now,
                    deadline: compute_deadline(now, quiz.time_limit, quiz.end_time),
                    max_score: quiz.total_points,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create attempt"))?;

            // A concurrent start won the insert; hand back its attempt.
            let attempt = repositories::attempts::find_in_progress(&mut *tx, &quiz.id, &caller.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?;
            let Some(attempt) = attempt else {
                return Err(ApiError::Conflict("Attempt was modified concurrently".to_string()));
            };

            (attempt, !created)
        }
    };

    let questions = repositories::questions::list_by_quiz(&mut *tx, &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit attempt"))?;

    metrics::attempt_started(resumed);
    tracing::info!(
        user_id = %caller.id,
        quiz_id = %quiz.id,
        attempt_id = %attempt.id,
        attempt_number = attempt.attempt_number,
        resumed,
        action = "quiz_started",
        "Quiz attempt started"
    );

    Ok(Json(StartAttemptResponse {
        attempt: AttemptResponse::from_attempt(attempt, now, false),
        questions: helpers::question_responses(questions, false),
        resumed,
    }))
}

pub(in crate::api::quizzes) async fn submit_quiz(
    Path(quiz_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SubmitRequest>,
) -> Result<Json<SubmitAttemptResponse>, ApiError> {
    let caller = require_permission(&user, Permission::QuizTake)?;
    let now = primitive_now_utc();

    let attempt = repositories::attempts::find_in_progress(state.db(), &quiz_id, &caller.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?;
    let Some(attempt) = attempt else {
        return Err(ApiError::NotFound("No active attempt".to_string()));
    };

    check_deadline(&attempt, now)?;

    let answers = serde_json::Value::Object(payload.answers);
    validate_answers_size(&answers)?;

    let questions = repositories::questions::list_by_quiz(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let snapshot: Vec<QuestionSnapshot> = questions.iter().map(QuestionSnapshot::from).collect();

    let score = match answers.as_object() {
        Some(submitted) => grade_submission(&snapshot, submitted),
        None => 0,
    };

    let recorded = repositories::attempts::record_submission(
        state.db(),
        repositories::attempts::RecordSubmission {
            id: &attempt.id,
            answers,
            answer_snapshot: snapshot,
            score,
            submitted_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record submission"))?;

    let attempt = repositories::attempts::fetch_one_by_id(state.db(), &attempt.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?;
    if !recorded {
        if attempt.submitted_at.is_none() {
            return Err(AttemptRejection::DeadlinePassed.into());
        }
        return Err(ApiError::Conflict("Attempt already submitted".to_string()));
    }
    let max_score = attempt.max_score;

    metrics::attempt_submitted(score, max_score);
    tracing::info!(
        user_id = %caller.id,
        quiz_id = %quiz_id,
        attempt_id = %attempt.id,
        score,
        max_score,
        action = "quiz_submitted",
        "Quiz attempt submitted"
    );

    Ok(Json(SubmitAttemptResponse {
        attempt: AttemptResponse::from_attempt(attempt, now, false),
        score,
        max_score,
    }))
}

pub(in crate::api::quizzes) async fn get_quiz_result(
    Path(quiz_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizResultResponse>, ApiError> {
    let caller = require_permission(&user, Permission::QuizRead)?;
    let privileged = caller.role.is_privileged();
    let now = primitive_now_utc();

    let quiz = helpers::load_quiz(state.db(), &quiz_id).await?;
    if !privileged && !quiz.is_published {
        return Err(ApiError::Unavailable("Quiz is not available".to_string()));
    }

    let attempts = if privileged {
        repositories::attempts::list_by_quiz(state.db(), &quiz.id).await
    } else {
        repositories::attempts::list_for_student(state.db(), &quiz.id, &caller.id).await
    }
    .map_err(|e| ApiError::internal(e, "Failed to fetch attempts"))?;

    let revealed = privileged || answers_revealed(&quiz, now);
    let questions = if revealed {
        Some(helpers::load_questions(state.db(), &quiz.id, true).await?)
    } else {
        None
    };

    Ok(Json(QuizResultResponse {
        quiz: QuizResponse::from(quiz),
        attempts: attempts
            .into_iter()
            .map(|attempt| AttemptResponse::from_attempt(attempt, now, revealed))
            .collect(),
        answers_revealed: revealed,
        questions,
    }))
}

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{require_permission, CurrentUser};
use crate::api::validation::validate_window;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::quizzes::UnpublishOutcome;
use crate::schemas::quiz::{
    QuizCreate, QuizDetailResponse, QuizListResponse, QuizResponse, QuizUpdate,
    StudentQuizListItem,
};
use crate::services::attempt_policy::{accepted_max_attempts_update, clamp_max_attempts};
use crate::services::permissions::Permission;

use super::super::helpers;

pub(in crate::api::quizzes) async fn list_quizzes(
    Path(course_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizListResponse>, ApiError> {
    let caller = require_permission(&user, Permission::QuizRead)?;
    let privileged = caller.role.is_privileged();

    let quizzes = repositories::quizzes::list_by_course(state.db(), &course_id, !privileged)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;

    if privileged {
        return Ok(Json(QuizListResponse::Staff(
            quizzes.into_iter().map(QuizResponse::from).collect(),
        )));
    }

    let quiz_ids: Vec<String> = quizzes.iter().map(|quiz| quiz.id.clone()).collect();
    let summaries = repositories::attempts::summaries_for_student(state.db(), &caller.id, &quiz_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt summaries"))?;
    let mut summaries: HashMap<String, _> =
        summaries.into_iter().map(|summary| (summary.quiz_id.clone(), summary)).collect();

    let items = quizzes
        .into_iter()
        .map(|quiz| {
            let summary = summaries.remove(&quiz.id);
            StudentQuizListItem {
                attempt_count: summary.as_ref().map_or(0, |s| s.attempt_count),
                best_score: summary.and_then(|s| s.best_score),
                quiz: QuizResponse::from(quiz),
            }
        })
        .collect();

    Ok(Json(QuizListResponse::Student(items)))
}

pub(in crate::api::quizzes) async fn create_quiz(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    let caller = require_permission(&user, Permission::QuizWrite)?;

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_window(payload.start_time, payload.end_time)?;

    let quiz_id = Uuid::new_v4().to_string();
    let now = primitive_now_utc();

    repositories::quizzes::create(
        state.db(),
        repositories::quizzes::CreateQuiz {
            id: &quiz_id,
            course_id: payload.course_id.trim(),
            created_by: &caller.id,
            title: payload.title.trim(),
            description: &payload.description,
            time_limit: payload.time_limit,
            start_time: payload.start_time,
            end_time: payload.end_time,
            max_attempts: clamp_max_attempts(payload.max_attempts),
            show_answer_after_end: payload.show_answer_after_end,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create quiz"))?;

    let quiz = repositories::quizzes::fetch_one_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?;

    tracing::info!(
        user_id = %caller.id,
        quiz_id = %quiz.id,
        course_id = %quiz.course_id,
        action = "quiz_created",
        "Quiz created"
    );

    Ok((StatusCode::CREATED, Json(QuizResponse::from(quiz))))
}

pub(in crate::api::quizzes) async fn get_quiz(
    Path(quiz_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizDetailResponse>, ApiError> {
    let caller = require_permission(&user, Permission::QuizRead)?;
    let privileged = caller.role.is_privileged();

    let quiz = helpers::load_quiz(state.db(), &quiz_id).await?;
    if !privileged && !quiz.is_published {
        return Err(ApiError::Unavailable("Quiz is not available".to_string()));
    }

    let questions = helpers::load_questions(state.db(), &quiz.id, privileged).await?;

    Ok(Json(QuizDetailResponse { quiz: QuizResponse::from(quiz), questions }))
}

pub(in crate::api::quizzes) async fn update_quiz(
    Path(quiz_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QuizUpdate>,
) -> Result<Json<QuizResponse>, ApiError> {
    let caller = require_permission(&user, Permission::QuizWrite)?;

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let quiz = helpers::load_quiz(state.db(), &quiz_id).await?;

    let effective_start = payload.start_time.unwrap_or(quiz.start_time);
    let effective_end = payload.end_time.unwrap_or(quiz.end_time);
    validate_window(effective_start, effective_end)?;

    if payload.max_attempts.is_some() && accepted_max_attempts_update(payload.max_attempts).is_none() {
        tracing::debug!(quiz_id = %quiz.id, requested = ?payload.max_attempts, "Ignoring max_attempts outside 1-3");
    }

    repositories::quizzes::update(
        state.db(),
        &quiz.id,
        repositories::quizzes::UpdateQuiz {
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            time_limit: payload.time_limit,
            start_time: payload.start_time,
            end_time: payload.end_time,
            max_attempts: accepted_max_attempts_update(payload.max_attempts),
            show_answer_after_end: payload.show_answer_after_end,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update quiz"))?;

    let quiz = repositories::quizzes::fetch_one_by_id(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?;

    tracing::info!(user_id = %caller.id, quiz_id = %quiz.id, action = "quiz_updated", "Quiz updated");

    Ok(Json(QuizResponse::from(quiz)))
}

pub(in crate::api::quizzes) async fn delete_quiz(
    Path(quiz_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let caller = require_permission(&user, Permission::QuizWrite)?;

    let deleted = repositories::quizzes::delete_with_children(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete quiz"))?;
    if !deleted {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    }

    tracing::info!(user_id = %caller.id, quiz_id = %quiz_id, action = "quiz_deleted", "Quiz deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub(in crate::api::quizzes) async fn publish_quiz(
    Path(quiz_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizResponse>, ApiError> {
    let caller = require_permission(&user, Permission::QuizWrite)?;

    let quiz = repositories::quizzes::publish(state.db(), &quiz_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to publish quiz"))?;
    let Some(quiz) = quiz else {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    };

    tracing::info!(
        user_id = %caller.id,
        quiz_id = %quiz.id,
        total_points = quiz.total_points,
        action = "quiz_published",
        "Quiz published"
    );

    Ok(Json(QuizResponse::from(quiz)))
}

pub(in crate::api::quizzes) async fn unpublish_quiz(
    Path(quiz_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizResponse>, ApiError> {
    let caller = require_permission(&user, Permission::QuizWrite)?;

    let outcome =
        repositories::quizzes::unpublish_if_unattempted(state.db(), &quiz_id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to unpublish quiz"))?;
    let quiz = match outcome {
        UnpublishOutcome::Unpublished(quiz) => quiz,
        UnpublishOutcome::HasAttempts => {
            return Err(ApiError::Conflict(
                "Quiz already has attempts and cannot be unpublished".to_string(),
            ));
        }
        UnpublishOutcome::NotFound => return Err(ApiError::NotFound("Quiz not found".to_string())),
    };

    tracing::info!(user_id = %caller.id, quiz_id = %quiz.id, action = "quiz_unpublished", "Quiz unpublished");

    Ok(Json(QuizResponse::from(quiz)))
}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{require_permission, CurrentUser};
use crate::api::validation::{
    parse_match_rule, parse_question_type, validate_options, validate_question_shape,
};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::quiz::{QuestionCreate, QuestionResponse, QuestionUpdate};
use crate::services::permissions::Permission;

use super::super::helpers::{self, QUESTIONS_FROZEN};

pub(in crate::api::quizzes) async fn add_question(
    Path(quiz_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    let caller = require_permission(&user, Permission::QuizWrite)?;

    let quiz = helpers::load_quiz(state.db(), &quiz_id).await?;
    if quiz.is_published {
        return Err(ApiError::Conflict(QUESTIONS_FROZEN.to_string()));
    }

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let question_type = parse_question_type(&payload.question_type)?;
    let match_rule = parse_match_rule(payload.match_rule.as_deref())?;
    if let Some(options) = &payload.options {
        validate_options(options)?;
    }
    validate_question_shape(question_type, payload.options.as_deref(), &payload.answer)?;

    let question_id = Uuid::new_v4().to_string();
    let points = payload.points.max(1);

    let created = repositories::questions::create_in_draft(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &question_id,
            quiz_id: &quiz.id,
            question_type,
            content: &payload.content,
            options: payload.options,
            answer: &payload.answer,
            match_rule,
            points,
            order_num: payload.order_num,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;
    if !created {
        return Err(ApiError::Conflict(QUESTIONS_FROZEN.to_string()));
    }

    let question = repositories::questions::fetch_one_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?;

    tracing::info!(
        user_id = %caller.id,
        quiz_id = %quiz.id,
        question_id = %question.id,
        action = "question_added",
        "Question added"
    );

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_question(question, true))))
}

pub(in crate::api::quizzes) async fn update_question(
    Path(question_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let caller = require_permission(&user, Permission::QuizWrite)?;

    let question = helpers::load_question(state.db(), &question_id).await?;
    let quiz = helpers::load_quiz(state.db(), &question.quiz_id).await?;
    if quiz.is_published {
        return Err(ApiError::Conflict(QUESTIONS_FROZEN.to_string()));
    }

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let match_rule =
        payload.match_rule.as_deref().map(|rule| parse_match_rule(Some(rule))).transpose()?;
    if let Some(options) = &payload.options {
        validate_options(options)?;
    }

    // The merged question must still be well formed.
    let effective_options = payload
        .options
        .as_deref()
        .or_else(|| question.options.as_ref().map(|options| options.0.as_slice()));
    let effective_answer = payload.answer.as_deref().unwrap_or(&question.answer);
    validate_question_shape(question.question_type, effective_options, effective_answer)?;

    let updated = repositories::questions::update_in_draft(
        state.db(),
        &question.id,
        repositories::questions::UpdateQuestion {
            content: payload.content,
            options: payload.options,
            answer: payload.answer,
            match_rule,
            points: payload.points.filter(|points| *points > 0),
            order_num: payload.order_num,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?;
    if !updated {
        return Err(ApiError::Conflict(QUESTIONS_FROZEN.to_string()));
    }

    let question = repositories::questions::fetch_one_by_id(state.db(), &question.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?;

    tracing::info!(
        user_id = %caller.id,
        quiz_id = %question.quiz_id,
        question_id = %question.id,
        action = "question_updated",
        "Question updated"
    );

    Ok(Json(QuestionResponse::from_question(question, true)))
}

pub(in crate::api::quizzes) async fn delete_question(
    Path(question_id): Path<String>,
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let caller = require_permission(&user, Permission::QuizWrite)?;

    let question = helpers::load_question(state.db(), &question_id).await?;

    let deleted = repositories::questions::delete_in_draft(state.db(), &question.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if !deleted {
        return Err(ApiError::Conflict(QUESTIONS_FROZEN.to_string()));
    }

    tracing::info!(
        user_id = %caller.id,
        quiz_id = %question.quiz_id,
        question_id = %question.id,
        action = "question_deleted",
        "Question deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

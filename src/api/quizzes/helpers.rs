use sqlx::PgPool;

use crate::api::errors::ApiError;
use crate::db::models::{Question, Quiz};
use crate::repositories;
use crate::schemas::quiz::QuestionResponse;

pub(super) const QUESTIONS_FROZEN: &str = "Questions cannot change once the quiz is published";

pub(super) async fn load_quiz(pool: &PgPool, quiz_id: &str) -> Result<Quiz, ApiError> {
    let quiz = repositories::quizzes::find_by_id(pool, quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?;

    quiz.ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))
}

pub(super) async fn load_question(pool: &PgPool, question_id: &str) -> Result<Question, ApiError> {
    let question = repositories::questions::find_by_id(pool, question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?;

    question.ok_or_else(|| ApiError::NotFound("Question not found".to_string()))
}

pub(super) async fn load_questions(
    pool: &PgPool,
    quiz_id: &str,
    with_answers: bool,
) -> Result<Vec<QuestionResponse>, ApiError> {
    let questions = repositories::questions::list_by_quiz(pool, quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    Ok(question_responses(questions, with_answers))
}

pub(super) fn question_responses(
    questions: Vec<Question>,
    with_answers: bool,
) -> Vec<QuestionResponse> {
    questions
        .into_iter()
        .map(|question| QuestionResponse::from_question(question, with_answers))
        .collect()
}

use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Question;
use crate::db::types::{MatchRule, QuestionType};

pub(crate) const COLUMNS: &str = "\
    id, quiz_id, question_type, content, options, answer, match_rule, points, order_num, \
    created_at, updated_at";

// Every write below is conditional on the owning quiz being unpublished at
// the moment of the statement; `false` means the quiz was published.
const QUIZ_IS_DRAFT: &str =
    "EXISTS (SELECT 1 FROM quizzes WHERE quizzes.id = questions.quiz_id AND NOT quizzes.is_published)";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) question_type: QuestionType,
    pub(crate) content: &'a str,
    pub(crate) options: Option<Vec<String>>,
    pub(crate) answer: &'a str,
    pub(crate) match_rule: MatchRule,
    pub(crate) points: i32,
    pub(crate) order_num: i32,
    pub(crate) now: PrimitiveDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct UpdateQuestion {
    pub(crate) content: Option<String>,
    pub(crate) options: Option<Vec<String>>,
    pub(crate) answer: Option<String>,
    pub(crate) match_rule: Option<MatchRule>,
    pub(crate) points: Option<i32>,
    pub(crate) order_num: Option<i32>,
}

pub(crate) async fn create_in_draft(
    pool: &PgPool,
    question: CreateQuestion<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO questions (
            id, quiz_id, question_type, content, options, answer, match_rule, points, order_num,
            created_at, updated_at
        )
        SELECT $1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10
        WHERE EXISTS (SELECT 1 FROM quizzes WHERE id = $2 AND NOT is_published)",
    )
    .bind(question.id)
    .bind(question.quiz_id)
    .bind(question.question_type)
    .bind(question.content)
    .bind(question.options.map(Json))
    .bind(question.answer)
    .bind(question.match_rule)
    .bind(question.points)
    .bind(question.order_num)
    .bind(question.now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_by_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE quiz_id = $1 ORDER BY order_num ASC, created_at ASC"
    ))
    .bind(quiz_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn update_in_draft(
    pool: &PgPool,
    id: &str,
    params: UpdateQuestion,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&format!(
        "UPDATE questions SET
            content = COALESCE($1, content),
            options = COALESCE($2, options),
            answer = COALESCE($3, answer),
            match_rule = COALESCE($4, match_rule),
            points = COALESCE($5, points),
            order_num = COALESCE($6, order_num),
            updated_at = $7
         WHERE id = $8 AND {QUIZ_IS_DRAFT}"
    ))
    .bind(params.content)
    .bind(params.options.map(Json))
    .bind(params.answer)
    .bind(params.match_rule)
    .bind(params.points)
    .bind(params.order_num)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete_in_draft(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&format!("DELETE FROM questions WHERE id = $1 AND {QUIZ_IS_DRAFT}"))
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

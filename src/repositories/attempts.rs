use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{AttemptSummary, QuestionSnapshot, QuizAttempt};

pub(crate) const COLUMNS: &str = "\
    id, quiz_id, student_id, attempt_number, started_at, deadline, submitted_at, answers, \
    answer_snapshot, score, max_score, created_at, updated_at";

pub(crate) struct NewAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) deadline: PrimitiveDateTime,
    pub(crate) max_score: i32,
}

pub(crate) struct RecordSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) answers: serde_json::Value,
    pub(crate) answer_snapshot: Vec<QuestionSnapshot>,
    pub(crate) score: i32,
    pub(crate) submitted_at: PrimitiveDateTime,
}

/// Inserts unless the student already has an in-progress attempt (or the
/// attempt number is taken). `false` means another request won the race.
pub(crate) async fn create_if_no_active(
    executor: impl sqlx::PgExecutor<'_>,
    attempt: NewAttempt<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO quiz_attempts (
            id, quiz_id, student_id, attempt_number, started_at, deadline, max_score,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$5,$5)
        ON CONFLICT DO NOTHING",
    )
    .bind(attempt.id)
    .bind(attempt.quiz_id)
    .bind(attempt.student_id)
    .bind(attempt.attempt_number)
    .bind(attempt.started_at)
    .bind(attempt.deadline)
    .bind(attempt.max_score)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
    student_id: &str,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts
         WHERE quiz_id = $1 AND student_id = $2 AND submitted_at IS NULL"
    ))
    .bind(quiz_id)
    .bind(student_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<QuizAttempt, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!("SELECT {COLUMNS} FROM quiz_attempts WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn count_for_student(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
    student_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = $1 AND student_id = $2")
        .bind(quiz_id)
        .bind(student_id)
        .fetch_one(executor)
        .await
}

/// Staff view: highest scores first, ungraded attempts last.
pub(crate) async fn list_by_quiz(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts WHERE quiz_id = $1
         ORDER BY score DESC NULLS LAST, submitted_at ASC, attempt_number ASC"
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    quiz_id: &str,
    student_id: &str,
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts WHERE quiz_id = $1 AND student_id = $2
         ORDER BY attempt_number DESC"
    ))
    .bind(quiz_id)
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn summaries_for_student(
    pool: &PgPool,
    student_id: &str,
    quiz_ids: &[String],
) -> Result<Vec<AttemptSummary>, sqlx::Error> {
    if quiz_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, AttemptSummary>(
        "SELECT quiz_id, COUNT(*) AS attempt_count, MAX(score) AS best_score
         FROM quiz_attempts
         WHERE student_id = $1 AND quiz_id = ANY($2)
         GROUP BY quiz_id",
    )
    .bind(student_id)
    .bind(quiz_ids)
    .fetch_all(pool)
    .await
}

/// Terminal transition. Guarded on `submitted_at IS NULL` so a duplicate
/// submit cannot overwrite a recorded score, and on the deadline so grading
/// that straddles it is not recorded.
pub(crate) async fn record_submission(
    pool: &PgPool,
    submission: RecordSubmission<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE quiz_attempts SET
            answers = $1,
            answer_snapshot = $2,
            score = $3,
            submitted_at = $4,
            updated_at = $4
         WHERE id = $5 AND submitted_at IS NULL AND deadline >= $4",
    )
    .bind(Json(submission.answers))
    .bind(Json(submission.answer_snapshot))
    .bind(submission.score)
    .bind(submission.submitted_at)
    .bind(submission.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Count of submitted attempts and their mean percentage score. Attempts on
/// zero-point quizzes count as 0%.
pub(crate) async fn submitted_summary_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<(i64, f64), sqlx::Error> {
    sqlx::query_as::<_, (i64, f64)>(
        "SELECT COUNT(*),
                COALESCE(AVG(CASE
                    WHEN max_score > 0 AND score IS NOT NULL
                        THEN score::DOUBLE PRECISION / max_score * 100
                    ELSE 0
                END), 0)::DOUBLE PRECISION
         FROM quiz_attempts
         WHERE student_id = $1 AND submitted_at IS NOT NULL",
    )
    .bind(student_id)
    .fetch_one(pool)
    .await
}

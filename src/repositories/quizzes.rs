use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Quiz;

pub(crate) const COLUMNS: &str = "\
    id, course_id, created_by, title, description, time_limit, start_time, end_time, \
    max_attempts, show_answer_after_end, is_published, total_points, created_at, updated_at";

pub(crate) struct CreateQuiz<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) created_by: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) time_limit: i32,
    pub(crate) start_time: Option<PrimitiveDateTime>,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) max_attempts: i32,
    pub(crate) show_answer_after_end: bool,
    pub(crate) now: PrimitiveDateTime,
}

/// `None` leaves a column untouched. The window bounds are nested so that
/// `Some(None)` clears them.
#[derive(Debug, Default)]
pub(crate) struct UpdateQuiz {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) time_limit: Option<i32>,
    pub(crate) start_time: Option<Option<PrimitiveDateTime>>,
    pub(crate) end_time: Option<Option<PrimitiveDateTime>>,
    pub(crate) max_attempts: Option<i32>,
    pub(crate) show_answer_after_end: Option<bool>,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    quiz: CreateQuiz<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO quizzes (
            id, course_id, created_by, title, description, time_limit, start_time, end_time,
            max_attempts, show_answer_after_end, is_published, total_points, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,FALSE,0,$11,$11)",
    )
    .bind(quiz.id)
    .bind(quiz.course_id)
    .bind(quiz.created_by)
    .bind(quiz.title)
    .bind(quiz.description)
    .bind(quiz.time_limit)
    .bind(quiz.start_time)
    .bind(quiz.end_time)
    .bind(quiz.max_attempts)
    .bind(quiz.show_answer_after_end)
    .bind(quiz.now)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Holds a share lock on the row until the surrounding transaction ends, so
/// publish state cannot flip while an attempt is being created.
pub(crate) async fn find_by_id_for_share(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1 FOR SHARE"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
    published_only: bool,
) -> Result<Vec<Quiz>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM quizzes WHERE course_id = "));
    builder.push_bind(course_id);

    if published_only {
        builder.push(" AND is_published = TRUE");
    }

    builder.push(" ORDER BY created_at DESC, id");
    builder.build_query_as::<Quiz>().fetch_all(pool).await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuiz,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE quizzes SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            time_limit = COALESCE($3, time_limit),
            start_time = CASE WHEN $4 THEN $5 ELSE start_time END,
            end_time = CASE WHEN $6 THEN $7 ELSE end_time END,
            max_attempts = COALESCE($8, max_attempts),
            show_answer_after_end = COALESCE($9, show_answer_after_end),
            updated_at = $10
         WHERE id = $11",
    )
    .bind(params.title)
    .bind(params.description)
    .bind(params.time_limit)
    .bind(params.start_time.is_some())
    .bind(params.start_time.flatten())
    .bind(params.end_time.is_some())
    .bind(params.end_time.flatten())
    .bind(params.max_attempts)
    .bind(params.show_answer_after_end)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Recomputes `total_points` from the current questions in the same
/// statement that flips the flag. Returns `None` when the quiz is gone.
pub(crate) async fn publish(
    pool: &PgPool,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes SET
            is_published = TRUE,
            total_points = (SELECT COALESCE(SUM(points), 0)::INTEGER FROM questions WHERE quiz_id = $1),
            updated_at = $2
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub(crate) enum UnpublishOutcome {
    Unpublished(Quiz),
    HasAttempts,
    NotFound,
}

/// Takes the row lock first so any start still holding its share lock
/// finishes before the attempt count is read; the count then runs as its own
/// statement and sees every committed attempt.
pub(crate) async fn unpublish_if_unattempted(
    pool: &PgPool,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<UnpublishOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let locked: Option<String> =
        sqlx::query_scalar("SELECT id FROM quizzes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    if locked.is_none() {
        return Ok(UnpublishOutcome::NotFound);
    }

    let attempts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = $1")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    if attempts > 0 {
        return Ok(UnpublishOutcome::HasAttempts);
    }

    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes SET is_published = FALSE, updated_at = $2
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(UnpublishOutcome::Unpublished(quiz))
}

/// Attempts and questions go first; nothing is left pointing at a missing quiz.
pub(crate) async fn delete_with_children(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let attempts = sqlx::query("DELETE FROM quiz_attempts WHERE quiz_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let questions = sqlx::query("DELETE FROM questions WHERE quiz_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let deleted =
        sqlx::query("DELETE FROM quizzes WHERE id = $1").bind(id).execute(&mut *tx).await?;

    tx.commit().await?;

    tracing::debug!(quiz_id = %id, attempts, questions, "Removed quiz children");
    Ok(deleted.rows_affected() > 0)
}

pub(crate) async fn count_by_creator(pool: &PgPool, created_by: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE created_by = $1")
        .bind(created_by)
        .fetch_one(pool)
        .await
}

/// Published quizzes still open at `now` that the student has not submitted yet.
pub(crate) async fn list_pending_for_student(
    pool: &PgPool,
    student_id: &str,
    now: PrimitiveDateTime,
) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {COLUMNS} FROM quizzes q
         WHERE q.is_published = TRUE
           AND q.end_time > $2
           AND NOT EXISTS (
               SELECT 1 FROM quiz_attempts a
               WHERE a.quiz_id = q.id AND a.student_id = $1 AND a.submitted_at IS NOT NULL
           )
         ORDER BY q.end_time ASC"
    ))
    .bind(student_id)
    .bind(now)
    .fetch_all(pool)
    .await
}

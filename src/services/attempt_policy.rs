use serde::Serialize;
use thiserror::Error;
use time::{Duration, PrimitiveDateTime};

use crate::db::models::{Quiz, QuizAttempt};

pub(crate) const MIN_ATTEMPTS: i32 = 1;
pub(crate) const MAX_ATTEMPTS: i32 = 3;
/// Ceiling on any attempt, even for untimed quizzes without an end time.
const ATTEMPT_WINDOW: Duration = Duration::hours(24);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum AttemptRejection {
    #[error("Quiz is not available")]
    NotPublished,
    #[error("Quiz has not started yet")]
    NotStarted,
    #[error("Quiz has ended")]
    Ended,
    #[error("Maximum attempts reached")]
    MaxAttemptsReached,
    #[error("Attempt deadline has passed")]
    DeadlinePassed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AttemptStatus {
    InProgress,
    Expired,
    Submitted,
}

/// Out-of-range values snap to a single attempt on create.
pub(crate) fn clamp_max_attempts(requested: i32) -> i32 {
    if (MIN_ATTEMPTS..=MAX_ATTEMPTS).contains(&requested) {
        requested
    } else {
        MIN_ATTEMPTS
    }
}

/// On update an out-of-range value is dropped instead.
pub(crate) fn accepted_max_attempts_update(requested: Option<i32>) -> Option<i32> {
    requested.filter(|value| (MIN_ATTEMPTS..=MAX_ATTEMPTS).contains(value))
}

pub(crate) fn check_start_window(quiz: &Quiz, now: PrimitiveDateTime) -> Result<(), AttemptRejection> {
    if !quiz.is_published {
        return Err(AttemptRejection::NotPublished);
    }
    if quiz.start_time.is_some_and(|start| now < start) {
        return Err(AttemptRejection::NotStarted);
    }
    if quiz.end_time.is_some_and(|end| now > end) {
        return Err(AttemptRejection::Ended);
    }
    Ok(())
}

pub(crate) fn check_attempt_limit(prior_attempts: i64, max_attempts: i32) -> Result<(), AttemptRejection> {
    if prior_attempts >= i64::from(max_attempts) {
        Err(AttemptRejection::MaxAttemptsReached)
    } else {
        Ok(())
    }
}

/// min(now + 24h, now + time_limit when positive, end_time when set).
pub(crate) fn compute_deadline(
    now: PrimitiveDateTime,
    time_limit_minutes: i32,
    end_time: Option<PrimitiveDateTime>,
) -> PrimitiveDateTime {
    let mut deadline = now + ATTEMPT_WINDOW;

    if time_limit_minutes > 0 {
        deadline = deadline.min(now + Duration::minutes(i64::from(time_limit_minutes)));
    }
    if let Some(end) = end_time {
        deadline = deadline.min(end);
    }

    deadline
}

pub(crate) fn check_deadline(attempt: &QuizAttempt, now: PrimitiveDateTime) -> Result<(), AttemptRejection> {
    if now > attempt.deadline {
        Err(AttemptRejection::DeadlinePassed)
    } else {
        Ok(())
    }
}

/// Expiry is never stored; it is read off the clock.
pub(crate) fn attempt_status(attempt: &QuizAttempt, now: PrimitiveDateTime) -> AttemptStatus {
    match attempt.submitted_at {
        Some(_) => AttemptStatus::Submitted,
        None if now > attempt.deadline => AttemptStatus::Expired,
        None => AttemptStatus::InProgress,
    }
}

/// Students only see correct answers after a closed quiz that opted in.
pub(crate) fn answers_revealed(quiz: &Quiz, now: PrimitiveDateTime) -> bool {
    quiz.show_answer_after_end && quiz.end_time.is_some_and(|end| now > end)
}

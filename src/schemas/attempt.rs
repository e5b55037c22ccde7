use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::core::time::format_primitive;
use crate::db::models::{QuestionSnapshot, QuizAttempt};
use crate::schemas::quiz::{QuestionResponse, QuizResponse};
use crate::services::attempt_policy::{attempt_status, AttemptStatus};

/// Answers keyed by question id. Values are left as raw JSON; grading decides
/// what shape each question accepts.
#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    #[serde(default)]
    pub(crate) answers: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) student_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: String,
    pub(crate) deadline: String,
    pub(crate) submitted_at: Option<String>,
    pub(crate) answers: Option<serde_json::Value>,
    pub(crate) score: Option<i32>,
    pub(crate) max_score: i32,
    pub(crate) status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) answer_snapshot: Option<Vec<QuestionSnapshot>>,
}

impl AttemptResponse {
    pub(crate) fn from_attempt(
        attempt: QuizAttempt,
        now: PrimitiveDateTime,
        with_snapshot: bool,
    ) -> Self {
        let status = attempt_status(&attempt, now);
        let answer_snapshot =
            if with_snapshot { attempt.answer_snapshot.map(|snapshot| snapshot.0) } else { None };

        Self {
            id: attempt.id,
            quiz_id: attempt.quiz_id,
            student_id: attempt.student_id,
            attempt_number: attempt.attempt_number,
            started_at: format_primitive(attempt.started_at),
            deadline: format_primitive(attempt.deadline),
            submitted_at: attempt.submitted_at.map(format_primitive),
            answers: attempt.answers.map(|answers| answers.0),
            score: attempt.score,
            max_score: attempt.max_score,
            status,
            answer_snapshot,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StartAttemptResponse {
    pub(crate) attempt: AttemptResponse,
    pub(crate) questions: Vec<QuestionResponse>,
    pub(crate) resumed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitAttemptResponse {
    pub(crate) attempt: AttemptResponse,
    pub(crate) score: i32,
    pub(crate) max_score: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResultResponse {
    pub(crate) quiz: QuizResponse,
    pub(crate) attempts: Vec<AttemptResponse>,
    pub(crate) answers_revealed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) questions: Option<Vec<QuestionResponse>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::types::Json;
    use time::macros::datetime;

    use crate::db::types::{MatchRule, QuestionType};

    fn attempt(submitted: bool) -> QuizAttempt {
        QuizAttempt {
            id: "attempt-1".to_string(),
            quiz_id: "quiz-1".to_string(),
            student_id: "student-1".to_string(),
            attempt_number: 1,
            started_at: datetime!(2025-05-01 10:00),
            deadline: datetime!(2025-05-01 10:30),
            submitted_at: submitted.then_some(datetime!(2025-05-01 10:20)),
            answers: submitted.then(|| Json(json!({ "q-1": "4" }))),
            answer_snapshot: submitted.then(|| {
                Json(vec![QuestionSnapshot {
                    id: "q-1".to_string(),
                    question_type: QuestionType::SingleChoice,
                    content: "2 + 2?".to_string(),
                    options: Some(vec!["3".to_string(), "4".to_string()]),
                    answer: "4".to_string(),
                    match_rule: MatchRule::ExactTrim,
                    points: 1,
                    order_num: 0,
                }])
            }),
            score: submitted.then_some(1),
            max_score: 1,
            created_at: datetime!(2025-05-01 10:00),
            updated_at: datetime!(2025-05-01 10:00),
        }
    }

    #[test]
    fn status_is_read_off_the_clock() {
        let open = AttemptResponse::from_attempt(attempt(false), datetime!(2025-05-01 10:10), false);
        assert_eq!(open.status, AttemptStatus::InProgress);

        let late = AttemptResponse::from_attempt(attempt(false), datetime!(2025-05-01 11:00), false);
        assert_eq!(late.status, AttemptStatus::Expired);

        let done = AttemptResponse::from_attempt(attempt(true), datetime!(2025-05-01 11:00), false);
        assert_eq!(done.status, AttemptStatus::Submitted);
    }

    #[test]
    fn snapshot_hidden_unless_requested() {
        let hidden = serde_json::to_value(AttemptResponse::from_attempt(
            attempt(true),
            datetime!(2025-05-02 00:00),
            false,
        ))
        .expect("serialize");
        assert!(hidden.get("answer_snapshot").is_none());
        assert_eq!(hidden["status"], "submitted");
        assert_eq!(hidden["answers"], json!({ "q-1": "4" }));

        let shown = serde_json::to_value(AttemptResponse::from_attempt(
            attempt(true),
            datetime!(2025-05-02 00:00),
            true,
        ))
        .expect("serialize");
        assert_eq!(shown["answer_snapshot"][0]["answer"], "4");
    }

    #[test]
    fn submit_request_defaults_to_empty_answers() {
        let request: SubmitRequest = serde_json::from_value(json!({})).expect("payload");
        assert!(request.answers.is_empty());
    }
}

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{MatchRule, QuestionType};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Quiz {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) created_by: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) time_limit: i32,
    pub(crate) start_time: Option<PrimitiveDateTime>,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) max_attempts: i32,
    pub(crate) show_answer_after_end: bool,
    pub(crate) is_published: bool,
    pub(crate) total_points: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) content: String,
    pub(crate) options: Option<Json<Vec<String>>>,
    pub(crate) answer: String,
    pub(crate) match_rule: MatchRule,
    pub(crate) points: i32,
    pub(crate) order_num: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Frozen copy of a question as it was graded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct QuestionSnapshot {
    pub(crate) id: String,
    #[serde(rename = "type")]
    pub(crate) question_type: QuestionType,
    pub(crate) content: String,
    pub(crate) options: Option<Vec<String>>,
    pub(crate) answer: String,
    pub(crate) match_rule: MatchRule,
    pub(crate) points: i32,
    pub(crate) order_num: i32,
}

impl From<&Question> for QuestionSnapshot {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            question_type: question.question_type,
            content: question.content.clone(),
            options: question.options.as_ref().map(|options| options.0.clone()),
            answer: question.answer.clone(),
            match_rule: question.match_rule,
            points: question.points,
            order_num: question.order_num,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct QuizAttempt {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) student_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) deadline: PrimitiveDateTime,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) answers: Option<Json<serde_json::Value>>,
    pub(crate) answer_snapshot: Option<Json<Vec<QuestionSnapshot>>>,
    pub(crate) score: Option<i32>,
    pub(crate) max_score: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Per-quiz aggregate of one student's attempts, used by the student quiz list.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct AttemptSummary {
    pub(crate) quiz_id: String,
    pub(crate) attempt_count: i64,
    pub(crate) best_score: Option<i32>,
}

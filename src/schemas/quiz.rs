use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

use crate::core::time::{format_primitive, parse_datetime_flexible};
use crate::db::models::{Question, Quiz};
use crate::db::types::{MatchRule, QuestionType};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizCreate {
    #[serde(alias = "courseId")]
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub(crate) course_id: String,
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default, alias = "timeLimit")]
    #[validate(range(min = 0, message = "time_limit must be non-negative"))]
    pub(crate) time_limit: i32,
    #[serde(default, alias = "startTime", deserialize_with = "deserialize_option_datetime")]
    pub(crate) start_time: Option<PrimitiveDateTime>,
    #[serde(default, alias = "endTime", deserialize_with = "deserialize_option_datetime")]
    pub(crate) end_time: Option<PrimitiveDateTime>,
    #[serde(default, alias = "maxAttempts")]
    pub(crate) max_attempts: i32,
    #[serde(default, alias = "showAnswerAfterEnd")]
    pub(crate) show_answer_after_end: bool,
}

/// Absent fields stay untouched. `start_time` / `end_time` distinguish an
/// explicit `null` (clear the bound) from absence.
#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct QuizUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default, alias = "timeLimit")]
    #[validate(range(min = 0, message = "time_limit must be non-negative"))]
    pub(crate) time_limit: Option<i32>,
    #[serde(default, alias = "startTime", deserialize_with = "deserialize_patch_datetime")]
    pub(crate) start_time: Option<Option<PrimitiveDateTime>>,
    #[serde(default, alias = "endTime", deserialize_with = "deserialize_patch_datetime")]
    pub(crate) end_time: Option<Option<PrimitiveDateTime>>,
    #[serde(default, alias = "maxAttempts")]
    pub(crate) max_attempts: Option<i32>,
    #[serde(default, alias = "showAnswerAfterEnd")]
    pub(crate) show_answer_after_end: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(rename = "type", alias = "question_type")]
    pub(crate) question_type: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
    #[serde(default)]
    pub(crate) options: Option<Vec<String>>,
    pub(crate) answer: String,
    #[serde(default, alias = "matchRule")]
    pub(crate) match_rule: Option<String>,
    #[serde(default)]
    pub(crate) points: i32,
    #[serde(default, alias = "orderNum")]
    pub(crate) order_num: i32,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: Option<String>,
    #[serde(default)]
    pub(crate) options: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) answer: Option<String>,
    #[serde(default, alias = "matchRule")]
    pub(crate) match_rule: Option<String>,
    #[serde(default)]
    pub(crate) points: Option<i32>,
    #[serde(default, alias = "orderNum")]
    pub(crate) order_num: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) created_by: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) time_limit: i32,
    pub(crate) start_time: Option<String>,
    pub(crate) end_time: Option<String>,
    pub(crate) max_attempts: i32,
    pub(crate) show_answer_after_end: bool,
    pub(crate) is_published: bool,
    pub(crate) total_points: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Quiz> for QuizResponse {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            course_id: quiz.course_id,
            created_by: quiz.created_by,
            title: quiz.title,
            description: quiz.description,
            time_limit: quiz.time_limit,
            start_time: quiz.start_time.map(format_primitive),
            end_time: quiz.end_time.map(format_primitive),
            max_attempts: quiz.max_attempts,
            show_answer_after_end: quiz.show_answer_after_end,
            is_published: quiz.is_published,
            total_points: quiz.total_points,
            created_at: format_primitive(quiz.created_at),
            updated_at: format_primitive(quiz.updated_at),
        }
    }
}

/// Student listing row: the quiz plus the caller's own attempt summary.
#[derive(Debug, Serialize)]
pub(crate) struct StudentQuizListItem {
    #[serde(flatten)]
    pub(crate) quiz: QuizResponse,
    pub(crate) attempt_count: i64,
    pub(crate) best_score: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum QuizListResponse {
    Staff(Vec<QuizResponse>),
    Student(Vec<StudentQuizListItem>),
}

/// `answer` and `match_rule` are only present when the caller may see the key.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    #[serde(rename = "type")]
    pub(crate) question_type: QuestionType,
    pub(crate) content: String,
    pub(crate) options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) match_rule: Option<MatchRule>,
    pub(crate) points: i32,
    pub(crate) order_num: i32,
}

impl QuestionResponse {
    pub(crate) fn from_question(question: Question, with_answer: bool) -> Self {
        let (answer, match_rule) = if with_answer {
            (Some(question.answer), Some(question.match_rule))
        } else {
            (None, None)
        };

        Self {
            id: question.id,
            quiz_id: question.quiz_id,
            question_type: question.question_type,
            content: question.content,
            options: question.options.map(|options| options.0),
            answer,
            match_rule,
            points: question.points,
            order_num: question.order_num,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizDetailResponse {
    pub(crate) quiz: QuizResponse,
    pub(crate) questions: Vec<QuestionResponse>,
}

fn parse_datetime<E: serde::de::Error>(raw: &str) -> Result<PrimitiveDateTime, E> {
    parse_datetime_flexible(raw).ok_or_else(|| E::custom(format!("invalid datetime: {raw}")))
}

fn deserialize_option_datetime<'de, D>(deserializer: D) -> Result<Option<PrimitiveDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_datetime(&raw).map(Some),
        None => Ok(None),
    }
}

fn deserialize_patch_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<Option<PrimitiveDateTime>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_option_datetime(deserializer).map(Some)
}

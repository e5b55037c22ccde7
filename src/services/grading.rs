//! Deterministic all-or-nothing grading. Nothing here returns an error:
//! malformed keys or submissions simply score zero.

use regex::RegexBuilder;
use serde_json::{Map, Value};

use crate::db::models::QuestionSnapshot;
use crate::db::types::{MatchRule, QuestionType};

const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Correct answer of one question, decoded into the shape its type expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AnswerKey {
    SingleChoice(String),
    TrueFalse(String),
    /// `None` when the stored key is not a JSON list of strings.
    MultipleChoice(Option<Vec<String>>),
    FillBlank { accepted: Vec<String>, rule: MatchRule },
}

impl AnswerKey {
    pub(crate) fn decode(question_type: QuestionType, answer: &str, rule: MatchRule) -> Self {
        match question_type {
            QuestionType::SingleChoice => Self::SingleChoice(answer.to_string()),
            QuestionType::TrueFalse => Self::TrueFalse(answer.to_string()),
            QuestionType::MultipleChoice => {
                Self::MultipleChoice(serde_json::from_str::<Vec<String>>(answer).ok())
            }
            QuestionType::FillBlank => Self::FillBlank {
                accepted: serde_json::from_str::<Vec<String>>(answer)
                    .unwrap_or_else(|_| vec![answer.to_string()]),
                rule,
            },
        }
    }

    pub(crate) fn accepts(&self, submitted: &Value) -> bool {
        match self {
            Self::SingleChoice(expected) | Self::TrueFalse(expected) => {
                submitted.as_str().is_some_and(|value| value == expected)
            }
            Self::MultipleChoice(expected) => {
                let (Some(expected), Some(submitted)) = (expected, choice_list(submitted)) else {
                    return false;
                };
                same_selection(expected, submitted)
            }
            Self::FillBlank { accepted, rule } => submitted
                .as_str()
                .is_some_and(|value| accepted.iter().any(|candidate| matches(*rule, value, candidate))),
        }
    }
}

pub(crate) fn grade_question(question: &QuestionSnapshot, submitted: &Value) -> i32 {
    let key = AnswerKey::decode(question.question_type, &question.answer, question.match_rule);
    if key.accepts(submitted) {
        question.points
    } else {
        0
    }
}

/// Sums points over `questions`; answers are looked up by question id and
/// unanswered questions contribute nothing.
pub(crate) fn grade_submission(questions: &[QuestionSnapshot], answers: &Map<String, Value>) -> i32 {
    questions
        .iter()
        .filter_map(|question| answers.get(&question.id).map(|value| grade_question(question, value)))
        .sum()
}

/// Lists arrive either as a JSON array or as a string holding one.
fn choice_list(submitted: &Value) -> Option<Vec<String>> {
    match submitted {
        Value::Array(_) => serde_json::from_value(submitted.clone()).ok(),
        Value::String(encoded) => serde_json::from_str(encoded).ok(),
        _ => None,
    }
}

fn same_selection(expected: &[String], mut submitted: Vec<String>) -> bool {
    let mut expected = expected.to_vec();
    expected.sort_unstable();
    submitted.sort_unstable();
    expected == submitted
}

fn matches(rule: MatchRule, submitted: &str, candidate: &str) -> bool {
    match rule {
        MatchRule::Exact => submitted == candidate,
        MatchRule::ExactTrim => {
            submitted.to_lowercase().trim() == candidate.to_lowercase().trim()
        }
        MatchRule::Contains => submitted.to_lowercase().contains(&candidate.to_lowercase()),
        MatchRule::Regex => RegexBuilder::new(candidate)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .is_ok_and(|pattern| pattern.is_match(submitted)),
    }
}

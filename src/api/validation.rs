use time::PrimitiveDateTime;

use crate::api::errors::ApiError;
use crate::db::types::{MatchRule, QuestionType};

pub(crate) const MAX_OPTIONS: usize = 10;
pub(crate) const MAX_OPTIONS_BYTES: usize = 10 * 1024;
pub(crate) const MAX_ANSWERS_BYTES: usize = 100 * 1024;

pub(crate) fn parse_question_type(value: &str) -> Result<QuestionType, ApiError> {
    QuestionType::parse(value.trim())
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported question type '{value}'")))
}

pub(crate) fn parse_match_rule(value: Option<&str>) -> Result<MatchRule, ApiError> {
    MatchRule::parse_or_default(value).ok_or_else(|| {
        ApiError::BadRequest(format!("Unsupported match rule '{}'", value.unwrap_or_default()))
    })
}

/// Size is measured on the JSON encoding that gets stored.
pub(crate) fn validate_options(options: &[String]) -> Result<(), ApiError> {
    if options.len() > MAX_OPTIONS {
        return Err(ApiError::BadRequest(format!("At most {MAX_OPTIONS} options are allowed")));
    }

    let encoded = serde_json::to_vec(options)
        .map_err(|_| ApiError::BadRequest("Options must be a list of strings".to_string()))?;
    if encoded.len() > MAX_OPTIONS_BYTES {
        return Err(ApiError::BadRequest(format!(
            "Options must not exceed {MAX_OPTIONS_BYTES} bytes"
        )));
    }

    Ok(())
}

pub(crate) fn validate_question_shape(
    question_type: QuestionType,
    options: Option<&[String]>,
    answer: &str,
) -> Result<(), ApiError> {
    if question_type.requires_options() && options.map_or(true, <[String]>::is_empty) {
        return Err(ApiError::BadRequest("Choice questions require options".to_string()));
    }

    if question_type == QuestionType::MultipleChoice
        && serde_json::from_str::<Vec<String>>(answer).is_err()
    {
        return Err(ApiError::BadRequest(
            "Multiple choice answer must be a JSON list of strings".to_string(),
        ));
    }

    Ok(())
}

pub(crate) fn validate_answers_size(answers: &serde_json::Value) -> Result<(), ApiError> {
    let encoded = serde_json::to_vec(answers)
        .map_err(|_| ApiError::BadRequest("Answers must be valid JSON".to_string()))?;
    if encoded.len() > MAX_ANSWERS_BYTES {
        return Err(ApiError::BadRequest(format!(
            "Answers must not exceed {MAX_ANSWERS_BYTES} bytes"
        )));
    }
    Ok(())
}

pub(crate) fn validate_window(
    start_time: Option<PrimitiveDateTime>,
    end_time: Option<PrimitiveDateTime>,
) -> Result<(), ApiError> {
    match (start_time, end_time) {
        (Some(start), Some(end)) if end <= start => {
            Err(ApiError::BadRequest("end_time must be after start_time".to_string()))
        }
        _ => Ok(()),
    }
}

use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questiontype", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    FillBlank,
}

impl QuestionType {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "single_choice" => Some(Self::SingleChoice),
            "multiple_choice" => Some(Self::MultipleChoice),
            "true_false" => Some(Self::TrueFalse),
            "fill_blank" => Some(Self::FillBlank),
            _ => None,
        }
    }

    pub(crate) fn requires_options(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }
}

/// String comparison used when grading `fill_blank` answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "matchrule", rename_all = "snake_case")]
pub(crate) enum MatchRule {
    Exact,
    ExactTrim,
    Contains,
    Regex,
}

impl MatchRule {
    /// Empty input selects the default rule; unknown names are rejected.
    pub(crate) fn parse_or_default(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim).unwrap_or_default() {
            "" | "exact_trim" => Some(Self::ExactTrim),
            "exact" => Some(Self::Exact),
            "contains" => Some(Self::Contains),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }
}

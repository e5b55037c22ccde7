use serde::Serialize;

use crate::schemas::quiz::QuizResponse;
use crate::services::permissions::Permission;

#[derive(Debug, Serialize)]
pub(crate) struct PermissionsResponse {
    pub(crate) user_id: String,
    pub(crate) role: String,
    pub(crate) permissions: Vec<Permission>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum QuizStatsResponse {
    Student {
        role: String,
        quizzes_taken: i64,
        quizzes_avg_score: f64,
        pending_quizzes: Vec<QuizResponse>,
    },
    Staff {
        role: String,
        quizzes_created: i64,
    },
}

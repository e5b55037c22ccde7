use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::me::{PermissionsResponse, QuizStatsResponse};
use crate::schemas::quiz::QuizResponse;
use crate::services::permissions::{self, Permission};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/permissions", get(my_permissions))
        .route("/quiz-stats", get(my_quiz_stats))
}

/// Any authenticated caller may see what their own role grants.
async fn my_permissions(user: CurrentUser) -> Json<PermissionsResponse> {
    let permissions = permissions::get_permissions(&user.role);
    Json(PermissionsResponse { user_id: user.id, role: user.role, permissions })
}

async fn my_quiz_stats(
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizStatsResponse>, ApiError> {
    let caller = require_permission(&user, Permission::UserStats)?;
    let role = caller.role.as_str().to_string();

    if caller.role.is_privileged() {
        let quizzes_created = repositories::quizzes::count_by_creator(state.db(), &caller.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count quizzes"))?;
        return Ok(Json(QuizStatsResponse::Staff { role, quizzes_created }));
    }

    let (quizzes_taken, quizzes_avg_score) =
        repositories::attempts::submitted_summary_for_student(state.db(), &caller.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to summarize attempts"))?;

    let pending =
        repositories::quizzes::list_pending_for_student(state.db(), &caller.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list pending quizzes"))?;

    Ok(Json(QuizStatsResponse::Student {
        role,
        quizzes_taken,
        quizzes_avg_score,
        pending_quizzes: pending.into_iter().map(QuizResponse::from).collect(),
    }))
}

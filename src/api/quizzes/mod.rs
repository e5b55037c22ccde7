mod handlers;
mod helpers;

use axum::{routing::get, routing::post, routing::put, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/courses/:course_id/quizzes", get(handlers::list_quizzes))
        .route("/quizzes", post(handlers::create_quiz))
        .route(
            "/quizzes/:quiz_id",
            get(handlers::get_quiz)
                .put(handlers::update_quiz)
                .patch(handlers::update_quiz)
                .delete(handlers::delete_quiz),
        )
        .route("/quizzes/:quiz_id/publish", post(handlers::publish_quiz))
        .route("/quizzes/:quiz_id/unpublish", post(handlers::unpublish_quiz))
        .route("/quizzes/:quiz_id/questions", post(handlers::add_question))
        .route(
            "/questions/:question_id",
            put(handlers::update_question)
                .patch(handlers::update_question)
                .delete(handlers::delete_question),
        )
        .route("/quizzes/:quiz_id/start", post(handlers::start_quiz))
        .route("/quizzes/:quiz_id/submit", post(handlers::submit_quiz))
        .route("/quizzes/:quiz_id/result", get(handlers::get_quiz_result))
}

#[cfg(test)]
mod tests;

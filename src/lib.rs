pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use crate::core::{config::Settings, security, state::AppState, telemetry};
use crate::services::collaborators::CollaboratorClient;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    if !settings.security().secret_key_from_env {
        tracing::warn!("SECRET_KEY not set; using a key generated on this host");
    }

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let collaborators = CollaboratorClient::from_settings(&settings)?;
    let state = AppState::new(settings, db_pool, collaborators);

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "Quizdesk API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    state.db().close().await;
    tracing::info!("Database pool closed");

    Ok(())
}

/// Signs a bearer token for `user_id` with the configured secret. Identity
/// issuance lives outside this service; this exists for operators and local
/// testing.
pub fn issue_token(user_id: &str, role: &str) -> anyhow::Result<String> {
    dotenvy::dotenv().ok();

    let role: services::permissions::Role =
        role.parse().map_err(|_| anyhow::anyhow!("unknown role '{role}'"))?;
    let settings = Settings::load()?;

    Ok(security::create_access_token(user_id, role.as_str(), &settings, None)?)
}

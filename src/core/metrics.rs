use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn attempt_started(resumed: bool) {
    let outcome = if resumed { "resumed" } else { "created" };
    metrics::counter!("quiz_attempts_started_total", "outcome" => outcome).increment(1);
}

pub(crate) fn attempt_submitted(score: i32, max_score: i32) {
    metrics::counter!("quiz_attempts_submitted_total").increment(1);
    if max_score > 0 {
        metrics::histogram!("quiz_attempt_score_ratio").record(f64::from(score) / f64::from(max_score));
    }
}

use anyhow::Context;
use mindpulse::api::{self, app_state::AppState};
use mindpulse::clients::biometrics::FileBiometricSource;
use mindpulse::clients::chat_transport::HttpChatTransport;
use mindpulse::clients::notification::LogNotificationSink;
use mindpulse::config::loader::ConfigLoader;
use mindpulse::observability::{
    AppMetrics, HealthCheckResult, ObservabilityState, create_observability_router, init_tracing,
};
use mindpulse::storage::settings_store::FileSettingsStore;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging)?;
    ConfigLoader::validate(&config)?;
    info!(
        environment = %config.environment,
        model = %config.chat.model,
        "Starting MindPulse..."
    );

    if config.chat.api_key.is_empty() {
        warn!("chat.api_key is empty, model requests will be rejected upstream");
    }

    let metrics = Arc::new(AppMetrics::default());
    let transport = HttpChatTransport::from_config(&config.chat)?;
    let state = AppState::assemble(
        Arc::new(FileSettingsStore::new(config.storage.settings_path.clone())),
        Arc::new(transport),
        Arc::new(FileBiometricSource::new(config.storage.biometrics_path.clone())),
        Arc::new(LogNotificationSink),
        &config.chat,
        metrics.clone(),
    );
    info!("Services initialized");

    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        metrics,
    ));
    let settings_check = match state.settings.snapshot().await {
        Ok(settings) => {
            let missing = settings.missing();
            if !missing.is_empty() {
                warn!(?missing, "settings incomplete, check-ins will be skipped until set");
            }
            if config.scheduler.autostart {
                state
                    .scheduler
                    .start(settings.preferences.fetch_interval());
            }
            HealthCheckResult {
                name: "settings_store".to_string(),
                healthy: true,
                message: format!("{} missing item(s)", missing.len()),
            }
        }
        Err(e) => {
            warn!(error = %e, "settings store unavailable");
            HealthCheckResult {
                name: "settings_store".to_string(),
                healthy: false,
                message: e.to_string(),
            }
        }
    };
    observability_state.add_health_check(settings_check).await;

    let router = create_observability_router(observability_state)
        .merge(api::create_router(state.clone()));
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.scheduler.stop();
    info!("MindPulse stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

use service_core::observability::init_tracing;
use tutor_service::config::TutorConfig;
use tutor_service::services::init_metrics;
use tutor_service::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Make .env values visible to the tracing setup below.
    service_core::config::load_dotenv();

    init_metrics().map_err(|e| std::io::Error::other(format!("Metrics error: {}", e)))?;

    let otlp_endpoint = std::env::var("OTLP_ENDPOINT")
        .ok()
        .filter(|endpoint| !endpoint.trim().is_empty());
    init_tracing("tutor-service", "info", otlp_endpoint.as_deref());

    let config = TutorConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await.map_err(|e| {
        tracing::error!("HTTP server error: {}", e);
        e
    })?;

    tracing::info!("Tutor service stopped");
    Ok(())
}

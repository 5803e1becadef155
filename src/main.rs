use anyhow::Result;
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use study_buddy_backend::{build_app, config::Config, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("study_buddy_backend=debug,tower_http=debug")),
        )
        .init();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "conf.yaml".to_string());
    let config = Config::load(&config_path)?;
    info!("Loaded configuration (file: {}, optional)", config_path);

    if config.ai_config.api_key.is_empty() {
        warn!("GOOGLE_AI_API_KEY is not set; calls to the AI provider will fail");
    }
    info!(
        "Environment: {}, recognition strategy: {:?}, rate limiting: {}",
        config.system_config.environment,
        config.recognition_config.strategy,
        config.rate_limit_config.enabled
    );

    let app_state = AppState::new(config.clone())?;
    let app = build_app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.system_config.host, config.system_config.port).parse()?;
    info!("Starting AI Study Buddy server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use assistant_relay::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("assistant_relay=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "OpenAI API key configured: {}",
        if config.openai.api_key.is_some() { "Yes" } else { "No" }
    );
    info!(
        "OpenAI Assistant ID configured: {}",
        if config.openai.assistant_id.is_some() { "Yes" } else { "No" }
    );

    let app_state = AppState::new(config.clone())?;
    let app = build_router(app_state);

    let addr = config.bind_address();
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

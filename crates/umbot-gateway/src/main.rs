//! umbot gateway: one webhook endpoint per assistant platform, answered by the demo skill.

mod routes;
mod skill;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use umbot_core::{AppConfig, AppContext, Bot};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[umbot-gateway] .env not loaded: {} (using system environment)", e);
    }

    let config = AppConfig::load()?;

    std::fs::create_dir_all(&config.log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "umbot.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,umbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    let bind_addr = config.bind_addr.clone();
    let ctx = AppContext::new(config)?;
    let bot = Arc::new(Bot::new(Arc::new(ctx), Arc::new(skill::EchoSkill)));
    tracing::info!(
        target: "umbot::gateway",
        "platforms: {}",
        bot.registry().identifiers().join(", ")
    );

    let app = routes::router(bot);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(target: "umbot::gateway", "listening on {bind_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use reframe_core::chat::{ChatConfig, OpenAiChatClient};
use reframe_core::store::SessionStore;
use reframe_core::ReframeConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use reframe_server::http::{start_http_server, AppState};
use reframe_server::orchestrator::Orchestrator;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "reframe.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load config
    let config = match ReframeConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Chat backend — API key comes from OPENAI_API_KEY
    let chat_config = ChatConfig::new(
        None,
        config.chat.model.clone(),
        config.chat.max_tokens,
        Duration::from_secs(config.chat.timeout_seconds),
    );
    let backend = match OpenAiChatClient::new(chat_config) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Failed to create chat client: {} (is OPENAI_API_KEY set?)", e);
            std::process::exit(1);
        }
    };

    let orchestrator = Arc::new(Orchestrator::new(
        SessionStore::new(),
        backend,
        config.experiment.clone(),
    ));
    let state = Arc::new(AppState { orchestrator });

    // Shutdown on ctrl-c
    let (tx, rx) = broadcast::channel(1);
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = tx.send(());
    });

    start_http_server(state, &config.service, rx).await?;

    Ok(())
}

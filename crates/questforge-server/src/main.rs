//! HTTP server hosting the QuestForge game-master backend.
//!
//! Wires configuration, storage, the chat endpoint, and the chat/user
//! services into an axum router, then serves until interrupted.

mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use questforge_core::llm::providers::create_endpoint;
use questforge_core::{ChatService, LocalStorage, QuestForgeConfig, UserService};

use api::{build_router, AppState};

#[derive(Parser, Debug)]
#[clap(author, version, about = "QuestForge server - run the game-master backend")]
struct Cli {
    #[clap(long, short, default_value = "questforge.yaml", help = "Path to the configuration file")]
    config: String,

    #[clap(long, help = "Bind address, overrides the configuration file")]
    bind_addr: Option<String>,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let config = if tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
        log::info!("loading configuration from {}", cli.config);
        QuestForgeConfig::load(&cli.config).await?
    } else {
        log::warn!(
            "configuration file {} not found, using built-in defaults",
            cli.config
        );
        QuestForgeConfig::default()
    };

    let storage = Arc::new(LocalStorage::new(config.storage.root.clone()));
    let endpoint = create_endpoint(&config.llm)?;
    let chat = Arc::new(ChatService::new(
        storage.clone(),
        endpoint,
        config.agents.clone(),
        config.engine.max_tool_rounds,
    ));
    let users = Arc::new(UserService::new(storage));

    let bind_addr = cli.bind_addr.unwrap_or(config.server.bind_addr.clone());
    let bind_socket_addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address '{}': {}", bind_addr, e))?;

    let router = build_router(AppState { chat, users });

    log::info!("starting QuestForge server on {}", bind_socket_addr);
    let listener = tokio::net::TcpListener::bind(bind_socket_addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("QuestForge server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", e);
    }
    log::info!("shutdown signal received");
}

use std::sync::Arc;

use clap::Parser;
use painel_core::PainelConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use painel_server::http;
use painel_server::state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "painel.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience, production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match PainelConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level)),
        )
        .init();

    let store = match painel_core::db::create_store(&config.storage).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open {} storage: {}", config.storage.backend, e);
            std::process::exit(1);
        }
    };

    if args.health {
        match store.health().await {
            Ok(v) => println!("✅ Storage ({}) reachable: {}", store.name(), v),
            Err(e) => {
                println!("❌ Storage ({}) check failed: {}", store.name(), e);
                std::process::exit(1);
            }
        }
        println!("✅ Painel health check passed");
        return Ok(());
    }

    let state = match AppState::from_config(&config, store) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Failed to initialise collaborators: {:#}", e);
            std::process::exit(1);
        }
    };

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let addr = format!("{}:{}", config.http.host, config.http.port);
    http::start_http_server(state, addr, tx.subscribe()).await?;

    Ok(())
}

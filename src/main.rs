use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use doc_chat::api::{router, AppState};
use doc_chat::config::AppConfig;
use doc_chat::logging::init_logging;
use doc_chat::service::{ChatService, ChatSettings};
use doc_chat::{Database, HttpInferenceGateway};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the chat message API
    Serve {
        /// Address to listen on, overriding server.bind_address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Create the message tables if they are missing
    Migrate,
    /// Print the effective configuration as YAML
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
        config.validate()?;
    }

    let log_file = config.logging.file_path.as_ref().map(PathBuf::from);
    let _guard = init_logging(
        Some(&config.get_log_level()),
        log_file.as_deref(),
        config.logging.format == "json",
    )?;

    match cli.command {
        Commands::Serve { bind } => serve(config, bind).await,
        Commands::Migrate => {
            Database::new(&config.database.url, config.database.max_connections)
                .context("Failed to open database")?;
            info!(url = %config.database.url, "Migrations applied");
            Ok(())
        }
        Commands::ShowConfig => show_config(&config),
    }
}

#[allow(clippy::print_stdout)]
fn show_config(config: &AppConfig) -> Result<()> {
    print!("{}", config.to_yaml()?);
    Ok(())
}

async fn serve(config: AppConfig, bind: Option<String>) -> Result<()> {
    let db = Database::new(&config.database.url, config.database.max_connections)
        .context("Failed to open database")?;
    let gateway = HttpInferenceGateway::new(
        config.inference.server_host.clone(),
        config.inference.timeout_secs.map(Duration::from_secs),
    )
    .context("Failed to build inference client")?;
    if config.inference.server_host.is_none() {
        tracing::warn!("inference.server_host is not set; chat requests will fail");
    }

    let service = ChatService::new(db, Arc::new(gateway), ChatSettings::from(&config));
    let app = router(Arc::new(AppState { service }));

    let address = bind.unwrap_or_else(|| config.server.bind_address.clone());
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(%address, "Serving chat API");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

//! Main entry point for the quote collection service
//!
//! Loads configuration, sets up logging and serves the quote intake API
//! until SIGINT/SIGTERM.

use anyhow::Result;
use clap::Parser;
use quote_collection::config::AppConfig;
use quote_collection::service::{AppState, HttpServer, HttpServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Quote Collection Service - forwards quote requests to the admin inbox
#[derive(Parser)]
#[command(
    name = "quote-collection",
    version,
    about = "Receives quote requests over HTTP and emails them to an admin address",
    long_about = "Quote Collection accepts quote submissions as JSON on POST /api/quote, \
                 renders each one into an HTML email and dispatches it through an SMTP relay. \
                 Settings come from the environment (optionally a .env file) or a TOML file."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP port override
    #[arg(short, long, value_name = "PORT", help = "Override HTTP server port")]
    port: Option<u16>,

    /// HTTP host override
    #[arg(long, value_name = "HOST", help = "Override HTTP bind address")]
    host: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("{}", "=".repeat(50));
    info!("🚀 Dream Cleaning Quote System");
    info!("{}", "=".repeat(50));
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "✅ Server running on http://{}:{}",
        config.service.host, config.service.port
    );
    info!("   SMTP relay: {}:{}", config.smtp.host, config.smtp.port);
    info!(
        "   Admin inbox: {}",
        config.sender.admin_email.as_deref().unwrap_or("(not set)")
    );
    info!("📝 Collecting quotes and sending emails");
    info!("   POST /api/quote");
    info!("   GET  /api/health");
    info!("   GET  /metrics");
    info!("{}", "=".repeat(50));
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(port) = args.port {
        config.service.port = port;
    }

    if let Some(host) = &args.host {
        config.service.host = host.clone();
    }

    quote_collection::config::validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal in production
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    match dotenv {
        Ok(path) => info!(".env loaded from {}", path.display()),
        Err(e) => info!("No .env file loaded: {}", e),
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    let state = match AppState::new(config.clone()) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let server = Arc::new(HttpServer::new(
        HttpServerConfig {
            port: config.service.port,
            host: config.service.host.clone(),
        },
        state,
    ));

    let listener = match server.bind().await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to start HTTP server: {}", e);
            std::process::exit(1);
        }
    };

    display_startup_banner(&config);

    let server_task = {
        let server = server.clone();
        tokio::spawn(async move { server.serve(listener).await })
    };

    wait_for_shutdown_signal().await;
    info!("🛑 Shutdown signal received, beginning graceful shutdown...");
    server.stop();

    match tokio::time::timeout(config.shutdown_timeout(), server_task).await {
        Ok(Ok(Ok(()))) => info!("✅ Graceful shutdown completed successfully"),
        Ok(Ok(Err(e))) => error!("HTTP server failed: {}", e),
        Ok(Err(e)) => error!("HTTP server task panicked: {}", e),
        Err(_) => warn!("⚠️  Shutdown timeout exceeded, forcing exit"),
    }

    info!("🛑 Quote collection service stopped");
    Ok(())
}

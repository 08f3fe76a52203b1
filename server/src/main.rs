//! Sthana server binary.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method, StatusCode};
use clap::{Parser, Subcommand};
use sthana_config::{LogFormat, ServerConfig, SthanaConfig};
use sthana_server::{api, auth::Claims, auth::TokenVerifier, AppState};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sthana temple directory server.
#[derive(Parser)]
#[command(name = "sthana-server")]
#[command(about = "Sthana temple directory API and admin console backend")]
struct Args {
    /// Path to configuration file
    #[arg(short = 'c', long = "config", env = "STHANA_CONFIG", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a signed identity token for local development
    MintToken {
        /// Account uid (`sub` claim)
        #[arg(long)]
        sub: String,
        /// Account email
        #[arg(long)]
        email: Option<String>,
        /// Set the admin claim
        #[arg(long)]
        admin: bool,
        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => sthana_config::load_from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: Failed to load config from {path}: {e}");
            std::process::exit(1);
        }),
        None => sthana_config::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {e}, using defaults");
            SthanaConfig::default()
        }),
    };

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::MintToken {
            sub,
            email,
            admin,
            ttl_secs,
        } => {
            let verifier = TokenVerifier::from_config(&config.auth);
            let token = verifier.encode(&Claims::new(&sub, email.as_deref(), admin, ttl_secs))?;
            println!("{token}");
            Ok(())
        }
    }
}

async fn serve(config: SthanaConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&config);

    tracing::info!(dsn = %config.storage.dsn, "Opening document store");
    let store = sthana_store::connect(&config.storage.dsn).await?;
    tracing::info!(backend = store.backend(), "Document store ready");

    if config.auth.admin_email.is_none() {
        tracing::info!("No fallback admin email configured; only the admin claim grants access");
    }

    let state = AppState::from_config(store, &config)?;

    let app = api::router(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Sthana server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_logging(config: &SthanaConfig) {
    let filter = if config.logging.filter.is_empty() {
        config.logging.level.as_str().to_string()
    } else {
        config.logging.filter.clone()
    };

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(filter));

    match config.logging.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    if server.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use clap::Parser;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber;

use windgate::config::{LimiterSettings, ThrottleProfiles};
use windgate::http::{throttle_middleware, ThrottleState};
use windgate::ratelimit::{LimiterRegistry, Sweeper, Throttle, WindowedRateLimiter};

/// Reference HTTP server demonstrating the throttle middleware.
#[derive(Parser, Debug)]
#[command(name = "windgate", version, about)]
struct Args {
    /// Path to a YAML throttle profiles file
    #[arg(short, long)]
    config: Option<String>,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let args = Args::parse();

    info!("Starting Windgate throttle server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let profiles = match &args.config {
        Some(path) => ThrottleProfiles::from_file(path)?,
        None => ThrottleProfiles::default(),
    };

    let registry = LimiterRegistry::from_profiles(&profiles)?;
    if registry.get("api").is_none() {
        // No configured "api" profile: fall back to a permissive default.
        let settings = LimiterSettings::new(60_000, 100)?;
        registry.insert("api", Arc::new(WindowedRateLimiter::new(settings)?));
        info!("No 'api' profile configured, using defaults");
    }

    let sweeper = Sweeper::spawn(registry.sweepables(), profiles.sweep_interval());

    let api_limiter: Arc<dyn Throttle> = registry
        .get("api")
        .expect("'api' profile registered above");
    let app = Router::new()
        .route("/", get(|| async { "windgate" }))
        .layer(middleware::from_fn_with_state(
            ThrottleState::with_scope(api_limiter, "api"),
            throttle_middleware,
        ))
        .route("/healthz", get(|| async { "ok" }));

    info!(addr = %args.listen, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop().await;
    info!("Windgate throttle server stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

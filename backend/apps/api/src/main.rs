//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, http,
    http::{Method, header},
};
use board::{BoardConfig, PgBoardRepository, SettlementSweep, board_router};
use kernel::clock::{Clock, SystemClock};
use ledger::{PgLedgerRepository, ledger_router};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// Board tunables from the environment, falling back to the defaults
fn board_config_from_env() -> BoardConfig {
    let defaults = BoardConfig::default();

    fn parse<T: std::str::FromStr>(key: &str, default: T) -> T {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    BoardConfig {
        report_hide_threshold: parse("REPORT_HIDE_THRESHOLD", defaults.report_hide_threshold),
        daily_submission_cap: parse("DAILY_SUBMISSION_CAP", defaults.daily_submission_cap),
        request_timeout: Duration::from_secs(parse(
            "REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )),
        sweep_period: Duration::from_secs(parse(
            "SWEEP_PERIOD_SECS",
            defaults.sweep_period.as_secs(),
        )),
        sweep_batch_limit: parse("SWEEP_BATCH_LIMIT", defaults.sweep_batch_limit),
        share_reward: parse("SHARE_REWARD", defaults.share_reward),
        max_content_chars: parse("MAX_CONTENT_CHARS", defaults.max_content_chars),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,board=info,ledger=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let config = Arc::new(board_config_from_env());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let board_repo = PgBoardRepository::new(pool.clone());
    let ledger_repo = PgLedgerRepository::new(pool.clone());

    // Startup sweep: settle whatever expired while the server was down.
    // Errors here should not prevent server startup.
    let sweep = SettlementSweep::new(
        Arc::new(board_repo.clone()),
        Arc::new(board_repo.clone()),
        Arc::new(board_repo.clone()),
        config.clone(),
        clock.clone(),
    );
    match sweep.run_once().await {
        Ok(stats) => {
            tracing::info!(
                scanned = stats.scanned,
                settled = stats.settled,
                conflicts = stats.conflicts,
                failures = stats.failures,
                "Startup settlement sweep completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Startup settlement sweep failed, continuing anyway"
            );
        }
    }
    tokio::spawn(sweep.run());

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest(
            "/api/board",
            board_router(board_repo, ledger_repo.clone(), config, clock),
        )
        .nest("/api/ledger", ledger_router(ledger_repo))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 31113));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! VoiceNotes API Gateway
//!
//! The HTTP entry point for the notes API.
//! Handles:
//! - Note CRUD and summary generation
//! - Health, readiness and summarizer probes
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voicenotes_common::{
    config::{AppConfig, ObservabilityConfig, StorageBackend},
    db::{DbPool, Repository},
    metrics::{self, LATENCY_BUCKETS, METRICS_PREFIX, SUMMARY_BUCKETS},
    notes::{InMemoryNoteStore, NoteService, NoteStore},
    summarizer::Summarizer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub notes: Arc<NoteService>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting VoiceNotes API Gateway v{}",
        voicenotes_common::VERSION
    );

    init_metrics(&config.observability)?;

    let store = build_store(&config).await?;
    let summarizer = Summarizer::from_config(&config.summarizer)?;
    let notes = NoteService::new(store, Arc::new(summarizer));

    let config = Arc::new(config);
    let state = AppState {
        config: config.clone(),
        notes: Arc::new(notes),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_metrics(config: &ObservabilityConfig) -> anyhow::Result<()> {
    metrics::register_metrics();

    if config.metrics_port == 0 {
        info!("Prometheus exporter disabled");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_request_duration_seconds", METRICS_PREFIX)),
            LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_summary_duration_seconds", METRICS_PREFIX)),
            SUMMARY_BUCKETS,
        )?
        .install()
        .context("failed to install Prometheus exporter")?;

    info!(port = config.metrics_port, "Prometheus exporter listening");
    Ok(())
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn NoteStore>> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = DbPool::new(&config.database).await?;
            pool.ensure_schema().await?;
            Ok(Arc::new(Repository::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory note store; notes are lost on restart");
            Ok(Arc::new(InMemoryNoteStore::new()))
        }
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    // API routes
    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/health/summarizer", get(handlers::health::summarizer_health))

        // Note endpoints
        .route(
            "/notes",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        .route(
            "/notes/{id}",
            get(handlers::notes::get_note)
                .put(handlers::notes::update_note)
                .delete(handlers::notes::delete_note),
        )
        .route("/notes/{id}/summary", post(handlers::notes::generate_summary));

    // Compose the app
    Router::new()
        .route("/", get(handlers::health::root))
        .nest("/api", api_routes)
        .route_layer(axum::middleware::from_fn(middleware::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

//! Social Blog Service Binary
//!
//! Runs the social graph and engagement core as a REST API service:
//! - Structured JSON logging
//! - Request tracing with correlation IDs
//! - Graceful shutdown handling
//! - Health check endpoints
//!
//! ## Configuration
//!
//! Environment variables:
//! - `STORE_BACKEND`: "postgres" or "memory" (default: postgres when `DATABASE_URL` is set)
//! - `DATABASE_URL`: PostgreSQL connection string
//! - `AUTH_TOKEN_SECRET`: HMAC secret for bearer tokens (required in production)
//! - `AUTH_TOKEN_TTL_HOURS`: Token lifetime (default: 24)
//! - `POSTS_PER_PAGE`: Listing page size (default: 20)
//! - `PORT`: Service port (default: 8080)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//! - `BOOTSTRAP_ADMIN_USERNAME`, `BOOTSTRAP_ADMIN_EMAIL`, `BOOTSTRAP_ADMIN_PASSWORD`:
//!   privileged account ensured at startup
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... AUTH_TOKEN_SECRET=... cargo run --bin social_blog_service
//! ```

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use social_blog::config::{LogFormat, ServiceConfig, StoreBackend};
use social_blog::service::{
    create_router, current_request_id, request_id_middleware, ServiceState,
};
use social_blog::{InMemorySocialStore, PostgresSocialStore, SocialStore};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "social_blog_service=info,social_blog=info,tower_http=info,sqlx=warn".into()
    });

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_current_span(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .flatten_event(true),
                )
                .init();
        }
    }
}

/// Log format has to be known before the subscriber exists, so it is read
/// ahead of the full configuration.
fn log_format_from_env() -> LogFormat {
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("pretty") => LogFormat::Pretty,
        _ => LogFormat::Json,
    }
}

/// Request logging middleware that adds correlation ID and timing.
///
/// Runs inside `request_id_middleware`, so the correlation id is already set.
async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = current_request_id().unwrap_or_default();

    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    info!(
        target: "social_blog_service::access",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

async fn serve<S: SocialStore + 'static>(
    store: S,
    config: &ServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = ServiceState::from_config(store, config);

    if let Some(admin) = &config.bootstrap_admin {
        let user = state
            .accounts()
            .ensure_staff_account(&admin.username, &admin.email, &admin.password)
            .await?;
        info!(user = %user.id, username = %user.username, "Staff account ready");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = config.bind_addr().parse()?;
    info!(
        address = %addr,
        version = env!("CARGO_PKG_VERSION"),
        "Social Blog Service listening"
    );

    let listener = TcpListener::bind(addr).await?;
    info!("Ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(log_format_from_env());

    let version = env!("CARGO_PKG_VERSION");
    let build_sha = option_env!("BUILD_SHA").unwrap_or("dev");
    info!(version = version, build_sha = build_sha, "Starting Social Blog Service");

    let config = ServiceConfig::from_env();
    info!(
        backend = ?config.store_backend,
        token_ttl_hours = config.token_ttl_hours,
        posts_per_page = config.posts_per_page,
        "Configuration loaded"
    );

    match config.store_backend {
        StoreBackend::Postgres => {
            info!("Connecting to PostgreSQL...");
            let connect_start = Instant::now();

            let store = match tokio::time::timeout(
                std::time::Duration::from_secs(30),
                PostgresSocialStore::from_env(),
            )
            .await
            {
                Ok(Ok(store)) => store,
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                    return Err(e.into());
                }
                Err(_) => {
                    tracing::error!("PostgreSQL connection timeout after 30s");
                    return Err("Database connection timeout".into());
                }
            };
            store.ensure_schema().await?;

            info!(
                latency_ms = connect_start.elapsed().as_millis() as u64,
                "PostgreSQL connection established"
            );
            serve(store, &config).await?;
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; all data is lost on shutdown");
            serve(InMemorySocialStore::new(), &config).await?;
        }
    }

    info!("Social Blog Service shutdown complete");
    Ok(())
}

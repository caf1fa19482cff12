//! BorrowPal backend server
//!
//! HTTP API and WebSocket hub for the BorrowPal peer-to-peer lending
//! marketplace: item and service catalogs, borrow requests with price
//! negotiation, slot bookings, wallets and notifications.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use borrowpal_server::auth::AuthService;
use borrowpal_server::bookings::{BookingService, ConflictChecker};
use borrowpal_server::borrows::BorrowService;
use borrowpal_server::chat::ChatService;
use borrowpal_server::config::Config;
use borrowpal_server::db;
use borrowpal_server::items::ItemService;
use borrowpal_server::middleware::{request_tracing, security_headers};
use borrowpal_server::notifications::{notification_relay, NotificationService};
use borrowpal_server::payments::PaymentClient;
use borrowpal_server::realtime::{ws_handler, WsState};
use borrowpal_server::reviews::ReviewService;
use borrowpal_server::routes;
use borrowpal_server::services::ServiceCatalog;
use borrowpal_server::state::AppState;
use borrowpal_server::wallet::WalletService;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        "Starting BorrowPal server"
    );

    let db_pool = match db::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db::run_migrations(&db_pool).await {
        tracing::error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    let ws_state = WsState::new();
    let payment_client = PaymentClient::from_config(&config);

    let auth_service = Arc::new(AuthService::new(
        db_pool.clone(),
        config.jwt_secret.clone(),
        config.jwt_access_token_ttl_seconds,
        config.jwt_refresh_token_ttl_days,
    ));
    let item_service = Arc::new(ItemService::new(db_pool.clone()));
    let service_catalog = Arc::new(ServiceCatalog::new(db_pool.clone()));
    let wallet_service = Arc::new(WalletService::new(db_pool.clone()));
    let notification_service = Arc::new(NotificationService::new(db_pool.clone()));
    let borrow_service = Arc::new(BorrowService::new(
        db_pool.clone(),
        (*wallet_service).clone(),
        (*notification_service).clone(),
        payment_client.clone(),
    ));
    let booking_service = Arc::new(BookingService::new(
        db_pool.clone(),
        ConflictChecker::new(db_pool.clone()),
        (*wallet_service).clone(),
        (*notification_service).clone(),
        payment_client,
    ));
    let chat_service = Arc::new(ChatService::new(db_pool.clone(), ws_state.clone()));
    let review_service = Arc::new(ReviewService::new(
        db_pool.clone(),
        (*notification_service).clone(),
    ));

    // Undelivered notifications are pushed to live sockets in the background
    let relay_pool = db_pool.clone();
    let relay_ws = ws_state.clone();
    let poll_seconds = config.outbox_poll_seconds;
    tokio::spawn(async move {
        notification_relay(relay_pool, relay_ws, poll_seconds).await;
    });

    let app_state = AppState {
        db_pool: db_pool.clone(),
        auth_service,
        item_service,
        service_catalog,
        borrow_service,
        booking_service,
        wallet_service,
        notification_service,
        chat_service,
        review_service,
        ws_state,
        webhook_secret: config.payment_webhook_secret.clone(),
    };

    let health_db_pool = db_pool.clone();

    let app = Router::new()
        .route("/health", get(move || health_check(health_db_pool.clone())))
        .route("/ws", get(ws_handler))
        .merge(routes::auth_routes())
        .merge(routes::item_routes())
        .merge(routes::service_routes())
        .merge(routes::borrow_routes())
        .merge(routes::booking_routes())
        .merge(routes::payment_routes())
        .merge(routes::wallet_routes())
        .merge(routes::notification_routes())
        .merge(routes::message_routes())
        .merge(routes::review_routes())
        .merge(routes::dashboard_routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn(security_headers))
        .layer(axum::middleware::from_fn(request_tracing))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("Server listening on {}", addr);
    tracing::info!("WebSocket available at ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server shutdown complete");
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

/// Health check endpoint
async fn health_check(pool: sqlx::PgPool) -> axum::Json<HealthResponse> {
    let reachable = db::ping(&pool).await;

    axum::Json(HealthResponse {
        status: if reachable { "healthy" } else { "unhealthy" }.to_string(),
        database: if reachable { "connected" } else { "unreachable" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
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
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

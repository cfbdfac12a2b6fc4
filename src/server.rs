use std::future::Future;
use std::time::Duration;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::api::{
    handler::{
        get_auto_settle, get_balances, get_settlement_status, health_check, put_auto_settle,
        put_balances, put_context, settle_funds, AppState,
    },
    websocket::stream_notifications,
};

pub fn create_app(state: AppState) -> Router {
    info!("⚙️ Setting up HTTP routes...");

    let app = Router::new()
        // Public health check endpoint
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            Router::new()
                // Balance display and the collaborator feeds behind it
                .route("/panel/balances", get(get_balances).put(put_balances))
                .route("/panel/context", put(put_context))
                // Settlement
                .route("/settlement/settle", post(settle_funds))
                .route("/settlement/status", get(get_settlement_status))
                // Preferences
                .route(
                    "/preferences/auto-settle",
                    get(get_auto_settle).put(put_auto_settle),
                )
                .route("/notifications/stream", get(stream_notifications)),
        )
        .layer(
            ServiceBuilder::new()
                // Add request tracing
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::very_permissive())
                // Only the response is bounded; manual settlement runs on its own task
                .layer(TimeoutLayer::new(Duration::from_secs(120))),
        )
        .with_state(state);

    info!("✓ HTTP routes configured");
    app
}

pub async fn run_server(
    app: Router,
    bind_address: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🌐 Server listening on: {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

//! Router assembly and the HTTP listener

use axum::{middleware, routing::get, Router};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{configure_auth_routes, configure_public_auth_routes};
use crate::core::urls::ApiUrls;
use crate::reports::configure_reports_routes;
use crate::security::{auth_middleware, create_cors_layer};
use crate::shared::state::AppState;
use crate::tasks::configure_task_routes;
use crate::users::configure_users_routes;

use super::{health_check_simple, shutdown_signal};

pub fn build_router(app_state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .merge(configure_auth_routes())
        .merge(configure_users_routes())
        .merge(configure_task_routes())
        .merge(configure_reports_routes())
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let public = Router::new()
        .merge(configure_public_auth_routes())
        .route(ApiUrls::HEALTH, get(health_check_simple));

    let cors = create_cors_layer(app_state.config.client_url.as_deref());

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service(ApiUrls::UPLOADS, ServeDir::new(&app_state.config.upload_dir))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let config = app_state.config.clone();
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let app = build_router(app_state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}

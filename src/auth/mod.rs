//! Registration, login and profile endpoints.

pub mod handlers;
pub mod types;
pub mod upload;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::core::urls::ApiUrls;
use crate::shared::state::AppState;

pub use handlers::*;
pub use types::*;

/// Reachable without a token.
pub fn configure_public_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::AUTH_REGISTER, post(handle_register))
        .route(ApiUrls::AUTH_LOGIN, post(handle_login))
        .route(ApiUrls::AUTH_UPLOAD_IMAGE, post(handle_upload_image))
}

/// Expects the caller identity from the auth middleware.
pub fn configure_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::AUTH_PROFILE, get(handle_get_profile))
        .route(ApiUrls::AUTH_UPDATE_PROFILE, put(handle_update_profile))
}

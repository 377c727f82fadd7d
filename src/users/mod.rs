pub mod handlers;
pub mod types;

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;

use crate::core::urls::ApiUrls;
use crate::security::admin_only_middleware;
use crate::shared::state::AppState;

pub use handlers::*;
pub use types::*;

/// Routes behind authentication; admin gates are applied per method.
pub fn configure_users_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::USERS,
            get(handle_list_users).route_layer(middleware::from_fn(admin_only_middleware)),
        )
        .route(ApiUrls::USER_BY_ID, get(handle_get_user))
        .route(
            ApiUrls::USER_BY_ID,
            delete(handle_delete_user).route_layer(middleware::from_fn(admin_only_middleware)),
        )
}

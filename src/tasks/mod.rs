pub mod dashboard;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod reconcile;
pub mod types;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::core::urls::ApiUrls;
use crate::security::admin_only_middleware;
use crate::shared::state::AppState;

pub use dashboard::DashboardData;
pub use engine::TaskEngine;
pub use error::TaskError;
pub use types::{ChecklistItem, Task, TaskPriority, TaskResponse, TaskStatus};

/// Expects the caller identity to be installed by the auth middleware.
pub fn configure_task_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::TASKS, get(handlers::handle_task_list))
        .route(
            ApiUrls::TASKS,
            post(handlers::handle_task_create)
                .route_layer(middleware::from_fn(admin_only_middleware)),
        )
        .route(
            ApiUrls::TASKS_DASHBOARD,
            get(handlers::handle_dashboard)
                .route_layer(middleware::from_fn(admin_only_middleware)),
        )
        .route(
            ApiUrls::TASKS_USER_DASHBOARD,
            get(handlers::handle_user_dashboard),
        )
        .route(
            ApiUrls::TASK_BY_ID,
            get(handlers::handle_task_get).put(handlers::handle_task_update),
        )
        .route(
            ApiUrls::TASK_BY_ID,
            delete(handlers::handle_task_delete)
                .route_layer(middleware::from_fn(admin_only_middleware)),
        )
        .route(ApiUrls::TASK_STATUS, put(handlers::handle_task_status))
        .route(ApiUrls::TASK_TODO, put(handlers::handle_task_checklist))
}

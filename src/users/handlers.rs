use axum::{
    extract::{rejection::PathRejection, Path, State},
    Extension, Json,
};
use log::info;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::ApiError;
use crate::security::AuthenticatedUser;
use crate::shared::state::AppState;
use crate::storage::TaskQuery;
use crate::tasks::TaskStatus;

use super::types::{UserProfile, UserWithTaskCounts};

pub async fn handle_list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserWithTaskCounts>>, ApiError> {
    let users = state.users.list_users().await?;

    let mut result = Vec::with_capacity(users.len());
    for user in &users {
        let scope = TaskQuery::assigned_to(user.id);
        let pending_tasks = state
            .tasks
            .count_tasks(&scope.clone().with_status(TaskStatus::Pending))
            .await?;
        let in_progress_tasks = state
            .tasks
            .count_tasks(&scope.clone().with_status(TaskStatus::InProgress))
            .await?;
        let completed_tasks = state
            .tasks
            .count_tasks(&scope.with_status(TaskStatus::Completed))
            .await?;

        result.push(UserWithTaskCounts {
            user: UserProfile::from(user),
            pending_tasks,
            in_progress_tasks,
            completed_tasks,
        });
    }

    Ok(Json(result))
}

pub async fn handle_get_user(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let Path(id) = id?;
    let user = state
        .users
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserProfile::from(&user)))
}

pub async fn handle_delete_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id?;
    if !state.users.delete_user(id).await? {
        return Err(ApiError::not_found("User not found"));
    }

    info!("User {} removed by admin {}", id, caller.user_id);
    Ok(Json(json!({ "message": "User removed" })))
}

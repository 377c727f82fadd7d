//! HTTP handlers for the task API
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::dashboard::DashboardData;
use super::types::{
    ChecklistUpdateRequest, CreateTaskRequest, StatusUpdateRequest, TaskFilters,
    TaskListResponse, TaskMessageResponse, TaskResponse, TaskStatus, TaskUpdate,
};
use crate::core::error::ApiError;
use crate::security::AuthenticatedUser;
use crate::shared::state::AppState;

pub async fn handle_task_list(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    filters: Result<Query<TaskFilters>, QueryRejection>,
) -> Result<Json<TaskListResponse>, ApiError> {
    let Query(filters) = filters?;
    let status = filters
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<TaskStatus>)
        .transpose()
        .map_err(ApiError::validation)?;

    let list = state.task_engine.list_tasks(&caller, status).await?;
    Ok(Json(list))
}

pub async fn handle_task_get(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.task_engine.get_task(id).await?))
}

pub async fn handle_task_create(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskMessageResponse>), ApiError> {
    let Json(payload) = payload?;
    let task = state.task_engine.create_task(&caller, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(TaskMessageResponse {
            message: "Task created successfully".to_string(),
            task,
        }),
    ))
}

pub async fn handle_task_update(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TaskUpdate>, JsonRejection>,
) -> Result<Json<TaskMessageResponse>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let task = state.task_engine.update_task(id, &caller, payload).await?;
    Ok(Json(TaskMessageResponse {
        message: "Task updated successfully".to_string(),
        task,
    }))
}

pub async fn handle_task_delete(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id?;
    state.task_engine.delete_task(id).await?;
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

pub async fn handle_task_status(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<TaskMessageResponse>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let task = state
        .task_engine
        .update_status(id, &caller, payload.status.as_deref())
        .await?;
    Ok(Json(TaskMessageResponse {
        message: "Task status updated".to_string(),
        task,
    }))
}

pub async fn handle_task_checklist(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ChecklistUpdateRequest>, JsonRejection>,
) -> Result<Json<TaskMessageResponse>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let task = state
        .task_engine
        .update_checklist(id, &caller, payload.todo_checklist)
        .await?;
    Ok(Json(TaskMessageResponse {
        message: "Task checklist updated".to_string(),
        task,
    }))
}

pub async fn handle_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardData>, ApiError> {
    Ok(Json(state.task_engine.dashboard(None, Utc::now()).await?))
}

pub async fn handle_user_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> Result<Json<DashboardData>, ApiError> {
    Ok(Json(
        state
            .task_engine
            .dashboard(Some(caller.user_id), Utc::now())
            .await?,
    ))
}

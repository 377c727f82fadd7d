//! Admin CSV exports of tasks and users.

use axum::{
    extract::State,
    http::header,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::ApiError;
use crate::core::urls::ApiUrls;
use crate::security::admin_only_middleware;
use crate::shared::state::AppState;
use crate::storage::TaskQuery;
use crate::tasks::{Task, TaskStatus};
use crate::users::User;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl TaskCounts {
    fn record(&mut self, status: TaskStatus) {
        self.total += 1;
        match status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
        }
    }
}

fn csv_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::internal(format!("CSV export failed: {e}"))
}

pub fn tasks_csv(tasks: &[Task], users: &[User]) -> Result<Vec<u8>, ApiError> {
    let by_id: HashMap<Uuid, &User> = users.iter().map(|u| (u.id, u)).collect();
    let mut writer = csv::Writer::from_writer(vec![]);

    writer
        .write_record([
            "Task ID",
            "Title",
            "Description",
            "Priority",
            "Status",
            "Due Date",
            "Assigned To",
        ])
        .map_err(csv_error)?;

    for task in tasks {
        let assigned = task
            .assigned_to
            .iter()
            .filter_map(|id| by_id.get(id))
            .map(|u| format!("{} ({})", u.name, u.email))
            .collect::<Vec<_>>()
            .join(", ");
        writer
            .write_record([
                task.id.to_string(),
                task.title.clone(),
                task.description.clone(),
                task.priority.to_string(),
                task.status.to_string(),
                task.due_date.format("%Y-%m-%d").to_string(),
                if assigned.is_empty() {
                    "Unassigned".to_string()
                } else {
                    assigned
                },
            ])
            .map_err(csv_error)?;
    }

    writer.into_inner().map_err(csv_error)
}

pub fn users_csv(tasks: &[Task], users: &[User]) -> Result<Vec<u8>, ApiError> {
    let mut counts: HashMap<Uuid, TaskCounts> = HashMap::new();
    for task in tasks {
        for assignee in &task.assigned_to {
            counts.entry(*assignee).or_default().record(task.status);
        }
    }

    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record([
            "User Name",
            "Email",
            "Total Assigned Tasks",
            "Pending Tasks",
            "In Progress Tasks",
            "Completed Tasks",
        ])
        .map_err(csv_error)?;

    for user in users {
        let c = counts.get(&user.id).copied().unwrap_or_default();
        writer
            .write_record([
                user.name.clone(),
                user.email.clone(),
                c.total.to_string(),
                c.pending.to_string(),
                c.in_progress.to_string(),
                c.completed.to_string(),
            ])
            .map_err(csv_error)?;
    }

    writer.into_inner().map_err(csv_error)
}

fn csv_attachment(file_name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn handle_export_tasks(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let tasks = state.tasks.find_tasks(&TaskQuery::all(), None).await?;
    let users = state.users.list_users().await?;
    let body = tasks_csv(&tasks, &users)?;
    log::info!("Exported {} tasks", tasks.len());
    Ok(csv_attachment("tasks_report.csv", body))
}

pub async fn handle_export_users(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let tasks = state.tasks.find_tasks(&TaskQuery::all(), None).await?;
    let users = state.users.list_users().await?;
    let body = users_csv(&tasks, &users)?;
    log::info!("Exported {} users", users.len());
    Ok(csv_attachment("users_report.csv", body))
}

pub fn configure_reports_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::REPORTS_EXPORT_TASKS, get(handle_export_tasks))
        .route(ApiUrls::REPORTS_EXPORT_USERS, get(handle_export_users))
        .route_layer(middleware::from_fn(admin_only_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskPriority;
    use crate::users::Role;
    use chrono::{TimeZone, Utc};

    fn user(name: &str) -> User {
        User::new(
            name.to_string(),
            format!("{}@example.com", name.to_lowercase()),
            "h".into(),
            None,
            Role::Member,
        )
    }

    fn task(title: &str, status: TaskStatus, assigned_to: Vec<Uuid>) -> Task {
        let due = Utc.with_ymd_and_hms(2030, 5, 17, 12, 0, 0).single().expect("date");
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: "Needs, commas".into(),
            priority: TaskPriority::High,
            status,
            due_date: due,
            assigned_to,
            created_by: Uuid::new_v4(),
            attachments: vec![],
            todo_checklist: vec![],
            progress: 0,
            created_at: due,
            updated_at: due,
        }
    }

    #[test]
    fn test_tasks_csv_lists_assignees() {
        let ada = user("Ada");
        let bob = user("Bob");
        let tasks = vec![
            task("Ship", TaskStatus::InProgress, vec![ada.id, bob.id]),
            task("Idle", TaskStatus::Pending, vec![]),
        ];

        let csv = String::from_utf8(tasks_csv(&tasks, &[ada, bob]).expect("csv")).expect("utf8");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Task ID,Title,Description"));
        assert!(lines[1].contains("\"Needs, commas\""));
        assert!(lines[1].contains("In Progress"));
        assert!(lines[1].contains("2030-05-17"));
        assert!(lines[1].contains("\"Ada (ada@example.com), Bob (bob@example.com)\""));
        assert!(lines[2].ends_with("Unassigned"));
    }

    #[test]
    fn test_users_csv_counts_by_status() {
        let ada = user("Ada");
        let bob = user("Bob");
        let tasks = vec![
            task("a", TaskStatus::Pending, vec![ada.id]),
            task("b", TaskStatus::Completed, vec![ada.id, bob.id]),
            task("c", TaskStatus::InProgress, vec![ada.id]),
        ];

        let csv = String::from_utf8(users_csv(&tasks, &[ada, bob]).expect("csv")).expect("utf8");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "Ada,ada@example.com,3,1,1,1");
        assert_eq!(lines[2], "Bob,bob@example.com,1,0,0,1");
    }
}

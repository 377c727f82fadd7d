use chrono::{DateTime, Utc};
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use super::dashboard::{build_dashboard, DashboardData};
use super::error::TaskError;
use super::reconcile;
use super::types::{
    ChecklistItem, CreateTaskRequest, StatusSummary, Task, TaskListResponse, TaskResponse,
    TaskStatus, TaskUpdate,
};
use crate::security::AuthenticatedUser;
use crate::storage::{TaskQuery, TaskStore, UserStore};
use crate::users::UserSummary;

const ASSIGNED_TO_MESSAGE: &str = "assignedTo must be an array of user IDs";

/// Task operations shared by the HTTP handlers. Holds no state of its own
/// beyond the store handles.
pub struct TaskEngine {
    users: Arc<dyn UserStore>,
    tasks: Arc<dyn TaskStore>,
}

impl TaskEngine {
    pub fn new(users: Arc<dyn UserStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self { users, tasks }
    }

    async fn load(&self, id: Uuid) -> Result<Task, TaskError> {
        self.tasks.find_task(id).await?.ok_or(TaskError::NotFound)
    }

    /// Assignees in stored order; ids whose user no longer exists are skipped.
    async fn resolve(&self, task: Task) -> Result<TaskResponse, TaskError> {
        let assignees = self
            .users
            .find_users(&task.assigned_to)
            .await?
            .iter()
            .map(UserSummary::from)
            .collect();
        Ok(TaskResponse::new(task, assignees))
    }

    /// Deduplicates while keeping first-seen order and checks every id
    /// refers to an existing user.
    async fn validate_assignees(&self, ids: Vec<Uuid>) -> Result<Vec<Uuid>, TaskError> {
        let mut unique: Vec<Uuid> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        if unique.is_empty() {
            return Err(TaskError::Validation(ASSIGNED_TO_MESSAGE.to_string()));
        }

        let found = self.users.find_users(&unique).await?;
        if let Some(missing) = unique
            .iter()
            .find(|id| !found.iter().any(|user| user.id == **id))
        {
            return Err(TaskError::Validation(format!(
                "Assigned user {missing} does not exist"
            )));
        }
        Ok(unique)
    }

    pub fn ensure_can_modify(
        task: &Task,
        caller: &AuthenticatedUser,
        message: &str,
    ) -> Result<(), TaskError> {
        if caller.is_admin() || task.is_assigned_to(caller.user_id) {
            Ok(())
        } else {
            Err(TaskError::Forbidden(message.to_string()))
        }
    }

    pub async fn list_tasks(
        &self,
        caller: &AuthenticatedUser,
        status: Option<TaskStatus>,
    ) -> Result<TaskListResponse, TaskError> {
        let scope = if caller.is_admin() {
            TaskQuery::all()
        } else {
            TaskQuery::assigned_to(caller.user_id)
        };

        let found = self
            .tasks
            .find_tasks(&scope.clone().with_optional_status(status), None)
            .await?;
        let mut tasks = Vec::with_capacity(found.len());
        for task in found {
            let completed = task.completed_todo_count();
            tasks.push(self.resolve(task).await?.with_completed_todo_count(completed));
        }

        let status_summary = StatusSummary {
            all: self.tasks.count_tasks(&scope).await?,
            pending_tasks: self
                .tasks
                .count_tasks(&scope.clone().with_status(TaskStatus::Pending))
                .await?,
            in_progress_tasks: self
                .tasks
                .count_tasks(&scope.clone().with_status(TaskStatus::InProgress))
                .await?,
            completed_tasks: self
                .tasks
                .count_tasks(&scope.with_status(TaskStatus::Completed))
                .await?,
        };

        Ok(TaskListResponse {
            tasks,
            status_summary,
        })
    }

    pub async fn get_task(&self, id: Uuid) -> Result<TaskResponse, TaskError> {
        let task = self.load(id).await?;
        self.resolve(task).await
    }

    pub async fn create_task(
        &self,
        caller: &AuthenticatedUser,
        request: CreateTaskRequest,
    ) -> Result<TaskResponse, TaskError> {
        let title = request
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TaskError::Validation("Title is required".to_string()))?;
        let due_date = request
            .due_date
            .ok_or_else(|| TaskError::Validation("Due date is required".to_string()))?;
        let assigned_to = request
            .assigned_to
            .ok_or_else(|| TaskError::Validation(ASSIGNED_TO_MESSAGE.to_string()))?;
        let assigned_to = self.validate_assignees(assigned_to).await?;

        let now = Utc::now();
        let todo_checklist = request.todo_checklist.unwrap_or_default();
        let task = Task {
            id: Uuid::new_v4(),
            title,
            description: request.description.unwrap_or_default(),
            priority: request.priority.unwrap_or_default(),
            status: TaskStatus::Pending,
            due_date,
            assigned_to,
            created_by: caller.user_id,
            attachments: request.attachments.unwrap_or_default(),
            todo_checklist,
            progress: 0,
            created_at: now,
            updated_at: now,
        };

        let task = self.tasks.insert_task(task).await?;
        info!("Task {} created by {}", task.id, caller.user_id);
        self.resolve(task).await
    }

    /// Plain field edit. Status and progress are left as they are even when
    /// the checklist is replaced here.
    pub async fn update_task(
        &self,
        id: Uuid,
        caller: &AuthenticatedUser,
        update: TaskUpdate,
    ) -> Result<TaskResponse, TaskError> {
        let mut task = self.load(id).await?;
        Self::ensure_can_modify(&task, caller, "Not authorized to update this task")?;

        if let Some(title) = update.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(TaskError::Validation("Title cannot be empty".to_string()));
            }
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }
        if let Some(assigned_to) = update.assigned_to {
            task.assigned_to = self.validate_assignees(assigned_to).await?;
        }
        if let Some(attachments) = update.attachments {
            task.attachments = attachments;
        }
        if let Some(todo_checklist) = update.todo_checklist {
            task.todo_checklist = todo_checklist;
        }
        task.updated_at = Utc::now();

        let task = self.tasks.save_task(task).await?;
        self.resolve(task).await
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<(), TaskError> {
        if !self.tasks.delete_task(id).await? {
            return Err(TaskError::NotFound);
        }
        info!("Task {id} deleted");
        Ok(())
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        caller: &AuthenticatedUser,
        status: Option<&str>,
    ) -> Result<TaskResponse, TaskError> {
        let mut task = self.load(id).await?;
        Self::ensure_can_modify(&task, caller, "Not authorized")?;

        let status = status
            .ok_or_else(|| TaskError::Validation("Status is required".to_string()))?
            .parse::<TaskStatus>()
            .map_err(TaskError::Validation)?;

        reconcile::apply_status(&mut task, status);
        let task = self.tasks.save_task(task).await?;
        self.resolve(task).await
    }

    pub async fn update_checklist(
        &self,
        id: Uuid,
        caller: &AuthenticatedUser,
        checklist: Option<Vec<ChecklistItem>>,
    ) -> Result<TaskResponse, TaskError> {
        let mut task = self.load(id).await?;
        Self::ensure_can_modify(&task, caller, "Not authorized to update checklist")?;

        let checklist = checklist
            .ok_or_else(|| TaskError::Validation("todoChecklist is required".to_string()))?;

        reconcile::replace_checklist(&mut task, checklist);
        self.tasks.save_task(task).await?;

        self.get_task(id).await
    }

    pub async fn dashboard(
        &self,
        assignee: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<DashboardData, TaskError> {
        Ok(build_dashboard(self.tasks.as_ref(), assignee, now).await?)
    }
}

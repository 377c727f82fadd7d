//! Persistence seams for users and tasks.
//!
//! Handlers and the task engine only see the [`UserStore`] and [`TaskStore`]
//! traits. [`PgStore`] is the production backend; [`MemoryStore`] backs the
//! test suite and `TASKSERVER_STORE=memory` runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::tasks::{Task, TaskPriority, TaskStatus};
use crate::users::User;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("record not found")]
    NotFound,
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Filter shared by task listing and counting. Every set field narrows the
/// result; an empty query matches every task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    pub assignee: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Due strictly before this instant and not completed.
    pub overdue_at: Option<DateTime<Utc>>,
}

impl TaskQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn assigned_to(user_id: Uuid) -> Self {
        Self {
            assignee: Some(user_id),
            ..Self::default()
        }
    }

    pub fn scoped(assignee: Option<Uuid>) -> Self {
        Self {
            assignee,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_optional_status(mut self, status: Option<TaskStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn overdue_at(mut self, now: DateTime<Utc>) -> Self {
        self.overdue_at = Some(now);
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(assignee) = self.assignee {
            if !task.is_assigned_to(assignee) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(now) = self.overdue_at {
            if !task.is_overdue_at(now) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Users for the given ids, in the order of `ids`. Unknown ids are skipped.
    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

    /// All users, oldest first.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn update_user(&self, user: User) -> Result<User, StoreError>;

    /// Returns whether a record was removed.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: Task) -> Result<Task, StoreError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Matching tasks, newest first, capped at `limit` when given.
    async fn find_tasks(&self, query: &TaskQuery, limit: Option<i64>)
        -> Result<Vec<Task>, StoreError>;

    async fn count_tasks(&self, query: &TaskQuery) -> Result<i64, StoreError>;

    /// Overwrites the stored task with the same id. Last write wins.
    async fn save_task(&self, task: Task) -> Result<Task, StoreError>;

    /// Returns whether a record was removed.
    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(status: TaskStatus, due_in_days: i64, assignees: Vec<Uuid>) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "t".into(),
            description: String::new(),
            priority: TaskPriority::High,
            status,
            due_date: now + Duration::days(due_in_days),
            assigned_to: assignees,
            created_by: Uuid::new_v4(),
            attachments: vec![],
            todo_checklist: vec![],
            progress: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(TaskQuery::all().matches(&task(TaskStatus::Completed, -3, vec![])));
    }

    #[test]
    fn test_assignee_filter() {
        let member = Uuid::new_v4();
        let t = task(TaskStatus::Pending, 1, vec![Uuid::new_v4(), member]);
        assert!(TaskQuery::assigned_to(member).matches(&t));
        assert!(!TaskQuery::assigned_to(Uuid::new_v4()).matches(&t));
    }

    #[test]
    fn test_overdue_excludes_completed() {
        let now = Utc::now();
        let query = TaskQuery::all().overdue_at(now);
        assert!(query.matches(&task(TaskStatus::InProgress, -1, vec![])));
        assert!(!query.matches(&task(TaskStatus::Completed, -1, vec![])));
        assert!(!query.matches(&task(TaskStatus::Pending, 1, vec![])));
    }

    #[test]
    fn test_filters_combine() {
        let t = task(TaskStatus::Pending, 1, vec![]);
        assert!(TaskQuery::all()
            .with_status(TaskStatus::Pending)
            .with_priority(TaskPriority::High)
            .matches(&t));
        assert!(!TaskQuery::all()
            .with_status(TaskStatus::Pending)
            .with_priority(TaskPriority::Low)
            .matches(&t));
    }
}

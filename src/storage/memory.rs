use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TaskQuery, TaskStore, UserStore};
use crate::tasks::Task;
use crate::users::User;

/// Process-local store. Each collection sits behind its own lock, so writes
/// to one document serialize the same way a database row lock would.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut list: Vec<User> = self.users.read().await.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    async fn update_user(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(StoreError::NotFound);
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: Task) -> Result<Task, StoreError> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn find_tasks(
        &self,
        query: &TaskQuery,
        limit: Option<i64>,
    ) -> Result<Vec<Task>, StoreError> {
        let mut matched: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            matched.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }
        Ok(matched)
    }

    async fn count_tasks(&self, query: &TaskQuery) -> Result<i64, StoreError> {
        let count = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| query.matches(t))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn save_task(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(task)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{TaskPriority, TaskStatus};
    use crate::users::Role;
    use chrono::{Duration, Utc};

    fn user(email: &str) -> User {
        User::new("Someone".into(), email.into(), "hash".into(), None, Role::Member)
    }

    fn task_created_at(offset_secs: i64) -> Task {
        let at = Utc::now() + Duration::seconds(offset_secs);
        Task {
            id: Uuid::new_v4(),
            title: format!("task {offset_secs}"),
            description: String::new(),
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
            due_date: at,
            assigned_to: vec![],
            created_by: Uuid::new_v4(),
            attachments: vec![],
            todo_checklist: vec![],
            progress: 0,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.insert_user(user("a@example.com")).await.expect("insert");
        assert!(matches!(
            store.insert_user(user("a@example.com")).await,
            Err(StoreError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn test_find_users_preserves_order_and_skips_unknown() {
        let store = MemoryStore::new();
        let a = store.insert_user(user("a@example.com")).await.expect("a");
        let b = store.insert_user(user("b@example.com")).await.expect("b");

        let found = store
            .find_users(&[b.id, Uuid::new_v4(), a.id])
            .await
            .expect("find");
        let ids: Vec<Uuid> = found.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_update_user_email_collision() {
        let store = MemoryStore::new();
        store.insert_user(user("a@example.com")).await.expect("a");
        let mut b = store.insert_user(user("b@example.com")).await.expect("b");
        b.email = "a@example.com".into();
        assert!(matches!(
            store.update_user(b).await,
            Err(StoreError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn test_find_tasks_newest_first_with_limit() {
        let store = MemoryStore::new();
        for offset in [-30, -10, -20] {
            store.insert_task(task_created_at(offset)).await.expect("insert");
        }

        let tasks = store.find_tasks(&TaskQuery::all(), Some(2)).await.expect("find");
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["task -10", "task -20"]);
    }

    #[tokio::test]
    async fn test_save_missing_task_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.save_task(task_created_at(0)).await,
            Err(StoreError::NotFound)
        ));
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;
use uuid::Uuid;

use super::{StoreError, TaskQuery, TaskStore, UserStore};
use crate::core::shared::schema::{tasks, users};
use crate::core::shared::utils::DbPool;
use crate::tasks::{ChecklistItem, Task};
use crate::users::User;

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = users, treat_none_as_null = true)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct DbTask {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Vec<Uuid>,
    pub created_by: Uuid,
    pub attachments: Vec<String>,
    pub todo_checklist: serde_json::Value,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn user_to_db(user: &User) -> DbUser {
    DbUser {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        profile_image_url: user.profile_image_url.clone(),
        role: user.role.as_str().to_string(),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

fn db_to_user(db: DbUser) -> Result<User, StoreError> {
    Ok(User {
        id: db.id,
        role: db.role.parse().map_err(StoreError::Backend)?,
        name: db.name,
        email: db.email,
        password_hash: db.password_hash,
        profile_image_url: db.profile_image_url,
        created_at: db.created_at,
        updated_at: db.updated_at,
    })
}

fn task_to_db(task: &Task) -> Result<DbTask, StoreError> {
    Ok(DbTask {
        id: task.id,
        title: task.title.clone(),
        description: task.description.clone(),
        priority: task.priority.as_str().to_string(),
        status: task.status.as_str().to_string(),
        due_date: task.due_date,
        assigned_to: task.assigned_to.clone(),
        created_by: task.created_by,
        attachments: task.attachments.clone(),
        todo_checklist: serde_json::to_value(&task.todo_checklist)
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        progress: task.progress,
        created_at: task.created_at,
        updated_at: task.updated_at,
    })
}

fn db_to_task(db: DbTask) -> Result<Task, StoreError> {
    let todo_checklist: Vec<ChecklistItem> = serde_json::from_value(db.todo_checklist)
        .map_err(|e| StoreError::Backend(format!("corrupt checklist on task {}: {e}", db.id)))?;
    Ok(Task {
        id: db.id,
        title: db.title,
        description: db.description,
        priority: db.priority.parse().map_err(StoreError::Backend)?,
        status: db.status.parse().map_err(StoreError::Backend)?,
        due_date: db.due_date,
        assigned_to: db.assigned_to,
        created_by: db.created_by,
        attachments: db.attachments,
        todo_checklist,
        progress: db.progress,
        created_at: db.created_at,
        updated_at: db.updated_at,
    })
}

fn map_diesel(e: DieselError) -> StoreError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::DuplicateEmail
        }
        DieselError::NotFound => StoreError::NotFound,
        other => StoreError::Backend(other.to_string()),
    }
}

fn filtered(query: &TaskQuery) -> tasks::BoxedQuery<'static, Pg> {
    let mut db_query = tasks::table.into_boxed();

    if let Some(assignee) = query.assignee {
        db_query = db_query.filter(tasks::assigned_to.contains(vec![assignee]));
    }
    if let Some(status) = query.status {
        db_query = db_query.filter(tasks::status.eq(status.as_str()));
    }
    if let Some(priority) = query.priority {
        db_query = db_query.filter(tasks::priority.eq(priority.as_str()));
    }
    if let Some(now) = query.overdue_at {
        db_query = db_query
            .filter(tasks::due_date.lt(now))
            .filter(tasks::status.ne(crate::tasks::TaskStatus::Completed.as_str()));
    }

    db_query
}

/// Diesel-backed store. Every call checks out a pooled connection on the
/// blocking thread pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("Task join error: {e}")))?
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let row = user_to_db(&user);
        self.run(move |conn| {
            diesel::insert_into(users::table)
                .values(&row)
                .execute(conn)
                .map_err(map_diesel)?;
            Ok(user)
        })
        .await
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.run(move |conn| {
            users::table
                .find(id)
                .first::<DbUser>(conn)
                .optional()
                .map_err(map_diesel)?
                .map(db_to_user)
                .transpose()
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_string();
        self.run(move |conn| {
            users::table
                .filter(users::email.eq(email))
                .first::<DbUser>(conn)
                .optional()
                .map_err(map_diesel)?
                .map(db_to_user)
                .transpose()
        })
        .await
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let ids = ids.to_vec();
        self.run(move |conn| {
            let rows: Vec<DbUser> = users::table
                .filter(users::id.eq_any(ids.clone()))
                .load(conn)
                .map_err(map_diesel)?;

            let mut by_id: HashMap<Uuid, DbUser> =
                rows.into_iter().map(|row| (row.id, row)).collect();
            ids.iter()
                .filter_map(|id| by_id.remove(id))
                .map(db_to_user)
                .collect()
        })
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.run(|conn| {
            users::table
                .order(users::created_at.asc())
                .load::<DbUser>(conn)
                .map_err(map_diesel)?
                .into_iter()
                .map(db_to_user)
                .collect()
        })
        .await
    }

    async fn update_user(&self, user: User) -> Result<User, StoreError> {
        let row = user_to_db(&user);
        self.run(move |conn| {
            let updated = diesel::update(users::table.find(row.id))
                .set(&row)
                .execute(conn)
                .map_err(map_diesel)?;
            if updated == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(user)
        })
        .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        self.run(move |conn| {
            let deleted = diesel::delete(users::table.find(id))
                .execute(conn)
                .map_err(map_diesel)?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: Task) -> Result<Task, StoreError> {
        let row = task_to_db(&task)?;
        self.run(move |conn| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(conn)
                .map_err(map_diesel)?;
            Ok(task)
        })
        .await
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        self.run(move |conn| {
            tasks::table
                .find(id)
                .first::<DbTask>(conn)
                .optional()
                .map_err(map_diesel)?
                .map(db_to_task)
                .transpose()
        })
        .await
    }

    async fn find_tasks(
        &self,
        query: &TaskQuery,
        limit: Option<i64>,
    ) -> Result<Vec<Task>, StoreError> {
        let query = query.clone();
        self.run(move |conn| {
            let mut db_query = filtered(&query).order(tasks::created_at.desc());
            if let Some(limit) = limit {
                db_query = db_query.limit(limit);
            }
            db_query
                .load::<DbTask>(conn)
                .map_err(map_diesel)?
                .into_iter()
                .map(db_to_task)
                .collect()
        })
        .await
    }

    async fn count_tasks(&self, query: &TaskQuery) -> Result<i64, StoreError> {
        let query = query.clone();
        self.run(move |conn| {
            filtered(&query)
                .count()
                .get_result::<i64>(conn)
                .map_err(map_diesel)
        })
        .await
    }

    async fn save_task(&self, task: Task) -> Result<Task, StoreError> {
        let row = task_to_db(&task)?;
        self.run(move |conn| {
            let updated = diesel::update(tasks::table.find(row.id))
                .set(&row)
                .execute(conn)
                .map_err(map_diesel)?;
            if updated == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(task)
        })
        .await
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        self.run(move |conn| {
            let deleted = diesel::delete(tasks::table.find(id))
                .execute(conn)
                .map_err(map_diesel)?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{TaskPriority, TaskStatus};
    use crate::users::Role;

    #[test]
    fn test_task_row_conversion_keeps_wire_values() {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: "Row".into(),
            description: "d".into(),
            priority: TaskPriority::High,
            status: TaskStatus::InProgress,
            due_date: now,
            assigned_to: vec![Uuid::new_v4()],
            created_by: Uuid::new_v4(),
            attachments: vec!["https://files/a.pdf".into()],
            todo_checklist: vec![ChecklistItem::new("a", true)],
            progress: 100,
            created_at: now,
            updated_at: now,
        };

        let row = task_to_db(&task).expect("row");
        assert_eq!(row.status, "In Progress");
        assert_eq!(row.priority, "High");
        assert_eq!(db_to_task(row).expect("task"), task);
    }

    #[test]
    fn test_unknown_role_is_backend_error() {
        let user = User::new("A".into(), "a@x.io".into(), "h".into(), None, Role::Admin);
        let mut row = user_to_db(&user);
        assert_eq!(row.role, "admin");
        row.role = "owner".into();
        assert!(matches!(db_to_user(row), Err(StoreError::Backend(_))));
    }
}

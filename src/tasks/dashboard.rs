//! Dashboard aggregation over the task store.
//!
//! The same computation serves the fleet-wide admin view (`assignee = None`)
//! and the per-member view; only the query scope differs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{Task, TaskPriority, TaskStatus};
use crate::storage::{StoreError, TaskQuery, TaskStore};

pub const RECENT_TASKS_LIMIT: i64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatistics {
    pub total_tasks: i64,
    pub pending_tasks: i64,
    pub completed_tasks: i64,
    pub overdue_tasks: i64,
}

/// Keys are fixed; buckets with no tasks serialize as 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskDistribution {
    #[serde(rename = "Pending")]
    pub pending: i64,
    #[serde(rename = "InProgress")]
    pub in_progress: i64,
    #[serde(rename = "Completed")]
    pub completed: i64,
    #[serde(rename = "All")]
    pub all: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskPriorityLevels {
    #[serde(rename = "Low")]
    pub low: i64,
    #[serde(rename = "Medium")]
    pub medium: i64,
    #[serde(rename = "High")]
    pub high: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCharts {
    pub task_distribution: TaskDistribution,
    pub task_priority_levels: TaskPriorityLevels,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentTask {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for RecentTask {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            created_at: task.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub statistics: DashboardStatistics,
    pub charts: DashboardCharts,
    pub recent_tasks: Vec<RecentTask>,
}

/// Every count is its own store query; the first failure aborts the whole
/// dashboard.
pub async fn build_dashboard(
    store: &dyn TaskStore,
    assignee: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<DashboardData, StoreError> {
    let scope = TaskQuery::scoped(assignee);

    let total_tasks = store.count_tasks(&scope).await?;

    let mut distribution = TaskDistribution {
        all: total_tasks,
        ..TaskDistribution::default()
    };
    for status in TaskStatus::ALL {
        let count = store
            .count_tasks(&scope.clone().with_status(status))
            .await?;
        match status {
            TaskStatus::Pending => distribution.pending = count,
            TaskStatus::InProgress => distribution.in_progress = count,
            TaskStatus::Completed => distribution.completed = count,
        }
    }

    let mut priority_levels = TaskPriorityLevels::default();
    for priority in TaskPriority::ALL {
        let count = store
            .count_tasks(&scope.clone().with_priority(priority))
            .await?;
        match priority {
            TaskPriority::Low => priority_levels.low = count,
            TaskPriority::Medium => priority_levels.medium = count,
            TaskPriority::High => priority_levels.high = count,
        }
    }

    let overdue_tasks = store.count_tasks(&scope.clone().overdue_at(now)).await?;

    let recent_tasks = store
        .find_tasks(&scope, Some(RECENT_TASKS_LIMIT))
        .await?
        .into_iter()
        .map(RecentTask::from)
        .collect();

    Ok(DashboardData {
        statistics: DashboardStatistics {
            total_tasks,
            pending_tasks: distribution.pending,
            completed_tasks: distribution.completed,
            overdue_tasks,
        },
        charts: DashboardCharts {
            task_distribution: distribution,
            task_priority_levels: priority_levels,
        },
        recent_tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn task(
        status: TaskStatus,
        priority: TaskPriority,
        due: DateTime<Utc>,
        created: DateTime<Utc>,
        assigned_to: Vec<Uuid>,
    ) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: format!("{status} {priority}"),
            description: String::new(),
            priority,
            status,
            due_date: due,
            assigned_to,
            created_by: Uuid::new_v4(),
            attachments: vec![],
            todo_checklist: vec![],
            progress: 0,
            created_at: created,
            updated_at: created,
        }
    }

    #[tokio::test]
    async fn test_empty_store_is_zero_filled() {
        let store = MemoryStore::new();
        let data = build_dashboard(&store, None, Utc::now()).await.expect("dashboard");

        assert_eq!(data.statistics, DashboardStatistics::default());
        assert_eq!(data.charts, DashboardCharts::default());
        assert!(data.recent_tasks.is_empty());

        let json = serde_json::to_value(&data).expect("json");
        for key in ["Pending", "InProgress", "Completed", "All"] {
            assert_eq!(json["charts"]["taskDistribution"][key], 0, "{key}");
        }
        for key in ["Low", "Medium", "High"] {
            assert_eq!(json["charts"]["taskPriorityLevels"][key], 0, "{key}");
        }
        assert_eq!(json["statistics"]["overdueTasks"], 0);
    }

    #[tokio::test]
    async fn test_overdue_counts_only_unfinished_past_due() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let past = now - Duration::days(2);
        let future = now + Duration::days(2);

        for t in [
            task(TaskStatus::InProgress, TaskPriority::High, past, now, vec![]),
            task(TaskStatus::Completed, TaskPriority::High, past, now, vec![]),
            task(TaskStatus::Pending, TaskPriority::Low, future, now, vec![]),
        ] {
            store.insert_task(t).await.expect("insert");
        }

        let data = build_dashboard(&store, None, now).await.expect("dashboard");
        assert_eq!(data.statistics.overdue_tasks, 1);
        assert_eq!(data.statistics.total_tasks, 3);
        assert_eq!(data.statistics.pending_tasks, 1);
        assert_eq!(data.statistics.completed_tasks, 1);
        assert_eq!(data.charts.task_distribution.in_progress, 1);
        assert_eq!(data.charts.task_distribution.all, 3);
        assert_eq!(data.charts.task_priority_levels.high, 2);
        assert_eq!(data.charts.task_priority_levels.medium, 0);
    }

    #[tokio::test]
    async fn test_member_scope_and_recent_limit() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let now = Utc::now();

        for i in 0..12 {
            let created = now - Duration::minutes(i);
            store
                .insert_task(task(
                    TaskStatus::Pending,
                    TaskPriority::Medium,
                    now,
                    created,
                    vec![member],
                ))
                .await
                .expect("insert");
        }
        store
            .insert_task(task(TaskStatus::Pending, TaskPriority::Low, now, now, vec![]))
            .await
            .expect("insert");

        let mine = build_dashboard(&store, Some(member), now).await.expect("dashboard");
        assert_eq!(mine.statistics.total_tasks, 12);
        assert_eq!(mine.charts.task_priority_levels.low, 0);
        assert_eq!(mine.recent_tasks.len(), 10);
        assert!(mine
            .recent_tasks
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));

        let fleet = build_dashboard(&store, None, now).await.expect("dashboard");
        assert_eq!(fleet.statistics.total_tasks, 13);
    }
}

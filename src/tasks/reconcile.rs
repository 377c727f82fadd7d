//! Progress and status derivation for tasks.
//!
//! Two independent paths write `status`:
//!
//! - [`apply_status`] sets it explicitly. `Completed` forces the checklist
//!   closed and progress to 100; other values leave checklist and progress
//!   untouched.
//! - [`replace_checklist`] swaps the checklist wholesale and derives both
//!   progress and status from it, overwriting whatever status was set before.
//!
//! Whichever ran last determines the stored status; the two may disagree
//! until the next checklist replacement.

use chrono::Utc;

use super::types::{ChecklistItem, Task, TaskStatus};

/// `round(100 * completed / total)`, rounding halves up; 0 for an empty list.
pub fn calculate_progress(checklist: &[ChecklistItem]) -> i32 {
    let total = checklist.len() as u64;
    if total == 0 {
        return 0;
    }
    let completed = checklist.iter().filter(|item| item.completed).count() as u64;
    ((200 * completed + total) / (2 * total)) as i32
}

pub fn status_for_progress(progress: i32) -> TaskStatus {
    match progress {
        p if p >= 100 => TaskStatus::Completed,
        p if p <= 0 => TaskStatus::Pending,
        _ => TaskStatus::InProgress,
    }
}

pub fn apply_status(task: &mut Task, status: TaskStatus) {
    task.status = status;
    if status == TaskStatus::Completed {
        for item in &mut task.todo_checklist {
            item.completed = true;
        }
        task.progress = 100;
    }
    task.updated_at = Utc::now();
}

pub fn replace_checklist(task: &mut Task, checklist: Vec<ChecklistItem>) {
    task.todo_checklist = checklist;
    task.progress = calculate_progress(&task.todo_checklist);
    task.status = status_for_progress(task.progress);
    task.updated_at = Utc::now();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::types::TaskPriority;
    use uuid::Uuid;

    fn items(flags: &[bool]) -> Vec<ChecklistItem> {
        flags
            .iter()
            .enumerate()
            .map(|(i, done)| ChecklistItem::new(format!("item {i}"), *done))
            .collect()
    }

    fn task_with(checklist: Vec<ChecklistItem>, status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "Release".into(),
            description: String::new(),
            priority: TaskPriority::Medium,
            status,
            due_date: now,
            assigned_to: vec![],
            created_by: Uuid::new_v4(),
            attachments: vec![],
            todo_checklist: checklist,
            progress: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_progress_of_empty_checklist_is_zero() {
        assert_eq!(calculate_progress(&[]), 0);
    }

    #[test]
    fn test_progress_rounds_to_nearest() {
        assert_eq!(calculate_progress(&items(&[true, false, false])), 33);
        assert_eq!(calculate_progress(&items(&[true, true, false])), 67);
        assert_eq!(calculate_progress(&items(&[true, false, false, false, false, false, false, false])), 13);
        assert_eq!(calculate_progress(&items(&[true, true, true, true])), 100);
    }

    #[test]
    fn test_progress_matches_formula_for_small_lists() {
        for total in 1..=12usize {
            for done in 0..=total {
                let flags: Vec<bool> = (0..total).map(|i| i < done).collect();
                let expected = (100.0 * done as f64 / total as f64).round() as i32;
                assert_eq!(calculate_progress(&items(&flags)), expected, "{done}/{total}");
            }
        }
    }

    #[test]
    fn test_status_for_progress_boundaries() {
        assert_eq!(status_for_progress(0), TaskStatus::Pending);
        assert_eq!(status_for_progress(1), TaskStatus::InProgress);
        assert_eq!(status_for_progress(99), TaskStatus::InProgress);
        assert_eq!(status_for_progress(100), TaskStatus::Completed);
    }

    #[test]
    fn test_checklist_scenario_half_then_full() {
        let mut task = task_with(vec![], TaskStatus::Pending);

        replace_checklist(
            &mut task,
            vec![ChecklistItem::new("wash", false), ChecklistItem::new("code", true)],
        );
        assert_eq!(task.progress, 50);
        assert_eq!(task.status, TaskStatus::InProgress);

        replace_checklist(
            &mut task,
            vec![ChecklistItem::new("wash", true), ChecklistItem::new("code", true)],
        );
        assert_eq!(task.progress, 100);
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn test_checklist_overwrites_explicit_status() {
        let mut task = task_with(items(&[false, false]), TaskStatus::Completed);
        replace_checklist(&mut task, items(&[false, false]));
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0);
    }

    #[test]
    fn test_empty_checklist_resets_to_pending() {
        let mut task = task_with(items(&[true]), TaskStatus::Completed);
        replace_checklist(&mut task, vec![]);
        assert_eq!(task.progress, 0);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_completed_status_closes_checklist() {
        let mut task = task_with(items(&[false, true, false]), TaskStatus::InProgress);
        task.progress = 33;

        apply_status(&mut task, TaskStatus::Completed);

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100);
        assert!(task.todo_checklist.iter().all(|item| item.completed));
    }

    #[test]
    fn test_other_status_leaves_checklist_alone() {
        let mut task = task_with(items(&[true, true]), TaskStatus::Completed);
        task.progress = 100;

        apply_status(&mut task, TaskStatus::Pending);

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 100);
        assert!(task.todo_checklist.iter().all(|item| item.completed));
    }

    #[test]
    fn test_last_writer_wins_between_paths() {
        let mut task = task_with(items(&[false, false]), TaskStatus::Pending);

        apply_status(&mut task, TaskStatus::InProgress);
        assert_eq!(task.status, TaskStatus::InProgress);

        replace_checklist(&mut task, items(&[false, false]));
        assert_eq!(task.status, TaskStatus::Pending);
    }
}

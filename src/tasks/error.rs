use crate::core::error::ApiError;
use crate::storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task not found")]
    NotFound,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound => ApiError::not_found("Task not found"),
            TaskError::Forbidden(msg) => ApiError::forbidden(msg),
            TaskError::Validation(msg) => ApiError::validation(msg),
            TaskError::Store(e) => ApiError::from(e),
        }
    }
}

use crate::core::config::AppConfig;
use crate::security::jwt::JwtManager;
use crate::security::password::PasswordHasher;
use crate::storage::{TaskStore, UserStore};
use crate::tasks::TaskEngine;
use std::sync::Arc;

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub task_engine: Arc<TaskEngine>,
    pub jwt_manager: Arc<JwtManager>,
    pub password_hasher: Arc<PasswordHasher>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        password_hasher: PasswordHasher,
    ) -> anyhow::Result<Self> {
        let jwt_manager = JwtManager::from_secret(&config.jwt_secret)?;
        let task_engine = TaskEngine::new(Arc::clone(&users), Arc::clone(&tasks));
        Ok(Self {
            config: Arc::new(config),
            users,
            tasks,
            task_engine: Arc::new(task_engine),
            jwt_manager: Arc::new(jwt_manager),
            password_hasher: Arc::new(password_hasher),
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.config.store)
            .field("upload_dir", &self.config.upload_dir)
            .finish_non_exhaustive()
    }
}

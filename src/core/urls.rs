#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    // Auth - JSON APIs
    pub const AUTH_REGISTER: &'static str = "/api/auth/register";
    pub const AUTH_LOGIN: &'static str = "/api/auth/login";
    pub const AUTH_PROFILE: &'static str = "/api/auth/profile";
    pub const AUTH_UPDATE_PROFILE: &'static str = "/api/auth/update-profile";
    pub const AUTH_UPLOAD_IMAGE: &'static str = "/api/auth/upload-image";

    // User management - JSON APIs
    pub const USERS: &'static str = "/api/users";
    pub const USER_BY_ID: &'static str = "/api/users/{id}";

    // Tasks - JSON APIs
    pub const TASKS: &'static str = "/api/tasks";
    pub const TASK_BY_ID: &'static str = "/api/tasks/{id}";
    pub const TASK_STATUS: &'static str = "/api/tasks/{id}/status";
    pub const TASK_TODO: &'static str = "/api/tasks/{id}/todo";
    pub const TASKS_DASHBOARD: &'static str = "/api/tasks/dashboard-data";
    pub const TASKS_USER_DASHBOARD: &'static str = "/api/tasks/user-dashboard-data";

    // Reports - CSV exports
    pub const REPORTS_EXPORT_TASKS: &'static str = "/api/reports/export/tasks";
    pub const REPORTS_EXPORT_USERS: &'static str = "/api/reports/export/users";

    pub const HEALTH: &'static str = "/health";
    pub const UPLOADS: &'static str = "/uploads";
}

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use log::{info, warn};
use std::sync::Arc;

use super::types::{LoginRequest, RegisterRequest, UpdateProfileRequest, UploadImageResponse};
use super::upload::{is_allowed_image_type, public_upload_url, stored_file_name, IMAGE_FIELD};
use crate::core::error::ApiError;
use crate::core::urls::ApiUrls;
use crate::security::{AuthenticatedUser, PasswordHasher};
use crate::shared::state::AppState;
use crate::users::{normalize_email, AuthResponse, Role, User, UserProfile};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("{field} is required")))
}

fn check_email(email: &str) -> Result<(), ApiError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ApiError::validation("Please provide a valid email address")),
    }
}

async fn hash_password(hasher: Arc<PasswordHasher>, password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await?
        .map_err(|e| ApiError::internal(e.to_string()))
}

fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    state
        .jwt_manager
        .generate_token(user.id)
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// Admin role is granted only when the server has an invite token configured
/// and the caller presents exactly that value.
fn role_for_invite(configured: Option<&str>, presented: Option<&str>) -> Role {
    match (configured, presented) {
        (Some(expected), Some(given)) if !expected.is_empty() && expected == given => Role::Admin,
        _ => Role::Member,
    }
}

pub async fn handle_register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(req) = payload?;

    let name = required(req.name, "Name")?;
    let email = normalize_email(&required(req.email, "Email")?);
    check_email(&email)?;
    let password = req
        .password
        .ok_or_else(|| ApiError::validation("Password is required"))?;
    state
        .password_hasher
        .validate(&password)
        .map_err(|issue| ApiError::validation(issue.message()))?;

    if state.users.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let role = role_for_invite(
        state.config.admin_invite_token.as_deref(),
        req.admin_invite_token.as_deref(),
    );
    let password_hash = hash_password(Arc::clone(&state.password_hasher), password).await?;
    let profile_image_url = req.profile_image_url.filter(|url| !url.trim().is_empty());

    let user = state
        .users
        .insert_user(User::new(name, email, password_hash, profile_image_url, role))
        .await?;
    info!("Registered user {} with role {}", user.id, user.role);

    let token = issue_token(&state, &user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse::new(&user, token))))
}

pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    let email = normalize_email(&required(req.email, "Email")?);
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("Password is required"))?;

    let Some(user) = state.users.find_user_by_email(&email).await? else {
        let hasher = Arc::clone(&state.password_hasher);
        tokio::task::spawn_blocking(move || hasher.verify_unknown_account(&password)).await?;
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let hasher = Arc::clone(&state.password_hasher);
    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
        .await?
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !matches {
        warn!("Failed login for user {}", user.id);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse::new(&user, token)))
}

pub async fn handle_get_profile(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .users
        .find_user(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(UserProfile::from(&user)))
}

pub async fn handle_update_profile(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    let mut user = state
        .users
        .find_user(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if let Some(name) = req.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::validation("Name cannot be empty"));
        }
        user.name = name;
    }

    if let Some(email) = req.email {
        let email = normalize_email(&email);
        check_email(&email)?;
        if email != user.email {
            if let Some(existing) = state.users.find_user_by_email(&email).await? {
                if existing.id != user.id {
                    return Err(ApiError::Conflict("Email already in use".to_string()));
                }
            }
            user.email = email;
        }
    }

    if let Some(url) = req.profile_image_url {
        user.profile_image_url = Some(url).filter(|u| !u.trim().is_empty());
    }

    if let Some(password) = req.password {
        state
            .password_hasher
            .validate(&password)
            .map_err(|issue| ApiError::validation(issue.message()))?;
        user.password_hash = hash_password(Arc::clone(&state.password_hasher), password).await?;
    }

    user.updated_at = chrono::Utc::now();
    let user = state.users.update_user(user).await?;
    info!("Profile updated for user {}", user.id);

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse::new(&user, token)))
}

pub async fn handle_upload_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadImageResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        if !is_allowed_image_type(field.content_type()) {
            return Err(ApiError::validation(
                "Only .jpeg, .jpg, .png and .gif formats are allowed",
            ));
        }

        let file_name = stored_file_name(field.file_name().unwrap_or("image"));
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;
        if bytes.is_empty() {
            return Err(ApiError::validation("Uploaded file is empty"));
        }

        let upload_dir = &state.config.upload_dir;
        tokio::fs::create_dir_all(upload_dir)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create upload dir: {e}")))?;
        tokio::fs::write(upload_dir.join(&file_name), &bytes)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to store upload: {e}")))?;

        info!("Stored upload {} ({} bytes)", file_name, bytes.len());
        return Ok(Json(UploadImageResponse {
            image_url: public_upload_url(&headers, ApiUrls::UPLOADS, &file_name),
        }));
    }

    Err(ApiError::validation("No file uploaded"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_for_invite() {
        assert_eq!(role_for_invite(Some("s3cret"), Some("s3cret")), Role::Admin);
        assert_eq!(role_for_invite(Some("s3cret"), Some(" s3cret ")), Role::Member);
        assert_eq!(role_for_invite(Some("s3cret"), Some("s3cret\t")), Role::Member);
        assert_eq!(role_for_invite(Some("s3cret"), Some("guess")), Role::Member);
        assert_eq!(role_for_invite(Some("s3cret"), None), Role::Member);
        assert_eq!(role_for_invite(None, Some("")), Role::Member);
        assert_eq!(role_for_invite(Some(""), Some("")), Role::Member);
    }

    #[test]
    fn test_check_email() {
        assert!(check_email("ada@example.com").is_ok());
        assert!(check_email("ada@localhost").is_err());
        assert!(check_email("@example.com").is_err());
        assert!(check_email("ada.example.com").is_err());
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required(Some("  Ada ".into()), "Name").expect("name"), "Ada");
        assert!(required(Some("   ".into()), "Name").is_err());
        assert!(required(None, "Name").is_err());
    }
}

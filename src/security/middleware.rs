use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::ApiError;
use crate::shared::state::AppState;
use crate::users::{Role, User};

use super::jwt::TokenError;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Caller identity, inserted into request extensions by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_image_url: Option<String>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            profile_image_url: user.profile_image_url.clone(),
        }
    }
}

pub fn extract_bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the bearer token to a live user. The user is re-read on every
/// request so deletions and role changes apply immediately.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = {
        let token = extract_bearer_token(&request)
            .ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))?;

        state.jwt_manager.validate_token(token).map_err(|e| {
            debug!("Rejecting token for {}: {:?}", request.uri().path(), e);
            match e {
                TokenError::Expired => ApiError::unauthorized("Not authorized, token expired"),
                TokenError::Invalid => ApiError::unauthorized("Not authorized, token failed"),
            }
        })?
    };

    let user_id = claims
        .user_id()
        .map_err(|_| ApiError::unauthorized("Not authorized, token failed"))?;

    let user = state
        .users
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Not authorized, user not found"))?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(&user));
    Ok(next.run(request).await)
}

pub async fn admin_only_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<AuthenticatedUser>()
        .is_some_and(AuthenticatedUser::is_admin);

    if !is_admin {
        return Err(ApiError::forbidden("Access denied, admin only"));
    }

    Ok(next.run(request).await)
}

pub mod cors;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use cors::{create_cors_layer, CorsConfig};
pub use jwt::{Claims, JwtConfig, JwtManager, TokenError};
pub use middleware::{
    admin_only_middleware, auth_middleware, extract_bearer_token, AuthenticatedUser,
};
pub use password::{Argon2Config, PasswordHasher, PasswordIssue};

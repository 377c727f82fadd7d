use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Which backend the task and identity stores run on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub admin_invite_token: Option<String>,
    /// `None` means any origin is accepted.
    pub client_url: Option<String>,
    pub upload_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_map(values: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_opt = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_str = |key: &str, default: &str| get_opt(key).unwrap_or_else(|| default.to_string());

        let store = match get_str("TASKSERVER_STORE", "postgres").to_lowercase().as_str() {
            "postgres" | "pg" => StoreBackend::Postgres,
            "memory" | "mem" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    key: "TASKSERVER_STORE",
                    reason: format!("unknown backend '{other}'"),
                })
            }
        };

        let database_url = get_opt("DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = get_opt("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} characters"),
            });
        }

        let port = match get_opt("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let client_url = get_opt("CLIENT_URL").filter(|origin| origin.as_str() != "*");
        if let Some(raw) = &client_url {
            check_origins(raw)?;
        }

        Ok(Self {
            server: ServerConfig {
                host: get_str("HOST", "0.0.0.0"),
                port,
            },
            store,
            database_url,
            jwt_secret,
            admin_invite_token: get_opt("ADMIN_INVITE_TOKEN"),
            client_url,
            upload_dir: PathBuf::from(get_str("UPLOAD_DIR", DEFAULT_UPLOAD_DIR)),
        })
    }
}

/// Every comma separated entry must be a usable `Origin` header value.
fn check_origins(raw: &str) -> Result<(), ConfigError> {
    let mut seen = 0;
    for origin in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if axum::http::HeaderValue::from_str(origin).is_err() {
            return Err(ConfigError::Invalid {
                key: "CLIENT_URL",
                reason: format!("unusable origin {origin:?}"),
            });
        }
        seen += 1;
    }
    if seen == 0 {
        return Err(ConfigError::Invalid {
            key: "CLIENT_URL",
            reason: "no origins listed".to_string(),
        });
    }
    Ok(())
}

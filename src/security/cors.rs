use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<header::HeaderName>,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allowed_methods: vec![Method::GET, Method::POST, Method::PUT, Method::DELETE],
            allowed_headers: vec![header::CONTENT_TYPE, header::AUTHORIZATION],
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    /// Accepts a single origin or a comma separated list.
    pub fn from_client_url(client_url: Option<&str>) -> Self {
        let origins = client_url
            .map(|value| {
                value
                    .split(',')
                    .map(|s| s.trim().trim_end_matches('/').to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self::default().with_origins(origins)
    }

    pub fn with_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    pub fn build(self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring unparseable CORS origin {o:?}");
                    None
                }
            })
            .collect();

        // Configured origins that all fail to parse allow nothing.
        let allow_origin = if self.allowed_origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(self.allowed_methods)
            .allow_headers(self.allowed_headers)
            .max_age(std::time::Duration::from_secs(self.max_age_secs))
    }
}

pub fn create_cors_layer(client_url: Option<&str>) -> CorsLayer {
    let config = CorsConfig::from_client_url(client_url);
    if config.allowed_origins.is_empty() {
        info!("Creating CORS layer accepting any origin");
    } else {
        info!(
            "Creating CORS layer with {} allowed origin(s)",
            config.allowed_origins.len()
        );
    }
    config.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_url_list_is_split_and_trimmed() {
        let config = CorsConfig::from_client_url(Some("http://a.test/, http://b.test ,"));
        assert_eq!(
            config.allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unparseable_origins_allow_nothing() {
        use axum::{body::Body, http::Request, routing::get, Router};
        use tower::ServiceExt;

        let layer = CorsConfig::default()
            .with_origins(vec!["http://bad\norigin".to_string()])
            .build();
        let app = Router::new().route("/", get(|| async { "ok" })).layer(layer);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "http://evil.test")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn test_missing_client_url_allows_any() {
        let config = CorsConfig::from_client_url(None);
        assert!(config.allowed_origins.is_empty());
        assert_eq!(config.allowed_methods.len(), 4);
        assert!(config.allowed_headers.contains(&header::AUTHORIZATION));
    }
}

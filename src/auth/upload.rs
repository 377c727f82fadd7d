use axum::http::{header, HeaderMap};
use chrono::Utc;

pub const IMAGE_FIELD: &str = "image";
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

pub fn is_allowed_image_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .is_some_and(|ct| ALLOWED_IMAGE_TYPES.contains(&ct.as_str()))
}

/// Strips directories and anything outside `[A-Za-z0-9._-]` from a client
/// supplied file name.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn stored_file_name(original: &str) -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        sanitize_file_name(original)
    )
}

/// Absolute URL for a stored upload, honouring reverse-proxy headers.
pub fn public_upload_url(headers: &HeaderMap, uploads_path: &str, file_name: &str) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("localhost");
    format!("{proto}://{host}{uploads_path}/{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_allowed_image_types() {
        assert!(is_allowed_image_type(Some("image/png")));
        assert!(is_allowed_image_type(Some("IMAGE/JPEG")));
        assert!(is_allowed_image_type(Some("image/gif; charset=binary")));
        assert!(!is_allowed_image_type(Some("image/svg+xml")));
        assert!(!is_allowed_image_type(Some("application/pdf")));
        assert!(!is_allowed_image_type(None));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("avatar.png"), "avatar.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\pics\\my photo.jpg"), "my_photo.jpg");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn test_stored_file_name_has_timestamp_prefix() {
        let name = stored_file_name("a b.png");
        let (prefix, rest) = name.split_once('-').expect("dash");
        assert!(prefix.parse::<i64>().is_ok());
        assert_eq!(rest, "a_b.png");
    }

    #[test]
    fn test_public_upload_url() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("api.local:8000"));
        assert_eq!(
            public_upload_url(&headers, "/uploads", "1-a.png"),
            "http://api.local:8000/uploads/1-a.png"
        );

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("tasks.example.com"));
        assert_eq!(
            public_upload_url(&headers, "/uploads", "1-a.png"),
            "https://tasks.example.com/uploads/1-a.png"
        );
    }
}

//! HTTP Basic Auth gate for the metrics endpoint.
//!
//! Only requests to `/metrics` are checked; every other path passes through.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

use crate::config::MetricsAuthConfig;

pub const METRICS_PATH: &str = "/metrics";
const REALM: &str = "Basic realm=\"Metrics\"";

pub async fn metrics_basic_auth(
    State(credentials): State<Arc<MetricsAuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() != METRICS_PATH {
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if check_basic_auth(auth_header, &credentials) {
        next.run(request).await
    } else {
        tracing::debug!("Rejected metrics scrape: bad or missing credentials");
        unauthorized_response()
    }
}

/// Validate an `Authorization` header value against the configured pair.
pub fn check_basic_auth(header_value: Option<&str>, credentials: &MetricsAuthConfig) -> bool {
    let Some(value) = header_value else {
        return false;
    };
    let Some((scheme, encoded)) = value.split_once(' ') else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("basic") {
        return false;
    }

    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    match decoded.split_once(':') {
        Some((username, password)) => {
            // No early exit between the two fields.
            let user_ok = constant_time_eq(username.as_bytes(), credentials.username.as_bytes());
            let pass_ok = constant_time_eq(password.as_bytes(), credentials.password.as_bytes());
            user_ok & pass_ok
        }
        None => false,
    }
}

/// Byte comparison whose running time depends only on the input lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}

pub fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, REALM)],
        "Unauthorized",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> MetricsAuthConfig {
        MetricsAuthConfig {
            username: "admin".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn test_valid_credentials() {
        // "admin:secret" in base64 = "YWRtaW46c2VjcmV0"
        assert!(check_basic_auth(Some("Basic YWRtaW46c2VjcmV0"), &creds()));
        assert!(check_basic_auth(Some("basic YWRtaW46c2VjcmV0"), &creds()));
    }

    #[test]
    fn test_password_may_contain_colon() {
        let creds = MetricsAuthConfig {
            username: "admin".into(),
            password: "se:cret".into(),
        };
        let encoded = STANDARD.encode("admin:se:cret");
        assert!(check_basic_auth(Some(&format!("Basic {encoded}")), &creds));
    }

    #[test]
    fn test_rejections() {
        let creds = creds();
        assert!(!check_basic_auth(None, &creds));
        assert!(!check_basic_auth(Some("Bearer YWRtaW46c2VjcmV0"), &creds));
        assert!(!check_basic_auth(Some("Basic"), &creds));
        assert!(!check_basic_auth(Some("Basic !!!not-base64!!!"), &creds));
        // "wrong:creds" in base64 = "d3Jvbmc6Y3JlZHM="
        assert!(!check_basic_auth(Some("Basic d3Jvbmc6Y3JlZHM="), &creds));
        // "admin" without a colon
        assert!(!check_basic_auth(Some("Basic YWRtaW4="), &creds));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(constant_time_eq(b"", b""));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
        assert!(!constant_time_eq(b"", b"x"));
    }

    #[test]
    fn test_empty_password_accepts_only_empty() {
        let creds = MetricsAuthConfig {
            username: "io-sentry".into(),
            password: String::new(),
        };
        let empty = STANDARD.encode("io-sentry:");
        let other = STANDARD.encode("io-sentry:x");
        assert!(check_basic_auth(Some(&format!("Basic {empty}")), &creds));
        assert!(!check_basic_auth(Some(&format!("Basic {other}")), &creds));
    }

    #[test]
    fn test_unauthorized_response_has_challenge() {
        let res = unauthorized_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], REALM);
    }
}

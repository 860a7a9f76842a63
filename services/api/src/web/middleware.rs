//! services/api/src/web/middleware.rs
//!
//! Session middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Name of the cookie that carries the raw identity credential.
pub const SESSION_COOKIE: &str = "token";

/// Credentials larger than this are treated as missing.
const MAX_CREDENTIAL_SIZE: usize = 8 * 1024;

/// Finds the credential in the `token` cookie, falling back to an
/// `Authorization: Bearer` header. The cookie wins when both are present.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    cookie_credential(headers)
        .or_else(|| bearer_credential(headers))
        .filter(|token| token.len() <= MAX_CREDENTIAL_SIZE)
}

fn cookie_credential(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (name, value) = c.trim().split_once('=')?;
            let value = value.trim().trim_matches('"');
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
}

fn bearer_credential(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Middleware that verifies the caller's credential with the identity provider.
///
/// If valid, inserts the `VerifiedIdentity` into request extensions for guards
/// and handlers to use. If invalid or missing, returns 401 Unauthorized.
pub async fn require_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the credential
    let credential = extract_credential(req.headers()).ok_or(ApiError::Unauthorized)?;

    // 2. Verify it on every request; nothing is cached
    let identity = state.identity.verify(&credential).await.map_err(|e| {
        debug!("Credential rejected: {}", e);
        ApiError::Unauthorized
    })?;

    // 3. Attach the identity and continue to the guards and handler
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_cookie_takes_precedence_over_bearer() {
        let map = headers(&[
            (header::COOKIE, "theme=dark; token=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(extract_credential(&map).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_bearer_used_without_cookie() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer abc.def")]);
        assert_eq!(extract_credential(&map).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_missing_or_malformed_credentials() {
        assert_eq!(extract_credential(&HeaderMap::new()), None);
        assert_eq!(extract_credential(&headers(&[(header::AUTHORIZATION, "Basic xyz")])), None);
        assert_eq!(extract_credential(&headers(&[(header::COOKIE, "token=")])), None);
        assert_eq!(extract_credential(&headers(&[(header::COOKIE, "mytoken=abc")])), None);
    }

    #[test]
    fn test_oversized_credential_is_ignored() {
        let huge = format!("Bearer {}", "a".repeat(MAX_CREDENTIAL_SIZE + 1));
        assert_eq!(extract_credential(&headers(&[(header::AUTHORIZATION, &huge)])), None);
    }
}

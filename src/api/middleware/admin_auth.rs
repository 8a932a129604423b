//! Admin authentication
//!
//! The admin token is configured once and kept only as a SHA-256 digest.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;

/// Digest of the configured admin bearer token
#[derive(Clone)]
pub struct AdminToken {
    digest: Vec<u8>,
}

impl AdminToken {
    pub fn new(token: &str) -> Self {
        Self {
            digest: Sha256::digest(token.as_bytes()).to_vec(),
        }
    }

    pub fn verify(&self, candidate: &str) -> bool {
        Sha256::digest(candidate.as_bytes()).as_slice() == self.digest.as_slice()
    }
}

impl std::fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminToken([REDACTED])")
    }
}

/// Extractor that requires `Authorization: Bearer <admin token>`
///
/// Answers 404 when no admin token is configured, so the admin surface
/// does not exist at all in that case.
#[derive(Debug, Clone)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_ref() else {
            return Err(ApiError::not_found("Not found"));
        };

        let token = extract_bearer_token(&parts.headers)?;

        if !expected.verify(&token) {
            warn!(path = %parts.uri.path(), "Rejected admin request with invalid token");
            return Err(ApiError::unauthorized("Invalid admin token"));
        }

        debug!(path = %parts.uri.path(), "Admin access granted");
        Ok(RequireAdmin)
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            ApiError::unauthorized("Admin token required. Provide via 'Authorization: Bearer <token>'")
        })?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header encoding"))?;

    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use the Bearer scheme"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    #[test]
    fn test_admin_token_verify() {
        let token = AdminToken::new("s3cret");

        assert!(token.verify("s3cret"));
        assert!(!token.verify("s3cret "));
        assert!(!token.verify(""));
    }

    #[test]
    fn test_admin_token_debug_is_redacted() {
        let token = AdminToken::new("s3cret");
        assert!(!format!("{:?}", token).contains("s3cret"));
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc "));

        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc");
    }

    #[test]
    fn test_extract_bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));

        let err = extract_bearer_token(&headers).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_extract_bearer_token_missing() {
        let err = extract_bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}

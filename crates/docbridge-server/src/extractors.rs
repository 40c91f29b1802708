//! Basic credentials extractor.
//!
//! Every document endpoint carries the end user's upstream credentials as
//! `Authorization: Basic <base64(email:password)>`.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use docbridge_core::UpstreamCredentials;

use crate::error::ApiError;

const MALFORMED: &str = "Malformed basic auth";

/// Upstream credentials decoded from the request.
///
/// Rejects with 401 when the header is missing and 400 when it is malformed.
#[derive(Debug, Clone)]
pub struct BasicCredentials(pub UpstreamCredentials);

impl<S> FromRequestParts<S> for BasicCredentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).ok_or_else(|| {
            ApiError::Unauthorized(
                "Missing credentials headers in request (use basic auth plain text)".into(),
            )
        })?;

        let header = header
            .to_str()
            .map_err(|_| ApiError::BadRequest(MALFORMED.into()))?;

        let (email, password) = parse_basic_auth(header).map_err(|e| {
            tracing::debug!(reason = %e, "Rejected basic auth header");
            ApiError::BadRequest(MALFORMED.into())
        })?;

        if email.is_empty() || password.is_empty() {
            return Err(ApiError::BadRequest(
                "email and password must not be empty".into(),
            ));
        }

        tracing::debug!(user = %email, "Decoded upstream credentials");

        Ok(Self(UpstreamCredentials::new(email, password)))
    }
}

/// Parse Basic Auth header.
///
/// Extracts credentials from "Basic <base64>" format. The scheme is matched
/// case-insensitively. The password is everything after the first `:`.
fn parse_basic_auth(header: &str) -> Result<(String, String), String> {
    let credentials = header
        .trim_start()
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("basic"))
        .map(|(_, credentials)| credentials)
        .ok_or_else(|| "Authorization header must start with 'Basic '".to_string())?;

    let decoded = STANDARD
        .decode(credentials.trim())
        .map_err(|_| "Invalid base64 encoding in Authorization header".to_string())?;

    let credentials_str = String::from_utf8(decoded)
        .map_err(|_| "Invalid UTF-8 in decoded credentials".to_string())?;

    let (email, password) = credentials_str
        .split_once(':')
        .ok_or_else(|| "Credentials must be in format 'email:password'".to_string())?;

    Ok((email.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    fn encode(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn test_parse_basic_auth_valid() {
        let (email, password) = parse_basic_auth(&encode("jane@example.com:s3cret")).unwrap();
        assert_eq!(email, "jane@example.com");
        assert_eq!(password, "s3cret");
    }

    #[test]
    fn test_parse_basic_auth_password_with_colon() {
        let (email, password) = parse_basic_auth(&encode("jane@example.com:a:b")).unwrap();
        assert_eq!(email, "jane@example.com");
        assert_eq!(password, "a:b");
    }

    #[test]
    fn test_parse_basic_auth_scheme_case_insensitive() {
        let b64 = STANDARD.encode("jane@example.com:s3cret");
        for scheme in ["basic", "BASIC", "bAsIc"] {
            let (email, password) = parse_basic_auth(&format!("{scheme} {b64}")).unwrap();
            assert_eq!(email, "jane@example.com");
            assert_eq!(password, "s3cret");
        }
    }

    #[test]
    fn test_parse_basic_auth_invalid_prefix() {
        let result = parse_basic_auth("Bearer token");
        assert!(result.unwrap_err().contains("Basic"));
    }

    #[test]
    fn test_parse_basic_auth_invalid_base64() {
        assert!(parse_basic_auth("Basic !!!").unwrap_err().contains("base64"));
    }

    #[test]
    fn test_parse_basic_auth_missing_colon() {
        assert!(parse_basic_auth(&encode("no-separator")).is_err());
    }

    #[test]
    fn test_parse_basic_auth_invalid_utf8() {
        let header = format!("Basic {}", STANDARD.encode([0xff, 0xfe, b':', b'x']));
        assert!(parse_basic_auth(&header).unwrap_err().contains("UTF-8"));
    }

    async fn status_for(header: Option<&str>) -> StatusCode {
        let app = Router::new().route(
            "/",
            get(|BasicCredentials(creds): BasicCredentials| async move { creds.email }),
        );
        let mut request = Request::builder().uri("/");
        if let Some(value) = header {
            request = request.header(AUTHORIZATION, value);
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_extractor_statuses() {
        assert_eq!(status_for(None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(Some("Bearer abc")).await, StatusCode::BAD_REQUEST);
        assert_eq!(status_for(Some(&encode(":pw"))).await, StatusCode::BAD_REQUEST);
        assert_eq!(status_for(Some(&encode("jane:"))).await, StatusCode::BAD_REQUEST);
        assert_eq!(status_for(Some(&encode("jane:pw"))).await, StatusCode::OK);
        let lowercase = format!("basic {}", STANDARD.encode("jane:pw"));
        assert_eq!(status_for(Some(&lowercase)).await, StatusCode::OK);
    }
}

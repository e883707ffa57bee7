//! Bearer credential checks feeding the stream handler's auth verdict
//!
//! Account management and token issuing happen elsewhere; these authorizers
//! only decide whether a request carries an acceptable credential.

use std::collections::HashSet;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use tunestream_core::AuthVerdict;

/// Produces an authorization verdict for an incoming request.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Inspect request headers and decide whether the caller may proceed.
    async fn authorize(&self, headers: &HeaderMap) -> AuthVerdict;
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` for a missing header, a scheme other than `Bearer`, or an
/// empty token.
///
/// # Examples
/// ```
/// use axum::http::{HeaderMap, HeaderValue, header};
/// use tunestream_web::bearer_token;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
/// assert_eq!(bearer_token(&headers), Some("abc123"));
/// ```
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Accepts only tokens from a fixed set.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthorizer {
    tokens: HashSet<String>,
}

impl StaticTokenAuthorizer {
    /// Create an authorizer accepting the given tokens
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Authorizer for StaticTokenAuthorizer {
    async fn authorize(&self, headers: &HeaderMap) -> AuthVerdict {
        match bearer_token(headers) {
            Some(token) if self.tokens.contains(token) => AuthVerdict::Authorized,
            _ => AuthVerdict::Unauthorized,
        }
    }
}

/// Accepts any well-formed bearer credential.
///
/// Used when no token list is configured, matching deployments where the
/// upstream gateway already validated the credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllAuthorizer;

#[async_trait]
impl Authorizer for AllowAllAuthorizer {
    async fn authorize(&self, headers: &HeaderMap) -> AuthVerdict {
        if bearer_token(headers).is_some() {
            AuthVerdict::Authorized
        } else {
            AuthVerdict::Unauthorized
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("bearer   abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_static_tokens() {
        let authorizer = StaticTokenAuthorizer::new(["secret"]);

        assert_eq!(
            authorizer.authorize(&headers_with("Bearer secret")).await,
            AuthVerdict::Authorized
        );
        assert_eq!(
            authorizer.authorize(&headers_with("Bearer guess")).await,
            AuthVerdict::Unauthorized
        );
        assert_eq!(
            authorizer.authorize(&HeaderMap::new()).await,
            AuthVerdict::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_allow_all_still_requires_credential() {
        let authorizer = AllowAllAuthorizer;

        assert_eq!(
            authorizer.authorize(&headers_with("Bearer anything")).await,
            AuthVerdict::Authorized
        );
        assert_eq!(
            authorizer.authorize(&HeaderMap::new()).await,
            AuthVerdict::Unauthorized
        );
    }
}

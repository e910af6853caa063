//! Caller Identity
//!
//! Authentication happens in front of this service. The authenticating proxy
//! forwards the verified user id in a configured header and, optionally, a
//! shared secret proving the header was set by the proxy.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::server::AppState;

/// Header the proxy uses to present its shared secret
pub const PROXY_SECRET_HEADER: &str = "x-proxy-secret";

/// Verified, stable caller reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Wrap a user id; blank ids are not identities
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The user id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the caller identity from request headers
pub fn identify(headers: &HeaderMap, auth: &AuthConfig) -> Option<Identity> {
    if let Some(expected) = &auth.proxy_secret {
        let provided = headers
            .get(PROXY_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            debug!("Proxy secret missing or mismatched");
            return None;
        }
    }

    headers
        .get(auth.identity_header.as_str())
        .and_then(|v| v.to_str().ok())
        .and_then(Identity::new)
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        identify(&parts.headers, &state.config.auth).ok_or(ApiError::Unauthenticated)
    }
}

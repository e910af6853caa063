//! Quota cookie transport
//!
//! One cookie per identity, so several accounts on one browser keep
//! separate counters.

use axum::http::{header, HeaderMap, HeaderValue};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::auth::Identity;

/// Cookie name holding `identity`'s quota token
///
/// Ids made only of `[A-Za-z0-9_-]` are used as-is; anything else is
/// base64url-encoded behind a `~` marker, which plain ids never contain.
pub fn quota_cookie_name(prefix: &str, identity: &Identity) -> String {
    let id = identity.as_str();
    if id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        format!("{}{}", prefix, id)
    } else {
        format!("{}~{}", prefix, URL_SAFE_NO_PAD.encode(id.as_bytes()))
    }
}

/// First value of cookie `name` across all `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}

/// `Set-Cookie` value for a quota token
///
/// Returns `None` if the name or value contains bytes not allowed in a
/// header.
pub fn quota_set_cookie(name: &str, value: &str, max_age_secs: u64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        name, value, max_age_secs
    ))
    .ok()
}

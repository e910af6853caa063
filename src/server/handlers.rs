//! HTTP handlers

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use super::cookies;
use super::AppState;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::metrics;
use crate::pagination::PageRequest;

/// Raw query pairs; `page` is read leniently from here
pub type QueryPairs = Vec<(String, String)>;

fn page_request(query: &QueryPairs) -> PageRequest {
    let raw = query
        .iter()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.as_str());
    PageRequest::parse(raw)
}

/// `GET /contacts?page=N`
pub async fn list_contacts(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<QueryPairs>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let cookie_name = cookies::quota_cookie_name(&state.config.quota.cookie_prefix, &identity);
    let prior_token = cookies::read_cookie(&headers, &cookie_name);
    let today = state.clock.today();

    let listing = state
        .service
        .list_contacts(&identity, page_request(&query), prior_token.as_deref(), today)
        .await?;

    let token = listing.token();
    let mut response = Json(listing.response).into_response();
    match cookies::quota_set_cookie(&cookie_name, &token, state.config.quota.cookie_max_age_secs) {
        Some(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        None => warn!(user = %identity, "Quota cookie not representable as a header"),
    }

    Ok(response)
}

/// `GET /agencies?page=N`
pub async fn list_agencies(
    State(state): State<AppState>,
    _identity: Identity,
    Query(query): Query<QueryPairs>,
) -> Result<Response, ApiError> {
    let response = state.service.list_agencies(page_request(&query)).await?;
    Ok(Json(response).into_response())
}

/// Liveness probe
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Prometheus scrape endpoint
pub async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error gathering metrics: {}", e),
            )
                .into_response()
        }
    }
}

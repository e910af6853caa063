//! Quota Token Codec
//!
//! The daily view counter travels with the caller as an opaque token instead
//! of living in server memory. The payload is `{"date":"YYYY-MM-DD","count":N}`
//! encoded as unpadded base64url so it can sit in a cookie value verbatim.
//!
//! Decoding is total: any failure, and any token from a previous day, yields a
//! fresh state with the full quota available. The token is not signed; a
//! caller can rewrite its own counter.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-identity view counter for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    /// UTC calendar day the counter belongs to
    pub day: NaiveDate,
    /// Records disclosed so far on `day`
    pub viewed_count: u32,
}

impl QuotaState {
    /// A state with nothing viewed yet on `today`
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            day: today,
            viewed_count: 0,
        }
    }

    /// Whether this state belongs to `today`
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.day == today
    }

    /// Reset to a fresh state if the day has rolled over
    pub fn rolled_over(self, today: NaiveDate) -> Self {
        if self.is_current(today) {
            self
        } else {
            Self::fresh(today)
        }
    }
}

/// Wire payload carried inside the token
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    date: String,
    count: u32,
}

/// Reasons a token could not be read
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Token is not valid base64url
    #[error("Token encoding error: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Payload is not the expected JSON shape
    #[error("Token payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Payload date is not a calendar date
    #[error("Invalid token date: {0}")]
    Date(String),
}

/// Serialize a state into its token form
pub fn encode(state: &QuotaState) -> String {
    let payload = TokenPayload {
        date: state.day.format(DATE_FORMAT).to_string(),
        count: state.viewed_count,
    };
    // Serializing a String and a u32 cannot fail
    let json = serde_json::to_vec(&payload).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Parse a token exactly as stored, without day rollover
pub fn try_decode(token: &str) -> Result<QuotaState, TokenError> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim())?;
    let payload: TokenPayload = serde_json::from_slice(&bytes)?;
    let day = NaiveDate::parse_from_str(&payload.date, DATE_FORMAT)
        .map_err(|_| TokenError::Date(payload.date.clone()))?;

    Ok(QuotaState {
        day,
        viewed_count: payload.count,
    })
}

/// Read the caller's state for `today`
///
/// Missing or unreadable tokens and tokens from another day all produce
/// [`QuotaState::fresh`]. This never fails.
pub fn decode(token: Option<&str>, today: NaiveDate) -> QuotaState {
    let Some(token) = token else {
        return QuotaState::fresh(today);
    };

    match try_decode(token) {
        Ok(state) => state.rolled_over(today),
        Err(e) => {
            debug!(error = %e, "Discarding unreadable quota token");
            metrics::QUOTA_TOKENS_REJECTED_TOTAL.inc();
            QuotaState::fresh(today)
        }
    }
}

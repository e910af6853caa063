//! Daily Contact View Quota
//!
//! Each authenticated identity may see a fixed number of contact records per
//! UTC calendar day. The counter is carried by the caller as an opaque token
//! and re-issued on every response, so the server keeps no per-user state.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   decode    ┌──────────────┐   apply    ┌──────────────┐
//! │ Quota token  │ ──────────▶ │  QuotaState  │ ─────────▶ │  QuotaGate   │
//! │  (cookie)    │ ◀────────── │ (day, count) │ ◀───────── │  (decision)  │
//! └──────────────┘   encode    └──────────────┘  new state └──────────────┘
//! ```
//!
//! Concurrent requests from the same identity each read the token present at
//! request start, so parallel tabs can over- or under-count by a few records.

pub mod gate;
pub mod token;

pub use gate::{QuotaDecision, QuotaGate};
pub use token::{QuotaState, TokenError};

/// Message returned when a page is withheld because the quota is spent
pub const QUOTA_EXHAUSTED_MESSAGE: &str =
    "Daily contact view limit reached. Upgrade to keep exploring.";

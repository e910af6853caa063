//! Quota Gate
//!
//! Decides how much of a page may be disclosed given the caller's view
//! counter, and produces the counter to hand back. Disclosure is always a
//! prefix of the page, so the same records become visible first on every
//! request for that page within a day.

use chrono::NaiveDate;

use super::token::QuotaState;

/// Outcome of gating one page
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaDecision<T> {
    /// Leading records of the page that may be shown
    pub disclosed: Vec<T>,
    /// Quota left after this request
    pub remaining: u32,
    /// Daily limit applied
    pub limit: u32,
    /// Whether the quota was already exhausted when the request arrived
    pub locked_before_request: bool,
}

impl<T> QuotaDecision<T> {
    /// Whether zero records were shown because of the quota
    ///
    /// Empty pages of an empty dataset are not quota denials.
    pub fn withheld(&self) -> bool {
        self.disclosed.is_empty() && self.locked_before_request
    }
}

/// Daily disclosure limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaGate {
    daily_limit: u32,
}

impl QuotaGate {
    /// Create a gate; a limit of zero is raised to 1
    pub fn new(daily_limit: u32) -> Self {
        Self {
            daily_limit: daily_limit.max(1),
        }
    }

    /// Configured daily limit
    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Gate `page_items` against `prior`
    ///
    /// `prior` is expected to have been rolled over to `today` already (see
    /// [`super::token::decode`]). The returned state is dated `today` and
    /// only grows by the number of records disclosed.
    pub fn apply<T>(
        &self,
        mut page_items: Vec<T>,
        prior: QuotaState,
        today: NaiveDate,
    ) -> (QuotaDecision<T>, QuotaState) {
        let remaining_before = self.daily_limit.saturating_sub(prior.viewed_count);
        let locked_before_request = remaining_before == 0;

        let allowed = if locked_before_request {
            0
        } else {
            page_items
                .len()
                .min(usize::try_from(remaining_before).unwrap_or(usize::MAX))
        };
        page_items.truncate(allowed);

        let new_state = QuotaState {
            day: today,
            // allowed <= remaining_before, which fits in u32
            viewed_count: prior.viewed_count.saturating_add(allowed as u32),
        };
        let remaining = self.daily_limit.saturating_sub(new_state.viewed_count);

        let decision = QuotaDecision {
            disclosed: page_items,
            remaining,
            limit: self.daily_limit,
            locked_before_request,
        };

        (decision, new_state)
    }
}

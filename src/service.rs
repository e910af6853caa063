//! Directory Listing Service
//!
//! Transport-independent request pipeline:
//!
//! ```text
//! provider ──▶ paginate ──▶ decode token ──▶ quota gate ──▶ response + new token
//! ```
//!
//! Nothing here is retained between requests. The caller's quota state comes
//! in with the request and goes back out with the response.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::Identity;
use crate::directory::{Agency, Contact, DatasetProvider};
use crate::error::ApiError;
use crate::metrics;
use crate::pagination::{Page, PageRequest};
use crate::quota::{token, QuotaGate, QuotaState, QUOTA_EXHAUSTED_MESSAGE};

/// Body of the contacts listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactsResponse {
    pub contacts: Vec<Contact>,
    pub remaining: u32,
    pub limit: u32,
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_contacts: usize,
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Contacts listing plus the quota state to hand back to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct ContactsListing {
    pub response: ContactsResponse,
    pub quota: QuotaState,
}

impl ContactsListing {
    /// Token form of the updated quota state
    pub fn token(&self) -> String {
        token::encode(&self.quota)
    }
}

/// Body of the agencies listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgenciesResponse {
    pub agencies: Vec<Agency>,
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_agencies: usize,
}

/// Paginated, quota-gated access to the directory
pub struct DirectoryService {
    provider: Arc<dyn DatasetProvider>,
    gate: QuotaGate,
    contacts_page_size: usize,
    agencies_page_size: usize,
}

impl DirectoryService {
    /// Create a service over `provider`
    pub fn new(
        provider: Arc<dyn DatasetProvider>,
        daily_limit: u32,
        contacts_page_size: usize,
        agencies_page_size: usize,
    ) -> Self {
        Self {
            provider,
            gate: QuotaGate::new(daily_limit),
            contacts_page_size: contacts_page_size.max(1),
            agencies_page_size: agencies_page_size.max(1),
        }
    }

    /// Daily contact limit
    pub fn daily_limit(&self) -> u32 {
        self.gate.daily_limit()
    }

    /// List one page of contacts for `identity`, consuming its daily quota
    ///
    /// `prior_token` is whatever the caller presented; unreadable or stale
    /// tokens count as a fresh day. Fails only if the provider does.
    pub async fn list_contacts(
        &self,
        identity: &Identity,
        request: PageRequest,
        prior_token: Option<&str>,
        today: NaiveDate,
    ) -> Result<ContactsListing, ApiError> {
        let contacts = self.provider.contacts().await?;
        let page = Page::slice(&contacts, self.contacts_page_size, request);

        let prior = token::decode(prior_token, today);
        let (decision, quota) = self.gate.apply(page.items, prior, today);

        let disclosed = decision.disclosed.len();
        metrics::CONTACTS_DISCLOSED_TOTAL.inc_by(disclosed as u64);
        if decision.locked_before_request {
            metrics::QUOTA_LOCKOUTS_TOTAL.inc();
            info!(user = %identity, page = page.page, "Contact quota exhausted");
        } else {
            debug!(
                user = %identity,
                page = page.page,
                disclosed,
                viewed = quota.viewed_count,
                "Contacts disclosed"
            );
        }

        let message = decision
            .withheld()
            .then(|| QUOTA_EXHAUSTED_MESSAGE.to_string());

        let response = ContactsResponse {
            contacts: decision.disclosed,
            remaining: decision.remaining,
            limit: decision.limit,
            page: page.page,
            total_pages: page.total_pages,
            page_size: page.page_size,
            total_contacts: page.total_count,
            locked: decision.locked_before_request,
            message,
        };

        Ok(ContactsListing { response, quota })
    }

    /// List one page of agencies; not quota-gated
    pub async fn list_agencies(&self, request: PageRequest) -> Result<AgenciesResponse, ApiError> {
        let agencies = self.provider.agencies().await?;
        let page = Page::slice(&agencies, self.agencies_page_size, request);

        Ok(AgenciesResponse {
            agencies: page.items,
            page: page.page,
            total_pages: page.total_pages,
            page_size: page.page_size,
            total_agencies: page.total_count,
        })
    }
}

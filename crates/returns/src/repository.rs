//! Persistence and analytics ports.
//!
//! The storefront's actual query layer lives elsewhere; the job crates only
//! depend on these traits. All operations are tenant-scoped and may fail
//! with a generic backend error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use loopwear_core::TenantId;

use crate::hold::InventoryHold;
use crate::order::RentalOrder;
use crate::stage::ReturnStage;

pub type RepoResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Anything the backing store reports (connectivity, constraint, ...).
    #[error("repository backend error: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Rental-order persistence, keyed by `(tenant, session_id)`.
///
/// The five `mark_*` mutations are the targets of the event-queue dispatch
/// table; `mark_received` additionally stamps `return_received_at`. All
/// mutations must be idempotent — the queue delivers at least once.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn mark_received(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()>;
    async fn mark_cleaning(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()>;
    async fn mark_repair(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()>;
    async fn mark_qa(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()>;
    async fn mark_available(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()>;

    /// Candidates for the late-fee pass: orders with an open (not yet
    /// received) return. Eligibility is re-checked by the job.
    async fn orders_with_open_returns(&self, tenant: &TenantId) -> RepoResult<Vec<RentalOrder>>;

    /// Candidates for the deposit-release pass: orders still holding a
    /// deposit.
    async fn orders_holding_deposits(&self, tenant: &TenantId) -> RepoResult<Vec<RentalOrder>>;

    /// Persist a successfully charged late fee (sets `late_fee_charged`).
    async fn record_late_fee(
        &self,
        tenant: &TenantId,
        session_id: &str,
        amount: i64,
    ) -> RepoResult<()>;

    /// Mark the deposit as refunded (sets `refunded_at`).
    async fn mark_refunded(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()>;
}

/// Inventory hold persistence.
#[async_trait]
pub trait HoldRepository: Send + Sync {
    /// Active holds whose `expires_at` lies before `now`, at most `limit`.
    async fn expired_active_holds(
        &self,
        tenant: &TenantId,
        now: DateTime<Utc>,
        limit: usize,
    ) -> RepoResult<Vec<InventoryHold>>;

    /// Fresh read of a single hold (for detecting concurrent commits).
    async fn hold(&self, tenant: &TenantId, hold_id: &str) -> RepoResult<Option<InventoryHold>>;

    /// Transition a hold to released.
    async fn release(&self, tenant: &TenantId, hold_id: &str) -> RepoResult<()>;
}

/// Analytics sink for return lifecycle events.
///
/// One emission per dispatched event kind; the sink must tolerate
/// duplicates.
#[async_trait]
pub trait ReturnAnalytics: Send + Sync {
    async fn record_stage_event(
        &self,
        tenant: &TenantId,
        session_id: &str,
        stage: ReturnStage,
    ) -> RepoResult<()>;
}

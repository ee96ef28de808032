//! Tenant-scoped background task seam.

use async_trait::async_trait;

use crate::tenant::TenantId;

/// A unit of recurring per-tenant work (event-queue drain, settlement pass).
///
/// Implementations must be **idempotent**: the scheduler delivers
/// at-least-once and does not prevent two runs for the same tenant from
/// overlapping when a run outlives the timer interval.
#[async_trait]
pub trait TenantTask: Send + Sync {
    /// Short stable name used in log context.
    fn name(&self) -> &'static str;

    /// Execute one pass for `tenant`. Errors are logged by the scheduler and
    /// never stop the timer.
    async fn run(&self, tenant: &TenantId) -> anyhow::Result<()>;
}

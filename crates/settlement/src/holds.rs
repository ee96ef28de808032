//! Expiry sweep for inventory holds.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info};

use loopwear_core::{TenantId, TenantTask};
use loopwear_returns::{HoldRepository, HoldStatus, RepoResult};

/// Upper bound on holds examined per pass, to keep batches small.
pub const DEFAULT_SWEEP_LIMIT: usize = 100;

/// Counts from one sweep. Partial failure never aborts the pass; callers
/// watch the `failed` ratio instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoldSweepReport {
    pub released: u32,
    /// Gone or released by someone else between listing and acting.
    pub already_released: u32,
    /// Committed before expiry; must stay committed.
    pub skipped_committed: u32,
    pub failed: u32,
}

enum SweepOutcome {
    Released,
    AlreadyReleased,
    SkippedCommitted,
}

/// Releases active holds whose expiry has passed.
///
/// Holds are not locked: a checkout may commit a hold between the listing
/// and the release attempt. The sweep re-reads each hold and steps aside in
/// that case rather than fighting the race.
pub struct ExpiredHoldJob<H> {
    holds: Arc<H>,
    limit: usize,
}

impl<H> ExpiredHoldJob<H>
where
    H: HoldRepository,
{
    pub fn new(holds: Arc<H>) -> Self {
        Self {
            holds,
            limit: DEFAULT_SWEEP_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// One sweep for `tenant`. Fails only when the candidate listing itself
    /// fails.
    pub async fn run_for_tenant(&self, tenant: &TenantId) -> RepoResult<HoldSweepReport> {
        let now = Utc::now();
        let mut report = HoldSweepReport::default();

        for hold in self
            .holds
            .expired_active_holds(tenant, now, self.limit)
            .await?
        {
            match self.release_one(tenant, &hold.hold_id).await {
                Ok(SweepOutcome::Released) => report.released += 1,
                Ok(SweepOutcome::AlreadyReleased) => report.already_released += 1,
                Ok(SweepOutcome::SkippedCommitted) => {
                    report.skipped_committed += 1;
                    debug!(
                        tenant = %tenant,
                        hold = %hold.hold_id,
                        "hold committed before expiry; not released"
                    );
                }
                Err(err) => {
                    report.failed += 1;
                    error!(
                        tenant = %tenant,
                        hold = %hold.hold_id,
                        error = %err,
                        "failed to release expired hold"
                    );
                }
            }
        }
        Ok(report)
    }

    async fn release_one(&self, tenant: &TenantId, hold_id: &str) -> RepoResult<SweepOutcome> {
        // Fresh read: the hold may have moved since it was listed.
        match self.holds.hold(tenant, hold_id).await? {
            None => Ok(SweepOutcome::AlreadyReleased),
            Some(hold) => match hold.status {
                HoldStatus::Committed => Ok(SweepOutcome::SkippedCommitted),
                HoldStatus::Released => Ok(SweepOutcome::AlreadyReleased),
                HoldStatus::Active => {
                    self.holds.release(tenant, hold_id).await?;
                    Ok(SweepOutcome::Released)
                }
            },
        }
    }
}

#[async_trait]
impl<H> TenantTask for ExpiredHoldJob<H>
where
    H: HoldRepository,
{
    fn name(&self) -> &'static str {
        "expired-holds"
    }

    async fn run(&self, tenant: &TenantId) -> anyhow::Result<()> {
        let report = self.run_for_tenant(tenant).await?;
        info!(
            tenant = %tenant,
            released = report.released,
            already_released = report.already_released,
            skipped_committed = report.skipped_committed,
            failed = report.failed,
            "expired hold sweep complete"
        );
        Ok(())
    }
}

//! Per-tenant timer orchestration.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use loopwear_core::{TenantId, TenantTask};

use crate::config::{ConfigOverride, ConfigResolver, EnvSource};

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Tenant enumeration failed; nothing at all can be scheduled, so this
    /// is the one failure that propagates to the caller.
    #[error("failed to enumerate tenants under {root}: {source}")]
    TenantEnumeration {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Owns one recurring timer per enabled tenant.
///
/// Each scheduler instance owns its own timer handles, so several can
/// coexist (one per job kind, or several in tests) and be torn down
/// independently via [`Scheduler::stop`].
pub struct Scheduler {
    timers: Vec<(TenantId, JoinHandle<()>)>,
}

impl Scheduler {
    /// Schedule `task` for every enabled tenant under the resolver's data
    /// root.
    ///
    /// Per enabled tenant: one immediate run (its failure is logged and
    /// still arms the timer), then a recurring timer at the resolved
    /// interval. Disabled tenants are skipped. Failures never cross tenant
    /// boundaries.
    pub async fn start<E: EnvSource>(
        resolver: &ConfigResolver<E>,
        overrides: &HashMap<TenantId, ConfigOverride>,
        task: Arc<dyn TenantTask>,
    ) -> Result<Self, SchedulerError> {
        let root = resolver.data_root();
        let tenants = match list_tenants(root).await {
            Ok(tenants) => tenants,
            Err(source) => {
                error!(
                    root = %root.display(),
                    error = %source,
                    "failed to enumerate tenants; nothing scheduled"
                );
                return Err(SchedulerError::TenantEnumeration {
                    root: root.to_path_buf(),
                    source,
                });
            }
        };
        Ok(Self::start_with_tenants(tenants, resolver, overrides, task).await)
    }

    /// Like [`Scheduler::start`] with an explicit tenant list (test seam;
    /// also useful for hosts that enumerate tenants elsewhere).
    pub async fn start_with_tenants<E: EnvSource>(
        tenants: Vec<TenantId>,
        resolver: &ConfigResolver<E>,
        overrides: &HashMap<TenantId, ConfigOverride>,
        task: Arc<dyn TenantTask>,
    ) -> Self {
        let mut timers = Vec::new();

        for tenant in tenants {
            let config = resolver.resolve(&tenant, overrides.get(&tenant)).await;
            if !config.enabled {
                debug!(tenant = %tenant, task = task.name(), "tenant disabled; not scheduled");
                continue;
            }

            // Immediate first run. Its failure is isolated to this tenant
            // and does not prevent the timer from being armed.
            if let Err(err) = task.run(&tenant).await {
                error!(
                    tenant = %tenant,
                    task = task.name(),
                    error = ?err,
                    "initial run failed"
                );
            }

            let handle = tokio::spawn(timer_loop(
                tenant.clone(),
                config.interval(),
                task.clone(),
            ));
            info!(
                tenant = %tenant,
                task = task.name(),
                interval_minutes = config.interval_minutes,
                "tenant timer armed"
            );
            timers.push((tenant, handle));
        }

        Self { timers }
    }

    /// Tenants with an armed timer.
    pub fn scheduled_tenants(&self) -> Vec<&TenantId> {
        self.timers.iter().map(|(tenant, _)| tenant).collect()
    }

    /// Clear every timer. In-flight runs are not interrupted; they finish
    /// on their own.
    pub fn stop(self) {
        for (tenant, handle) in self.timers {
            debug!(tenant = %tenant, "timer cleared");
            handle.abort();
        }
    }
}

async fn timer_loop(tenant: TenantId, period: Duration, task: Arc<dyn TenantTask>) {
    // tokio::time::interval panics on a zero period (possible via an
    // interval override rounding down to zero minutes).
    let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval() fires immediately; the initial run already happened.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let tenant = tenant.clone();
        let task = task.clone();
        // Runs detach from the ticker: a slow pass never delays the next
        // tick, overlapping runs for one tenant are tolerated (handlers are
        // idempotent), and stop() leaves in-flight passes to finish.
        tokio::spawn(async move {
            if let Err(err) = task.run(&tenant).await {
                error!(
                    tenant = %tenant,
                    task = task.name(),
                    error = ?err,
                    "scheduled run failed"
                );
            }
        });
    }
}

async fn list_tenants(root: &Path) -> io::Result<Vec<TenantId>> {
    let mut entries = tokio::fs::read_dir(root).await?;
    let mut tenants = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            tenants.push(TenantId::new(entry.file_name().to_string_lossy()));
        }
    }
    tenants.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    Ok(tenants)
}

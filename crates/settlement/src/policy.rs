//! Tenant settlement policies.
//!
//! Policies live in the tenant's settings document under the data root
//! (`<root>/<tenant>/settings.json`, camelCase keys, written by the
//! storefront admin UI). Reading is best-effort: a tenant without a
//! readable document simply has no policy and is skipped by the jobs.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

use loopwear_core::TenantId;

/// Late-fee policy. Amount in the smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LateFeePolicy {
    pub fee_amount: i64,
    /// Days past the due date before a fee becomes chargeable.
    #[serde(default)]
    pub grace_period_days: i64,
}

/// Deposit-release policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositPolicy {
    pub enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SettingsDoc {
    late_fee: Option<LateFeePolicy>,
    deposit: Option<DepositPolicy>,
}

/// Source of per-tenant settlement policies.
#[async_trait]
pub trait PolicyProvider: Send + Sync {
    async fn late_fee_policy(&self, tenant: &TenantId) -> Option<LateFeePolicy>;
    async fn deposit_policy(&self, tenant: &TenantId) -> Option<DepositPolicy>;
}

/// Reads policies from the per-tenant settings document.
#[derive(Debug, Clone)]
pub struct FilePolicyProvider {
    data_root: PathBuf,
}

impl FilePolicyProvider {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    async fn read_doc(&self, tenant: &TenantId) -> Option<SettingsDoc> {
        let path = self
            .data_root
            .join(tenant.as_str())
            .join("settings.json");
        let bytes = fs::read(&path).await.ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

#[async_trait]
impl PolicyProvider for FilePolicyProvider {
    async fn late_fee_policy(&self, tenant: &TenantId) -> Option<LateFeePolicy> {
        self.read_doc(tenant).await?.late_fee
    }

    async fn deposit_policy(&self, tenant: &TenantId) -> Option<DepositPolicy> {
        self.read_doc(tenant).await?.deposit
    }
}

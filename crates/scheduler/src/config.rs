//! Layered per-tenant job configuration.
//!
//! Four sources, later layers overwriting earlier ones:
//!
//! 1. built-in defaults (disabled, hourly),
//! 2. the tenant's settings document (`returnsJob` section, best-effort),
//! 3. tenant-keyed environment variables,
//! 4. call-time overrides from the host application,
//!
//! with a process-wide fallback filling in only where no tenant-keyed
//! environment variable exists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::fs;

use loopwear_core::TenantId;

/// Prefix of the tenant-keyed environment variables:
/// `RETURNS_JOB_<TENANT>` (enable/disable) and
/// `RETURNS_JOB_<TENANT>_INTERVAL_MS`.
pub const ENV_PREFIX: &str = "RETURNS_JOB";

/// Effective job configuration for one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobConfig {
    pub enabled: bool,
    pub interval_minutes: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: 60,
        }
    }
}

impl JobConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_minutes * 60_000)
    }
}

/// Call-time override; present fields win over every other layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverride {
    pub enabled: Option<bool>,
    pub interval_minutes: Option<u64>,
}

/// Process-wide fallback, consulted only for tenants with no tenant-keyed
/// environment variable. A `None` never overwrites anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalFallback {
    pub enabled: Option<bool>,
    pub interval_ms: Option<u64>,
}

/// Environment lookup seam (tests substitute a map).
pub trait EnvSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SettingsDoc {
    returns_job: Option<JobSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JobSection {
    enabled: Option<bool>,
    interval_minutes: Option<u64>,
}

/// Resolves effective per-tenant configuration. Nothing is cached or
/// persisted; every call reads the sources fresh.
#[derive(Debug)]
pub struct ConfigResolver<E = ProcessEnv> {
    data_root: PathBuf,
    env: E,
    fallback: GlobalFallback,
}

impl ConfigResolver<ProcessEnv> {
    /// Resolver over the real process environment with no fallback values.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self::with_env(data_root, ProcessEnv, GlobalFallback::default())
    }
}

impl<E: EnvSource> ConfigResolver<E> {
    pub fn with_env(data_root: impl Into<PathBuf>, env: E, fallback: GlobalFallback) -> Self {
        Self {
            data_root: data_root.into(),
            env,
            fallback,
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Compute the effective config for `tenant`.
    pub async fn resolve(
        &self,
        tenant: &TenantId,
        override_: Option<&ConfigOverride>,
    ) -> JobConfig {
        let mut config = JobConfig::default();

        // Settings document: best-effort, silently skipped when unreadable.
        if let Some(section) = self.read_settings(tenant).await {
            if let Some(enabled) = section.enabled {
                config.enabled = enabled;
            }
            if let Some(minutes) = section.interval_minutes {
                config.interval_minutes = minutes;
            }
        }

        // Tenant-keyed environment, with the process-wide fallback stepping
        // in only where the tenant key is absent.
        let fragment = env_key_fragment(tenant);
        match self.env.get(&format!("{ENV_PREFIX}_{fragment}")) {
            Some(value) => config.enabled = value != "false",
            None => {
                if let Some(enabled) = self.fallback.enabled {
                    config.enabled = enabled;
                }
            }
        }
        match self.env.get(&format!("{ENV_PREFIX}_{fragment}_INTERVAL_MS")) {
            Some(value) => {
                // Non-numeric values are ignored; the previous layer stands.
                if let Ok(ms) = value.trim().parse::<f64>() {
                    config.interval_minutes = minutes_from_ms(ms);
                }
            }
            None => {
                if let Some(ms) = self.fallback.interval_ms {
                    config.interval_minutes = minutes_from_ms(ms as f64);
                }
            }
        }

        // Explicit caller override always wins.
        if let Some(override_) = override_ {
            if let Some(enabled) = override_.enabled {
                config.enabled = enabled;
            }
            if let Some(minutes) = override_.interval_minutes {
                config.interval_minutes = minutes;
            }
        }

        config
    }

    async fn read_settings(&self, tenant: &TenantId) -> Option<JobSection> {
        let path = self
            .data_root
            .join(tenant.as_str())
            .join("settings.json");
        let bytes = fs::read(&path).await.ok()?;
        let doc: SettingsDoc = serde_json::from_slice(&bytes).ok()?;
        doc.returns_job
    }
}

/// Tenant name as an environment key fragment: non-alphanumerics become
/// `_`, everything upper-cased.
fn env_key_fragment(tenant: &TenantId) -> String {
    tenant
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Milliseconds to whole minutes, rounded.
fn minutes_from_ms(ms: f64) -> u64 {
    (ms / 60_000.0).round().max(0.0) as u64
}

//! `loopwear-scheduler` — per-tenant job scheduling.
//!
//! Resolves each tenant's job configuration from its layered sources and
//! runs one recurring timer per enabled tenant, with per-tenant failure
//! isolation. Starting is always an explicit call by the host application;
//! nothing here runs as an import side effect.

pub mod config;
pub mod scheduler;

pub use config::{
    ConfigOverride, ConfigResolver, EnvSource, GlobalFallback, JobConfig, ProcessEnv,
};
pub use scheduler::{Scheduler, SchedulerError};

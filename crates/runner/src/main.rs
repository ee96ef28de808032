//! Local job runner.
//!
//! Wires the file-backed event queue, in-memory stores and the per-tenant
//! scheduler for local operation. Production hosts wire their own repository
//! and gateway implementations and call `Scheduler::start` themselves;
//! scheduling never happens as an import side effect.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use loopwear_queue::{EventQueue, ReturnEventProcessor};
use loopwear_returns::{InMemoryOrderRepository, RecordingAnalytics};
use loopwear_scheduler::{ConfigResolver, Scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    loopwear_observability::init();

    let data_root =
        std::env::var("LOOPWEAR_DATA_ROOT").unwrap_or_else(|_| "./data".to_string());
    info!(data_root = %data_root, "starting loopwear job runner");

    let queue = EventQueue::new(&data_root);
    let orders = Arc::new(InMemoryOrderRepository::new());
    let analytics = Arc::new(RecordingAnalytics::new());
    let processor = Arc::new(ReturnEventProcessor::new(queue, orders, analytics));

    let resolver = ConfigResolver::new(&data_root);
    let scheduler = Scheduler::start(&resolver, &HashMap::new(), processor).await?;
    info!(
        tenants = scheduler.scheduled_tenants().len(),
        "tenant timers armed"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received; clearing timers");
    scheduler.stop();
    Ok(())
}

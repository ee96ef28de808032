//! Queue drain and event dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use loopwear_core::{TenantId, TenantTask};
use loopwear_returns::{OrderRepository, ReturnAnalytics, ReturnStage};

use crate::store::{EventQueue, QueueError};

/// Counters from one processing pass.
///
/// `unrecognized` exists so operators can spot producers shipping event
/// kinds this consumer does not know about; those records are dropped, not
/// failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub processed: u32,
    pub failed: u32,
    pub unrecognized: u32,
}

impl ProcessReport {
    pub fn merge(&mut self, other: ProcessReport) {
        self.processed += other.processed;
        self.failed += other.failed;
        self.unrecognized += other.unrecognized;
    }
}

enum Outcome {
    Dispatched,
    Unrecognized(String),
}

/// Drains queued return events and applies them to the order store.
///
/// Per-record failure contract: a record that cannot be parsed or whose
/// handler fails is logged and **deleted** like any other, and never blocks
/// the records behind it.
pub struct ReturnEventProcessor<R, A> {
    queue: EventQueue,
    orders: Arc<R>,
    analytics: Arc<A>,
}

impl<R, A> ReturnEventProcessor<R, A>
where
    R: OrderRepository,
    A: ReturnAnalytics,
{
    pub fn new(queue: EventQueue, orders: Arc<R>, analytics: Arc<A>) -> Self {
        Self {
            queue,
            orders,
            analytics,
        }
    }

    /// Process every tenant under the queue root.
    ///
    /// Fails only when the tenant enumeration itself fails; one tenant's
    /// processing error never reaches another tenant.
    pub async fn process_all(&self) -> Result<ProcessReport, QueueError> {
        let mut report = ProcessReport::default();
        for tenant in self.queue.tenants().await? {
            match self.process_tenant(&tenant).await {
                Ok(tenant_report) => report.merge(tenant_report),
                Err(err) => {
                    error!(tenant = %tenant, error = %err, "queue scan failed for tenant");
                }
            }
        }
        Ok(report)
    }

    /// Drain one tenant's queue, in enumeration order.
    pub async fn process_tenant(&self, tenant: &TenantId) -> Result<ProcessReport, QueueError> {
        let mut report = ProcessReport::default();

        for path in self.queue.pending(tenant).await? {
            let outcome = self.handle_record(tenant, &path).await;
            // Always drop the record, even after a failure: a poison-pill
            // record must not block the queue, and re-delivery of a healthy
            // one is harmless (idempotent handlers).
            self.queue.remove(&path).await;

            match outcome {
                Ok(Outcome::Dispatched) => report.processed += 1,
                Ok(Outcome::Unrecognized(status)) => {
                    report.unrecognized += 1;
                    warn!(
                        tenant = %tenant,
                        file = %path.display(),
                        status = %status,
                        "unrecognized return event status; record dropped"
                    );
                }
                Err(err) => {
                    report.failed += 1;
                    error!(
                        tenant = %tenant,
                        file = %path.display(),
                        error = %err,
                        "failed to process return event record"
                    );
                }
            }
        }

        Ok(report)
    }

    async fn handle_record(
        &self,
        tenant: &TenantId,
        path: &std::path::Path,
    ) -> anyhow::Result<Outcome> {
        let record = self.queue.read(path).await?;
        let Ok(stage) = record.stage() else {
            return Ok(Outcome::Unrecognized(record.status));
        };
        self.dispatch(tenant, &record.session_id, stage).await?;
        Ok(Outcome::Dispatched)
    }

    async fn dispatch(
        &self,
        tenant: &TenantId,
        session_id: &str,
        stage: ReturnStage,
    ) -> anyhow::Result<()> {
        match stage {
            ReturnStage::Received => self.orders.mark_received(tenant, session_id).await?,
            ReturnStage::Cleaning => self.orders.mark_cleaning(tenant, session_id).await?,
            ReturnStage::Repair => self.orders.mark_repair(tenant, session_id).await?,
            ReturnStage::Qa => self.orders.mark_qa(tenant, session_id).await?,
            ReturnStage::Available => self.orders.mark_available(tenant, session_id).await?,
        }
        self.analytics
            .record_stage_event(tenant, session_id, stage)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<R, A> TenantTask for ReturnEventProcessor<R, A>
where
    R: OrderRepository,
    A: ReturnAnalytics,
{
    fn name(&self) -> &'static str {
        "return-events"
    }

    async fn run(&self, tenant: &TenantId) -> anyhow::Result<()> {
        let report = self.process_tenant(tenant).await?;
        debug!(
            tenant = %tenant,
            processed = report.processed,
            failed = report.failed,
            unrecognized = report.unrecognized,
            "return event pass complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use loopwear_returns::{InMemoryOrderRepository, RecordingAnalytics, RentalOrder};

    fn processor(
        root: &std::path::Path,
    ) -> (
        ReturnEventProcessor<InMemoryOrderRepository, RecordingAnalytics>,
        Arc<InMemoryOrderRepository>,
        Arc<RecordingAnalytics>,
        EventQueue,
    ) {
        let queue = EventQueue::new(root);
        let orders = Arc::new(InMemoryOrderRepository::new());
        let analytics = Arc::new(RecordingAnalytics::new());
        (
            ReturnEventProcessor::new(queue.clone(), orders.clone(), analytics.clone()),
            orders,
            analytics,
            queue,
        )
    }

    #[tokio::test]
    async fn queue_drains_regardless_of_content() {
        let dir = tempdir().unwrap();
        let (processor, orders, analytics, queue) = processor(dir.path());
        let tenant = TenantId::new("shop1");

        orders.insert(&tenant, RentalOrder::new("cs_1"));
        orders.insert(&tenant, RentalOrder::new("cs_2"));

        queue
            .write_event(&tenant, "cs_1", ReturnStage::Received)
            .await
            .unwrap();
        queue
            .write_event(&tenant, "cs_2", ReturnStage::Cleaning)
            .await
            .unwrap();
        // A record that is not even JSON.
        let queue_dir = dir.path().join("shop1").join("queue");
        std::fs::write(queue_dir.join("zzz-poison.json"), b"{not json").unwrap();

        let report = processor.process_tenant(&tenant).await.unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.unrecognized, 0);
        // Nothing left behind, poison pill included.
        assert!(queue.pending(&tenant).await.unwrap().is_empty());
        assert_eq!(
            orders.get(&tenant, "cs_1").unwrap().status,
            Some(ReturnStage::Received)
        );
        assert_eq!(
            orders.get(&tenant, "cs_2").unwrap().status,
            Some(ReturnStage::Cleaning)
        );
        assert_eq!(analytics.events().len(), 2);
    }

    #[tokio::test]
    async fn unrecognized_status_is_a_counted_noop() {
        let dir = tempdir().unwrap();
        let (processor, orders, analytics, queue) = processor(dir.path());
        let tenant = TenantId::new("shop1");
        orders.insert(&tenant, RentalOrder::new("cs_1"));

        let queue_dir = dir.path().join("shop1").join("queue");
        std::fs::create_dir_all(&queue_dir).unwrap();
        std::fs::write(
            queue_dir.join("a.json"),
            br#"{"sessionId":"cs_1","status":"vaporized"}"#,
        )
        .unwrap();

        let report = processor.process_tenant(&tenant).await.unwrap();

        assert_eq!(report.unrecognized, 1);
        assert_eq!(report.failed, 0);
        assert!(queue.pending(&tenant).await.unwrap().is_empty());
        assert_eq!(orders.get(&tenant, "cs_1").unwrap().status, None);
        assert!(analytics.events().is_empty());
    }

    #[tokio::test]
    async fn handler_failure_does_not_block_later_records() {
        let dir = tempdir().unwrap();
        let (processor, orders, _analytics, queue) = processor(dir.path());
        let tenant = TenantId::new("shop1");

        // Only the second order exists; the first dispatch will fail.
        orders.insert(&tenant, RentalOrder::new("cs_known"));
        queue
            .write_event(&tenant, "cs_missing", ReturnStage::Qa)
            .await
            .unwrap();
        queue
            .write_event(&tenant, "cs_known", ReturnStage::Qa)
            .await
            .unwrap();

        let report = processor.process_tenant(&tenant).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 1);
        assert!(queue.pending(&tenant).await.unwrap().is_empty());
        assert_eq!(
            orders.get(&tenant, "cs_known").unwrap().status,
            Some(ReturnStage::Qa)
        );
    }

    #[tokio::test]
    async fn tenants_without_a_queue_are_skipped() {
        let dir = tempdir().unwrap();
        let (processor, _orders, _analytics, _queue) = processor(dir.path());

        let report = processor
            .process_tenant(&TenantId::new("quiet-shop"))
            .await
            .unwrap();
        assert_eq!(report, ProcessReport::default());
    }

    #[tokio::test]
    async fn process_all_sweeps_every_tenant() {
        let dir = tempdir().unwrap();
        let (processor, orders, _analytics, queue) = processor(dir.path());
        let a = TenantId::new("shop-a");
        let b = TenantId::new("shop-b");
        orders.insert(&a, RentalOrder::new("cs_a"));
        orders.insert(&b, RentalOrder::new("cs_b"));

        queue
            .write_event(&a, "cs_a", ReturnStage::Repair)
            .await
            .unwrap();
        queue
            .write_event(&b, "cs_b", ReturnStage::Available)
            .await
            .unwrap();

        let report = processor.process_all().await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(
            orders.get(&a, "cs_a").unwrap().status,
            Some(ReturnStage::Repair)
        );
        assert_eq!(
            orders.get(&b, "cs_b").unwrap().status,
            Some(ReturnStage::Available)
        );
    }

    #[tokio::test]
    async fn process_all_fails_loudly_when_the_root_is_unreachable() {
        let queue = EventQueue::new("/definitely/not/a/real/root");
        let orders = Arc::new(InMemoryOrderRepository::new());
        let analytics = Arc::new(RecordingAnalytics::new());
        let processor = ReturnEventProcessor::new(queue, orders, analytics);

        assert!(processor.process_all().await.is_err());
    }
}

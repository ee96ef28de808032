//! Late-fee charging for overdue returns.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info};

use loopwear_core::{TenantId, TenantTask};
use loopwear_returns::{OrderRepository, RentalOrder};

use crate::gateway::{PaymentGateway, DEFAULT_CURRENCY};
use crate::policy::{LateFeePolicy, PolicyProvider};

/// Charges the configured late fee to orders whose return is overdue past
/// the grace window.
///
/// `late_fee_charged` on the order is the idempotency guard: a fee is
/// charged at most once, and nothing is persisted unless the charge
/// succeeded — a failed item is simply retried on the next pass.
pub struct LateFeeJob<R, P, G> {
    orders: Arc<R>,
    policies: Arc<P>,
    gateway: Arc<G>,
}

impl<R, P, G> LateFeeJob<R, P, G>
where
    R: OrderRepository,
    P: PolicyProvider,
    G: PaymentGateway,
{
    pub fn new(orders: Arc<R>, policies: Arc<P>, gateway: Arc<G>) -> Self {
        Self {
            orders,
            policies,
            gateway,
        }
    }

    /// One late-fee pass for `tenant`.
    pub async fn run_for_tenant(&self, tenant: &TenantId) -> anyhow::Result<()> {
        let Some(policy) = self.policies.late_fee_policy(tenant).await else {
            debug!(tenant = %tenant, "no late fee policy; skipping tenant");
            return Ok(());
        };
        if policy.fee_amount <= 0 {
            debug!(tenant = %tenant, "late fee amount not positive; skipping tenant");
            return Ok(());
        }

        let now = Utc::now();
        for order in self.orders.orders_with_open_returns(tenant).await? {
            if !order.late_fee_due(now, policy.grace_period_days) {
                continue;
            }
            match self.charge(tenant, &order, &policy).await {
                Ok(currency) => info!(
                    tenant = %tenant,
                    session = %order.session_id,
                    amount = policy.fee_amount,
                    currency = %currency,
                    "late fee charged"
                ),
                Err(err) => error!(
                    tenant = %tenant,
                    session = %order.session_id,
                    error = %err,
                    "late fee charge failed; order left for the next pass"
                ),
            }
        }
        Ok(())
    }

    async fn charge(
        &self,
        tenant: &TenantId,
        order: &RentalOrder,
        policy: &LateFeePolicy,
    ) -> anyhow::Result<String> {
        let session = self.gateway.checkout_session(&order.session_id).await?;
        let customer = session
            .customer
            .as_deref()
            .context("checkout session has no customer to charge")?;
        let currency = session
            .currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        self.gateway
            .create_charge(customer, policy.fee_amount, &currency, "Late return fee")
            .await?;
        self.orders
            .record_late_fee(tenant, &order.session_id, policy.fee_amount)
            .await?;
        Ok(currency)
    }
}

#[async_trait]
impl<R, P, G> TenantTask for LateFeeJob<R, P, G>
where
    R: OrderRepository,
    P: PolicyProvider,
    G: PaymentGateway,
{
    fn name(&self) -> &'static str {
        "late-fees"
    }

    async fn run(&self, tenant: &TenantId) -> anyhow::Result<()> {
        self.run_for_tenant(tenant).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use loopwear_returns::InMemoryOrderRepository;

    use crate::gateway::CheckoutSession;
    use crate::testing::{RecordingGateway, StaticPolicies};

    fn policy(fee_amount: i64) -> StaticPolicies {
        StaticPolicies {
            late_fee: Some(LateFeePolicy {
                fee_amount,
                grace_period_days: 3,
            }),
            deposit: None,
        }
    }

    fn overdue(session_id: &str) -> RentalOrder {
        RentalOrder {
            return_due_date: Some(Utc::now() - Duration::days(10)),
            ..RentalOrder::new(session_id)
        }
    }

    fn make_job(
        policies: StaticPolicies,
    ) -> (
        LateFeeJob<InMemoryOrderRepository, StaticPolicies, RecordingGateway>,
        Arc<InMemoryOrderRepository>,
        Arc<RecordingGateway>,
    ) {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let gateway = Arc::new(RecordingGateway::new());
        (
            LateFeeJob::new(orders.clone(), Arc::new(policies), gateway.clone()),
            orders,
            gateway,
        )
    }

    fn chargeable_session() -> CheckoutSession {
        CheckoutSession {
            customer: Some("cus_1".to_string()),
            currency: Some("eur".to_string()),
            ..CheckoutSession::default()
        }
    }

    #[tokio::test]
    async fn charges_an_overdue_order_once() {
        let (job, orders, gateway) = make_job(policy(1500));
        let tenant = TenantId::new("shop1");
        orders.insert(&tenant, overdue("cs_1"));
        gateway.put_session("cs_1", chargeable_session());

        job.run_for_tenant(&tenant).await.unwrap();

        assert_eq!(
            gateway.charges(),
            vec![("cus_1".to_string(), 1500, "eur".to_string())]
        );
        assert_eq!(
            orders.get(&tenant, "cs_1").unwrap().late_fee_charged,
            Some(1500)
        );

        // Second pass: the persisted fee is the idempotency guard.
        job.run_for_tenant(&tenant).await.unwrap();
        assert_eq!(gateway.charges().len(), 1);
    }

    #[tokio::test]
    async fn orders_inside_the_grace_window_are_not_charged() {
        let (job, orders, gateway) = make_job(policy(1500));
        let tenant = TenantId::new("shop1");
        orders.insert(
            &tenant,
            RentalOrder {
                return_due_date: Some(Utc::now()),
                ..RentalOrder::new("cs_1")
            },
        );
        gateway.put_session("cs_1", chargeable_session());

        job.run_for_tenant(&tenant).await.unwrap();
        assert!(gateway.charges().is_empty());
    }

    #[tokio::test]
    async fn defaults_the_currency_when_the_session_has_none() {
        let (job, orders, gateway) = make_job(policy(500));
        let tenant = TenantId::new("shop1");
        orders.insert(&tenant, overdue("cs_1"));
        gateway.put_session(
            "cs_1",
            CheckoutSession {
                customer: Some("cus_1".to_string()),
                ..CheckoutSession::default()
            },
        );

        job.run_for_tenant(&tenant).await.unwrap();
        assert_eq!(
            gateway.charges(),
            vec![("cus_1".to_string(), 500, DEFAULT_CURRENCY.to_string())]
        );
    }

    #[tokio::test]
    async fn a_failed_charge_leaves_the_order_untouched() {
        let (job, orders, gateway) = make_job(policy(1500));
        let tenant = TenantId::new("shop1");
        orders.insert(&tenant, overdue("cs_1"));
        gateway.put_session("cs_1", chargeable_session());
        gateway.fail_charges(true);

        job.run_for_tenant(&tenant).await.unwrap();
        assert_eq!(orders.get(&tenant, "cs_1").unwrap().late_fee_charged, None);

        // Retry succeeds once the gateway recovers.
        gateway.fail_charges(false);
        job.run_for_tenant(&tenant).await.unwrap();
        assert_eq!(
            orders.get(&tenant, "cs_1").unwrap().late_fee_charged,
            Some(1500)
        );
    }

    #[tokio::test]
    async fn one_bad_order_does_not_stop_the_batch() {
        let (job, orders, gateway) = make_job(policy(1000));
        let tenant = TenantId::new("shop1");
        // No session exists for cs_bad; its charge fails.
        orders.insert(&tenant, overdue("cs_bad"));
        orders.insert(&tenant, overdue("cs_good"));
        gateway.put_session("cs_good", chargeable_session());

        job.run_for_tenant(&tenant).await.unwrap();

        assert_eq!(gateway.charges().len(), 1);
        assert_eq!(
            orders.get(&tenant, "cs_good").unwrap().late_fee_charged,
            Some(1000)
        );
        assert_eq!(orders.get(&tenant, "cs_bad").unwrap().late_fee_charged, None);
    }

    #[tokio::test]
    async fn tenants_without_a_policy_or_with_zero_fee_are_skipped() {
        let tenant = TenantId::new("shop1");

        let (job, orders, gateway) = make_job(StaticPolicies::default());
        orders.insert(&tenant, overdue("cs_1"));
        gateway.put_session("cs_1", chargeable_session());
        job.run_for_tenant(&tenant).await.unwrap();
        assert!(gateway.charges().is_empty());

        let (job, orders, gateway) = make_job(policy(0));
        orders.insert(&tenant, overdue("cs_1"));
        gateway.put_session("cs_1", chargeable_session());
        job.run_for_tenant(&tenant).await.unwrap();
        assert!(gateway.charges().is_empty());
    }
}

//! Deposit release once a garment has come back.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use loopwear_core::{TenantId, TenantTask};
use loopwear_returns::{OrderRepository, RentalOrder};

use crate::gateway::PaymentGateway;
use crate::policy::PolicyProvider;

/// Refunds deposits for returned garments, net of damage fees.
///
/// `refunded_at` on the order is the idempotency guard. A deposit fully
/// consumed by damage fees is still marked refunded — there is nothing left
/// to send back, which is an outcome, not an error.
pub struct DepositReleaseJob<R, P, G> {
    orders: Arc<R>,
    policies: Arc<P>,
    gateway: Arc<G>,
}

impl<R, P, G> DepositReleaseJob<R, P, G>
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

    /// One deposit-release pass for `tenant`.
    pub async fn run_for_tenant(&self, tenant: &TenantId) -> anyhow::Result<()> {
        match self.policies.deposit_policy(tenant).await {
            Some(policy) if policy.enabled => {}
            _ => {
                debug!(tenant = %tenant, "deposit release not enabled; skipping tenant");
                return Ok(());
            }
        }

        for order in self.orders.orders_holding_deposits(tenant).await? {
            if !order.deposit_release_due() {
                continue;
            }
            if let Err(err) = self.release(tenant, &order).await {
                error!(
                    tenant = %tenant,
                    session = %order.session_id,
                    error = %err,
                    "deposit release failed; order left for the next pass"
                );
            }
        }
        Ok(())
    }

    async fn release(&self, tenant: &TenantId, order: &RentalOrder) -> anyhow::Result<()> {
        let refund = order.refundable_deposit();
        if refund == 0 {
            // Damage fees ate the whole deposit; close the order out without
            // a gateway call.
            self.orders.mark_refunded(tenant, &order.session_id).await?;
            info!(
                tenant = %tenant,
                session = %order.session_id,
                deposit = order.deposit,
                damage_fee = order.damage_fee,
                "deposit fully consumed by damage fees; nothing to refund"
            );
            return Ok(());
        }

        let session = self.gateway.checkout_session(&order.session_id).await?;
        let Some(intent) = session.payment_intent else {
            // Without a payment intent there is nothing to refund against.
            // Skip rather than fail: an operator can backfill the reference.
            info!(
                tenant = %tenant,
                session = %order.session_id,
                "checkout session has no payment intent; deposit release skipped"
            );
            return Ok(());
        };

        self.gateway.create_refund(intent.id(), refund).await?;
        self.orders.mark_refunded(tenant, &order.session_id).await?;
        info!(
            tenant = %tenant,
            session = %order.session_id,
            amount = refund,
            "deposit released"
        );
        Ok(())
    }
}

#[async_trait]
impl<R, P, G> TenantTask for DepositReleaseJob<R, P, G>
where
    R: OrderRepository,
    P: PolicyProvider,
    G: PaymentGateway,
{
    fn name(&self) -> &'static str {
        "deposit-release"
    }

    async fn run(&self, tenant: &TenantId) -> anyhow::Result<()> {
        self.run_for_tenant(tenant).await
    }
}

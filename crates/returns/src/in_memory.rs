//! In-memory port implementations.
//!
//! Used by unit tests across the job crates and by the local runner binary.
//! Not intended for production storefronts.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use loopwear_core::TenantId;

use crate::hold::{HoldStatus, InventoryHold};
use crate::order::RentalOrder;
use crate::repository::{
    HoldRepository, OrderRepository, RepoResult, RepositoryError, ReturnAnalytics,
};
use crate::stage::ReturnStage;

type OrderKey = (TenantId, String);

/// Thread-safe in-memory order store.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderKey, RentalOrder>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an order (test setup).
    pub fn insert(&self, tenant: &TenantId, order: RentalOrder) {
        self.orders
            .write()
            .unwrap()
            .insert((tenant.clone(), order.session_id.clone()), order);
    }

    /// Snapshot of a single order (test assertions).
    pub fn get(&self, tenant: &TenantId, session_id: &str) -> Option<RentalOrder> {
        self.orders
            .read()
            .unwrap()
            .get(&(tenant.clone(), session_id.to_string()))
            .cloned()
    }

    fn update<F>(&self, tenant: &TenantId, session_id: &str, f: F) -> RepoResult<()>
    where
        F: FnOnce(&mut RentalOrder),
    {
        let mut orders = self.orders.write().unwrap();
        let order = orders
            .get_mut(&(tenant.clone(), session_id.to_string()))
            .ok_or_else(|| RepositoryError::NotFound(format!("order {session_id}")))?;
        f(order);
        Ok(())
    }

    fn set_stage(&self, tenant: &TenantId, session_id: &str, stage: ReturnStage) -> RepoResult<()> {
        self.update(tenant, session_id, |order| {
            order.status = Some(stage);
            if stage == ReturnStage::Received && order.return_received_at.is_none() {
                order.return_received_at = Some(Utc::now());
            }
        })
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn mark_received(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()> {
        self.set_stage(tenant, session_id, ReturnStage::Received)
    }

    async fn mark_cleaning(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()> {
        self.set_stage(tenant, session_id, ReturnStage::Cleaning)
    }

    async fn mark_repair(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()> {
        self.set_stage(tenant, session_id, ReturnStage::Repair)
    }

    async fn mark_qa(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()> {
        self.set_stage(tenant, session_id, ReturnStage::Qa)
    }

    async fn mark_available(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()> {
        self.set_stage(tenant, session_id, ReturnStage::Available)
    }

    async fn orders_with_open_returns(&self, tenant: &TenantId) -> RepoResult<Vec<RentalOrder>> {
        let orders = self.orders.read().unwrap();
        Ok(orders
            .iter()
            .filter(|((t, _), o)| t == tenant && o.return_received_at.is_none())
            .map(|(_, o)| o.clone())
            .collect())
    }

    async fn orders_holding_deposits(&self, tenant: &TenantId) -> RepoResult<Vec<RentalOrder>> {
        let orders = self.orders.read().unwrap();
        Ok(orders
            .iter()
            .filter(|((t, _), o)| t == tenant && o.deposit > 0 && o.refunded_at.is_none())
            .map(|(_, o)| o.clone())
            .collect())
    }

    async fn record_late_fee(
        &self,
        tenant: &TenantId,
        session_id: &str,
        amount: i64,
    ) -> RepoResult<()> {
        self.update(tenant, session_id, |order| {
            order.late_fee_charged = Some(amount);
        })
    }

    async fn mark_refunded(&self, tenant: &TenantId, session_id: &str) -> RepoResult<()> {
        self.update(tenant, session_id, |order| {
            order.refunded_at = Some(Utc::now());
        })
    }
}

/// Thread-safe in-memory hold store.
#[derive(Debug, Default)]
pub struct InMemoryHoldRepository {
    holds: RwLock<HashMap<(TenantId, String), InventoryHold>>,
}

impl InMemoryHoldRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tenant: &TenantId, hold: InventoryHold) {
        self.holds
            .write()
            .unwrap()
            .insert((tenant.clone(), hold.hold_id.clone()), hold);
    }

    pub fn get(&self, tenant: &TenantId, hold_id: &str) -> Option<InventoryHold> {
        self.holds
            .read()
            .unwrap()
            .get(&(tenant.clone(), hold_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl HoldRepository for InMemoryHoldRepository {
    async fn expired_active_holds(
        &self,
        tenant: &TenantId,
        now: DateTime<Utc>,
        limit: usize,
    ) -> RepoResult<Vec<InventoryHold>> {
        let holds = self.holds.read().unwrap();
        let mut expired: Vec<InventoryHold> = holds
            .iter()
            .filter(|((t, _), h)| t == tenant && h.status == HoldStatus::Active && h.is_expired(now))
            .map(|(_, h)| h.clone())
            .collect();
        expired.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));
        expired.truncate(limit);
        Ok(expired)
    }

    async fn hold(&self, tenant: &TenantId, hold_id: &str) -> RepoResult<Option<InventoryHold>> {
        Ok(self.get(tenant, hold_id))
    }

    async fn release(&self, tenant: &TenantId, hold_id: &str) -> RepoResult<()> {
        let mut holds = self.holds.write().unwrap();
        let hold = holds
            .get_mut(&(tenant.clone(), hold_id.to_string()))
            .ok_or_else(|| RepositoryError::NotFound(format!("hold {hold_id}")))?;
        hold.status = HoldStatus::Released;
        Ok(())
    }
}

/// Analytics sink that records every emission (test assertions).
#[derive(Debug, Default)]
pub struct RecordingAnalytics {
    events: RwLock<Vec<(TenantId, String, ReturnStage)>>,
}

impl RecordingAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(TenantId, String, ReturnStage)> {
        self.events.read().unwrap().clone()
    }
}

#[async_trait]
impl ReturnAnalytics for RecordingAnalytics {
    async fn record_stage_event(
        &self,
        tenant: &TenantId,
        session_id: &str,
        stage: ReturnStage,
    ) -> RepoResult<()> {
        self.events
            .write()
            .unwrap()
            .push((tenant.clone(), session_id.to_string(), stage));
        Ok(())
    }
}

//! Test doubles shared by the job tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use loopwear_core::TenantId;

use crate::gateway::{CheckoutSession, GatewayError, PaymentGateway};
use crate::policy::{DepositPolicy, LateFeePolicy, PolicyProvider};

/// Gateway double that serves canned sessions and records every money call.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sessions: RwLock<HashMap<String, CheckoutSession>>,
    charges: RwLock<Vec<(String, i64, String)>>,
    refunds: RwLock<Vec<(String, i64)>>,
    fail_charges: RwLock<bool>,
    fail_refunds: RwLock<bool>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_session(&self, session_id: &str, session: CheckoutSession) {
        self.sessions
            .write()
            .unwrap()
            .insert(session_id.to_string(), session);
    }

    pub fn charges(&self) -> Vec<(String, i64, String)> {
        self.charges.read().unwrap().clone()
    }

    pub fn refunds(&self) -> Vec<(String, i64)> {
        self.refunds.read().unwrap().clone()
    }

    pub fn fail_charges(&self, fail: bool) {
        *self.fail_charges.write().unwrap() = fail;
    }

    pub fn fail_refunds(&self, fail: bool) {
        *self.fail_refunds.write().unwrap() = fail;
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn checkout_session(&self, session_id: &str) -> Result<CheckoutSession, GatewayError> {
        self.sessions
            .read()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| GatewayError::SessionNotFound(session_id.to_string()))
    }

    async fn create_charge(
        &self,
        customer: &str,
        amount: i64,
        currency: &str,
        _description: &str,
    ) -> Result<String, GatewayError> {
        if *self.fail_charges.read().unwrap() {
            return Err(GatewayError::Api("card declined".to_string()));
        }
        let mut charges = self.charges.write().unwrap();
        charges.push((customer.to_string(), amount, currency.to_string()));
        Ok(format!("ch_test_{}", charges.len()))
    }

    async fn create_refund(
        &self,
        payment_intent: &str,
        amount: i64,
    ) -> Result<String, GatewayError> {
        if *self.fail_refunds.read().unwrap() {
            return Err(GatewayError::Api("refund rejected".to_string()));
        }
        let mut refunds = self.refunds.write().unwrap();
        refunds.push((payment_intent.to_string(), amount));
        Ok(format!("re_test_{}", refunds.len()))
    }
}

/// Policy provider with fixed answers for every tenant.
#[derive(Debug, Default)]
pub struct StaticPolicies {
    pub late_fee: Option<LateFeePolicy>,
    pub deposit: Option<DepositPolicy>,
}

#[async_trait]
impl PolicyProvider for StaticPolicies {
    async fn late_fee_policy(&self, _tenant: &TenantId) -> Option<LateFeePolicy> {
        self.late_fee
    }

    async fn deposit_policy(&self, _tenant: &TenantId) -> Option<DepositPolicy> {
        self.deposit
    }
}

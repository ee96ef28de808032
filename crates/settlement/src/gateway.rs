//! Payment gateway port and response shapes.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Currency used when a checkout session does not carry one.
pub const DEFAULT_CURRENCY: &str = "usd";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("checkout session not found: {0}")]
    SessionNotFound(String),

    #[error("gateway call failed: {0}")]
    Api(String),
}

/// Reference to a payment intent inside a checkout session.
///
/// The gateway returns either a bare identifier or, when expansion was
/// requested, the embedded object. Both shapes are accepted here and
/// normalized through [`PaymentIntentRef::id`] immediately at the boundary,
/// so no business logic ever inspects the raw form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PaymentIntentRef {
    Id(String),
    Object { id: String },
}

impl PaymentIntentRef {
    pub fn id(&self) -> &str {
        match self {
            PaymentIntentRef::Id(id) => id,
            PaymentIntentRef::Object { id } => id,
        }
    }
}

/// The slice of a gateway checkout session this subsystem reads.
///
/// Every field may be absent; eligibility code decides per call whether an
/// absence is a failure or a skip.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSession {
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<PaymentIntentRef>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// External payment gateway.
///
/// Implementations wrap the real gateway client; `checkout_session` should
/// request expansion of the payment intent/method so the settlement jobs get
/// a chargeable reference in one round trip.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn checkout_session(&self, session_id: &str) -> Result<CheckoutSession, GatewayError>;

    /// Charge `amount` (smallest currency unit) against a customer's stored
    /// payment method. Returns the gateway charge id.
    async fn create_charge(
        &self,
        customer: &str,
        amount: i64,
        currency: &str,
        description: &str,
    ) -> Result<String, GatewayError>;

    /// Refund `amount` against a payment intent. Returns the refund id.
    async fn create_refund(&self, payment_intent: &str, amount: i64)
        -> Result<String, GatewayError>;
}

//! Rental order settlement state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::stage::ReturnStage;

/// Settlement-relevant view of a rental order.
///
/// Owned by the storefront's persistence layer; the job subsystem only reads
/// it and mutates it through [`crate::OrderRepository`], keyed by
/// `(tenant, session_id)`. Amounts are in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalOrder {
    /// Checkout session that paid for the rental (gateway-issued).
    pub session_id: String,
    /// Current reverse-logistics stage, once the garment is on its way back.
    pub status: Option<ReturnStage>,
    pub return_due_date: Option<DateTime<Utc>>,
    pub return_received_at: Option<DateTime<Utc>>,
    /// Late fee already charged, if any. Presence is the idempotency guard:
    /// a late fee is charged at most once.
    pub late_fee_charged: Option<i64>,
    pub deposit: i64,
    pub damage_fee: i64,
    /// When the deposit was refunded. Presence guards against double refunds.
    pub refunded_at: Option<DateTime<Utc>>,
}

impl RentalOrder {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            status: None,
            return_due_date: None,
            return_received_at: None,
            late_fee_charged: None,
            deposit: 0,
            damage_fee: 0,
            refunded_at: None,
        }
    }

    /// Whether a late fee is due as of `now`.
    ///
    /// Requires a due date, no return received, no fee charged yet, and
    /// `now` strictly past the due date plus the grace window. At
    /// `now == due + grace` the order is still inside the grace window.
    pub fn late_fee_due(&self, now: DateTime<Utc>, grace_period_days: i64) -> bool {
        let Some(due) = self.return_due_date else {
            return false;
        };
        if self.return_received_at.is_some() || self.late_fee_charged.is_some() {
            return false;
        }
        now > due + Duration::days(grace_period_days)
    }

    /// Deposit minus damage fees, floored at zero.
    pub fn refundable_deposit(&self) -> i64 {
        (self.deposit - self.damage_fee).max(0)
    }

    /// Whether the deposit is ready to be released: garment returned, not
    /// refunded yet, and there was a deposit to begin with.
    pub fn deposit_release_due(&self) -> bool {
        self.return_received_at.is_some() && self.refunded_at.is_none() && self.deposit > 0
    }
}

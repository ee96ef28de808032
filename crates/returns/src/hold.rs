//! Inventory holds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hold lifecycle.
///
/// Holds are created by checkout (outside this subsystem). The expiry sweep
/// only moves `Active` holds past their deadline to `Released`; a hold that
/// was committed first must stay committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldStatus {
    Active,
    Released,
    Committed,
}

/// A reservation of stock for an in-flight checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryHold {
    pub hold_id: String,
    pub status: HoldStatus,
    pub expires_at: DateTime<Utc>,
}

impl InventoryHold {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

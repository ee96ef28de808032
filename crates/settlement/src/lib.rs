//! `loopwear-settlement` — periodic financial reconciliation jobs.
//!
//! Three batch jobs settle money and stock state against the external
//! payment gateway: late-fee charging for overdue returns, deposit release
//! once a garment is back, and expiry of stale inventory holds. All three
//! follow the same shape — enumerate candidates, check eligibility, act via
//! the gateway, persist — with per-item failure isolation and idempotency
//! guards in the order data itself.

pub mod deposit;
pub mod gateway;
pub mod holds;
pub mod late_fee;
pub mod policy;

pub use deposit::DepositReleaseJob;
pub use gateway::{CheckoutSession, GatewayError, PaymentGateway, PaymentIntentRef, DEFAULT_CURRENCY};
pub use holds::{ExpiredHoldJob, HoldSweepReport, DEFAULT_SWEEP_LIMIT};
pub use late_fee::LateFeeJob;
pub use policy::{DepositPolicy, FilePolicyProvider, LateFeePolicy, PolicyProvider};

#[cfg(test)]
pub(crate) mod testing;

//! `loopwear-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the background-job
//! crates (no storage, gateway or runtime concerns).

pub mod fsm;
pub mod task;
pub mod tenant;

pub use fsm::{FsmError, StateMachine, Transition};
pub use task::TenantTask;
pub use tenant::TenantId;

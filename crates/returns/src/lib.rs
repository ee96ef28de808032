//! `loopwear-returns` — reverse-logistics domain for garment returns.
//!
//! Types and ports for the return lifecycle (received → cleaning → repair →
//! qa → available), rental-order settlement state, and inventory holds.
//! Persistence itself is out of scope: the job crates talk to the
//! [`OrderRepository`]/[`HoldRepository`] ports and treat their backing store
//! as opaque.

pub mod hold;
pub mod in_memory;
pub mod order;
pub mod repository;
pub mod stage;

pub use hold::{HoldStatus, InventoryHold};
pub use in_memory::{InMemoryHoldRepository, InMemoryOrderRepository, RecordingAnalytics};
pub use order::RentalOrder;
pub use repository::{
    HoldRepository, OrderRepository, RepoResult, RepositoryError, ReturnAnalytics,
};
pub use stage::{ReturnStage, UnknownStage};

//! `loopwear-queue` — crash-tolerant file-backed event queue.
//!
//! Producers (webhook handlers, warehouse scanners) append one JSON record
//! per return event under `<root>/<tenant>/queue/`; the processor drains the
//! directory on a schedule and applies each event to the order store.
//! Delivery is at-least-once: records survive crashes on disk, and the
//! consuming handlers are idempotent.

pub mod processor;
pub mod record;
pub mod store;

pub use processor::{ProcessReport, ReturnEventProcessor};
pub use record::QueuedReturnEvent;
pub use store::{EventQueue, QueueError};

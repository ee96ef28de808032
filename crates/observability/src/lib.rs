//! `loopwear-observability` — logging/tracing setup for the job processes.

mod tracing_init;

pub use tracing_init::init;

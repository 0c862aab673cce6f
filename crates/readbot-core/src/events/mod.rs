//! Event sourcing loop: raw updates in, classified events executed against the store.

pub mod classify;
pub mod consumer;
pub mod processor;

pub use classify::{classify, Event};
pub use consumer::{BatchSummary, EventConsumer};
pub use processor::{CommandProcessor, ProcessOutcome, Processor};

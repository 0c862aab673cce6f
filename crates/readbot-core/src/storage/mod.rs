//! Persistence port for saved pages.

pub mod memory;
pub mod port;

pub use memory::MemoryPageStore;
pub use port::{PageStore, SaveOutcome};

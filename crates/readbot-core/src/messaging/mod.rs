//! Chat transport ports (Telegram today).

pub mod port;
pub mod throttled;

pub use port::{MessageSender, UpdateSource};
pub use throttled::{ThrottleConfig, ThrottledSender};

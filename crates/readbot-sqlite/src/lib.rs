//! SQLite adapter (sqlx).
//!
//! Implements the `readbot-core` `PageStore` port over a `pages` table unique on
//! `(url, user_name)`.

mod pool;
mod store;

pub use pool::connect;
pub use store::SqlitePageStore;

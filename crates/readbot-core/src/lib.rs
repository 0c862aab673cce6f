//! Core domain + application logic for readbot, a read-it-later Telegram bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the SQL store
//! live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod cursor;
pub mod domain;
pub mod errors;
pub mod events;
pub mod logging;
pub mod messages;
pub mod messaging;
pub mod storage;

pub use errors::{Error, Result};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, RawUpdate, UpdateId},
    Result,
};

/// Inbound half of the chat transport: "things that can be fetched from".
///
/// The implementation owns the cursor. `fetch_batch` never moves it; only
/// `advance_cursor` does, after the caller has handed the batch off.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Up to `max` updates strictly after the cursor, oldest first.
    ///
    /// Blocks for at most the provider's long-poll window and returns an empty
    /// batch when nothing arrived.
    async fn fetch_batch(&self, max: usize) -> Result<Vec<RawUpdate>>;

    /// Everything up to and including `last_seen` has been handed off and must not
    /// be delivered again.
    async fn advance_cursor(&self, last_seen: UpdateId) -> Result<()>;
}

/// Outbound half of the chat transport: "things that can be sent to".
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Best-effort plain-text reply.
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<()>;
}

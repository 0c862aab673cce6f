//! Telegram adapter (teloxide).
//!
//! Implements the `readbot-core` `UpdateSource` and `MessageSender` ports over the
//! Bot API long-polling `getUpdates` call. The cursor lives in this adapter.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{Update, UpdateKind},
};
use tokio::time::sleep;
use tracing::debug;

use readbot_core::{
    cursor::Cursor,
    domain::{ChatId, IncomingMessage, Owner, RawUpdate, UpdateId},
    errors::Error,
    messaging::port::{MessageSender, UpdateSource},
    Result,
};

/// Bot API upper bound for `getUpdates.limit`.
const MAX_UPDATES_PER_CALL: usize = 100;

pub struct TelegramTransport {
    bot: Bot,
    cursor: Cursor,
    poll_timeout: Duration,
}

impl TelegramTransport {
    pub fn new(bot: Bot, poll_timeout: Duration) -> Self {
        Self {
            bot,
            cursor: Cursor::new(),
            poll_timeout,
        }
    }

    pub fn from_token(token: &str, poll_timeout: Duration) -> Self {
        Self::new(Bot::new(token), poll_timeout)
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// `@username` of the bot; also verifies the token.
    pub async fn username(&self) -> Result<String> {
        let me = self.bot.get_me().await.map_err(Self::map_err)?;
        Ok(me.username().to_string())
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Tell Telegram the cursor position without waiting for new updates.
    ///
    /// Telegram only forgets updates once a later `getUpdates` carries a higher
    /// offset; call this before exiting so a restart does not replay the last batch.
    pub async fn confirm_cursor(&self) -> Result<()> {
        if self.cursor.last().is_none() {
            return Ok(());
        }
        self.bot
            .get_updates()
            .offset(self.offset()?)
            .limit(1)
            .timeout(0)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    fn offset(&self) -> Result<i32> {
        i32::try_from(self.cursor.next_offset())
            .map_err(|_| Error::Transport("update offset out of range".to_string()))
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    debug!(wait = ?d, "telegram flood control; retrying once");
                    sleep(d).await;
                }
                Err(other) => return Err(Self::map_err(other)),
            }
        }
    }
}

/// Map a Telegram update onto the provider-neutral shape.
///
/// Only new chat messages become `IncomingMessage`s; everything else keeps its
/// position so the cursor can move past it.
pub fn to_raw_update(update: Update) -> RawUpdate {
    let position = UpdateId(i64::from(update.id));
    let message = match update.kind {
        UpdateKind::Message(msg) => msg.from().map(|user| IncomingMessage {
            chat_id: ChatId(msg.chat.id.0),
            owner: Owner::new(user.id.0.to_string()),
            text: msg.text().unwrap_or_default().to_string(),
        }),
        _ => None,
    };
    RawUpdate { position, message }
}

/// Keep updates strictly after `cursor`, oldest first, at most `max`.
pub fn pending_batch(
    updates: impl IntoIterator<Item = RawUpdate>,
    cursor: &Cursor,
    max: usize,
) -> Vec<RawUpdate> {
    let mut batch: Vec<RawUpdate> = updates
        .into_iter()
        .filter(|u| cursor.is_pending(u.position))
        .collect();
    batch.sort_by_key(|u| u.position);
    batch.truncate(max);
    batch
}

#[async_trait]
impl UpdateSource for TelegramTransport {
    async fn fetch_batch(&self, max: usize) -> Result<Vec<RawUpdate>> {
        let max = max.clamp(1, MAX_UPDATES_PER_CALL);
        let timeout = u32::try_from(self.poll_timeout.as_secs()).unwrap_or(u32::MAX);

        let updates = self
            .bot
            .get_updates()
            .offset(self.offset()?)
            .limit(max as u8)
            .timeout(timeout)
            .await
            .map_err(Self::map_err)?;

        Ok(pending_batch(
            updates.into_iter().map(to_raw_update),
            &self.cursor,
            max,
        ))
    }

    async fn advance_cursor(&self, last_seen: UpdateId) -> Result<()> {
        if !self.cursor.advance(last_seen) {
            debug!(position = %last_seen, "cursor already past position");
        }
        Ok(())
    }
}

#[async_trait]
impl MessageSender for TelegramTransport {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .send_message(Self::tg_chat(chat_id), text.to_string())
        })
        .await?;
        Ok(())
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    domain::{ChatId, Owner, Page, RawUpdate},
    events::classify::{classify, Event},
    messages,
    messaging::port::MessageSender,
    storage::port::{PageStore, SaveOutcome},
    Result,
};

/// Result of handling one update that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The event was executed. `reply_delivered` is `false` when the reply send failed;
    /// storage effects stand either way.
    Handled { event: Event, reply_delivered: bool },
    /// Not a chat message; nothing to do and nobody to answer.
    Skipped,
}

/// Per-update handler driven by the consumer.
#[async_trait]
pub trait Processor: Send + Sync {
    /// An `Err` means this update failed; the caller logs it and moves on.
    async fn process(&self, update: RawUpdate) -> Result<ProcessOutcome>;
}

/// Classifies each message and runs the matching command against the page store.
///
/// Stateless across updates: no session or conversation state is kept.
#[derive(Clone)]
pub struct CommandProcessor {
    store: Arc<dyn PageStore>,
    sender: Arc<dyn MessageSender>,
}

impl CommandProcessor {
    pub fn new(store: Arc<dyn PageStore>, sender: Arc<dyn MessageSender>) -> Self {
        Self { store, sender }
    }

    /// Run the command and produce its reply text.
    ///
    /// `NotFound` is an answer, not a failure; any other storage error propagates.
    async fn execute(&self, event: &Event, owner: &Owner) -> Result<String> {
        match event {
            Event::SaveLink(url) => {
                let page = Page::new(url.clone(), owner.clone());
                Ok(match self.store.save(&page).await? {
                    SaveOutcome::Saved => messages::SAVED.to_string(),
                    SaveOutcome::AlreadyExists => messages::ALREADY_SAVED.to_string(),
                })
            }
            Event::Random => match self.store.pick_random(owner).await {
                Ok(page) => Ok(page.url),
                Err(e) if e.is_not_found() => Ok(messages::NOTHING_SAVED.to_string()),
                Err(e) => Err(e),
            },
            Event::Remove(url) => {
                let page = Page::new(url.clone(), owner.clone());
                match self.store.remove(&page).await {
                    Ok(()) => Ok(messages::REMOVED.to_string()),
                    Err(e) if e.is_not_found() => Ok(messages::NOT_IN_LIST.to_string()),
                    Err(e) => Err(e),
                }
            }
            Event::Start => Ok(messages::hello(self.store.count(owner).await?)),
            Event::Help | Event::Unrecognized => Ok(messages::HELP.to_string()),
        }
    }

    async fn reply(&self, chat_id: ChatId, text: &str) -> bool {
        match self.sender.send(chat_id, text).await {
            Ok(()) => true,
            Err(e) => {
                warn!(chat_id = chat_id.0, error = %e, "reply failed");
                false
            }
        }
    }
}

#[async_trait]
impl Processor for CommandProcessor {
    async fn process(&self, update: RawUpdate) -> Result<ProcessOutcome> {
        let Some(msg) = update.message else {
            debug!(position = %update.position, "skipping non-message update");
            return Ok(ProcessOutcome::Skipped);
        };

        let event = classify(&msg.text);
        debug!(position = %update.position, owner = %msg.owner, ?event, "classified update");

        let reply = match self.execute(&event, &msg.owner).await {
            Ok(reply) => reply,
            Err(e) => {
                // The user still gets exactly one answer.
                self.reply(msg.chat_id, messages::TRY_AGAIN).await;
                return Err(e);
            }
        };

        let reply_delivered = self.reply(msg.chat_id, &reply).await;
        Ok(ProcessOutcome::Handled {
            event,
            reply_delivered,
        })
    }
}

use std::fmt;

/// Stable identifier of the user who owns saved pages.
///
/// For Telegram this is the numeric user id rendered as a decimal string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Owner(pub String);

impl Owner {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chat to reply into (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Provider-assigned, strictly increasing position of an inbound update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UpdateId(pub i64);

impl fmt::Display for UpdateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A saved link, scoped to one owner. Unique on `(url, owner)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Page {
    pub url: String,
    pub owner: Owner,
}

impl Page {
    pub fn new(url: impl Into<String>, owner: Owner) -> Self {
        Self {
            url: url.into(),
            owner,
        }
    }
}

/// One inbound unit from the chat provider.
///
/// `message` is `None` for updates that are not chat messages (edits, callbacks, ...);
/// those still carry a position so the cursor can move past them.
#[derive(Clone, Debug)]
pub struct RawUpdate {
    pub position: UpdateId,
    pub message: Option<IncomingMessage>,
}

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub owner: Owner,
    /// Empty for messages without text (stickers, photos, ...).
    pub text: String,
}

impl RawUpdate {
    pub fn text(position: i64, chat_id: i64, owner: &str, text: &str) -> Self {
        Self {
            position: UpdateId(position),
            message: Some(IncomingMessage {
                chat_id: ChatId(chat_id),
                owner: Owner::new(owner),
                text: text.to_string(),
            }),
        }
    }

    pub fn non_message(position: i64) -> Self {
        Self {
            position: UpdateId(position),
            message: None,
        }
    }
}

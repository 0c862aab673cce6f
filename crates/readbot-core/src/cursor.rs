use std::sync::Mutex;

use crate::domain::UpdateId;

/// Last consumed update position.
///
/// Owned by one transport instance; never a process-wide singleton so several bots
/// (or tests) can run side by side. Monotonic: moving backwards is ignored.
#[derive(Debug, Default)]
pub struct Cursor {
    last: Mutex<Option<UpdateId>>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume after a known position.
    pub fn starting_after(position: UpdateId) -> Self {
        Self {
            last: Mutex::new(Some(position)),
        }
    }

    pub fn last(&self) -> Option<UpdateId> {
        *self.lock()
    }

    /// Returns `true` when `position` has not been consumed yet.
    pub fn is_pending(&self, position: UpdateId) -> bool {
        match self.last() {
            Some(last) => position > last,
            None => true,
        }
    }

    /// Commit everything up to and including `position`.
    ///
    /// Returns `false` (and changes nothing) when `position` is not ahead of the cursor.
    pub fn advance(&self, position: UpdateId) -> bool {
        let mut last = self.lock();
        match *last {
            Some(current) if position <= current => false,
            _ => {
                *last = Some(position);
                true
            }
        }
    }

    /// Telegram-style offset: first position that has not been consumed.
    pub fn next_offset(&self) -> i64 {
        self.last().map(|p| p.0 + 1).unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<UpdateId>> {
        // The guarded value is a plain Copy; a poisoned lock still holds a valid position.
        self.last.lock().unwrap_or_else(|e| e.into_inner())
    }
}

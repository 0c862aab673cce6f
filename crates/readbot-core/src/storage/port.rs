use async_trait::async_trait;

use crate::{
    domain::{Owner, Page},
    Result,
};

/// What `save` did with the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// `(url, owner)` was already stored; nothing changed.
    AlreadyExists,
}

/// Hexagonal port for page persistence.
///
/// Every operation is a single-row, non-transactional call. Implementations own
/// connection pooling and whatever locking they need.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Idempotent readiness check (schema bootstrap, connectivity).
    async fn init(&self) -> Result<()>;

    /// Insert if absent. A duplicate `(url, owner)` is a no-op, not an error.
    async fn save(&self, page: &Page) -> Result<SaveOutcome>;

    /// One of the owner's pages, uniformly at random. `Error::NotFound` when they have none.
    async fn pick_random(&self, owner: &Owner) -> Result<Page>;

    /// Delete the exact `(url, owner)` row. `Error::NotFound` when absent.
    async fn remove(&self, page: &Page) -> Result<()>;

    async fn exists(&self, page: &Page) -> Result<bool>;

    async fn count(&self, owner: &Owner) -> Result<u64>;
}

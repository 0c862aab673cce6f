use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use rand::seq::IteratorRandom;

use crate::{
    domain::{Owner, Page},
    errors::Error,
    storage::port::{PageStore, SaveOutcome},
    Result,
};

/// In-process `PageStore`, used by tests and for throwaway runs (`DATABASE_URL=memory`).
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    // (owner, url) ordering keeps one owner's pages contiguous.
    rows: Mutex<BTreeSet<(Owner, String)>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> MutexGuard<'_, BTreeSet<(Owner, String)>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn key(page: &Page) -> (Owner, String) {
        (page.owner.clone(), page.url.clone())
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn save(&self, page: &Page) -> Result<SaveOutcome> {
        if self.rows().insert(Self::key(page)) {
            Ok(SaveOutcome::Saved)
        } else {
            Ok(SaveOutcome::AlreadyExists)
        }
    }

    async fn pick_random(&self, owner: &Owner) -> Result<Page> {
        let rows = self.rows();
        rows.iter()
            .filter(|(o, _)| o == owner)
            .choose(&mut rand::thread_rng())
            .map(|(o, url)| Page::new(url.clone(), o.clone()))
            .ok_or_else(|| Error::NotFound(format!("no saved pages for {owner}")))
    }

    async fn remove(&self, page: &Page) -> Result<()> {
        if self.rows().remove(&Self::key(page)) {
            Ok(())
        } else {
            Err(Error::NotFound(format!("{} is not saved", page.url)))
        }
    }

    async fn exists(&self, page: &Page) -> Result<bool> {
        Ok(self.rows().contains(&Self::key(page)))
    }

    async fn count(&self, owner: &Owner) -> Result<u64> {
        Ok(self.rows().iter().filter(|(o, _)| o == owner).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn alice() -> Owner {
        Owner::new("alice")
    }

    #[tokio::test]
    async fn save_twice_keeps_one_row() {
        let store = MemoryPageStore::new();
        let page = Page::new("https://example.com/a", alice());

        assert_eq!(store.save(&page).await.unwrap(), SaveOutcome::Saved);
        assert_eq!(store.save(&page).await.unwrap(), SaveOutcome::AlreadyExists);
        assert_eq!(store.count(&alice()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn same_url_is_scoped_per_owner() {
        let store = MemoryPageStore::new();
        let url = "https://example.com/shared";

        store.save(&Page::new(url, alice())).await.unwrap();
        let outcome = store.save(&Page::new(url, Owner::new("bob"))).await.unwrap();

        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(store.count(&Owner::new("bob")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn pick_random_without_pages_is_not_found() {
        let store = MemoryPageStore::new();
        store
            .save(&Page::new("https://example.com", Owner::new("bob")))
            .await
            .unwrap();

        let err = store.pick_random(&alice()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn remove_then_exists_is_false() {
        let store = MemoryPageStore::new();
        let page = Page::new("https://example.com/a", alice());

        assert!(store.remove(&page).await.unwrap_err().is_not_found());

        store.save(&page).await.unwrap();
        assert!(store.exists(&page).await.unwrap());
        store.remove(&page).await.unwrap();
        assert!(!store.exists(&page).await.unwrap());
    }

    #[tokio::test]
    async fn pick_random_is_roughly_uniform() {
        let store = MemoryPageStore::new();
        let urls = ["https://a.example", "https://b.example", "https://c.example"];
        for u in urls {
            store.save(&Page::new(u, alice())).await.unwrap();
        }

        let trials = 3000;
        let mut hits: HashMap<String, usize> = HashMap::new();
        for _ in 0..trials {
            let p = store.pick_random(&alice()).await.unwrap();
            assert_eq!(p.owner, alice());
            *hits.entry(p.url).or_default() += 1;
        }

        // Expected 1000 each; the bound sits far outside binomial noise.
        for u in urls {
            let n = hits.get(u).copied().unwrap_or(0);
            assert!((700..=1300).contains(&n), "{u} picked {n} times");
        }
    }
}

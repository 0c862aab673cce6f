use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqlitePool, Row};
use tracing::debug;

use readbot_core::{
    domain::{Owner, Page},
    errors::Error,
    storage::{PageStore, SaveOutcome},
    Result,
};

use crate::pool;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL,
        user_name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (url, user_name)
    )",
    "CREATE INDEX IF NOT EXISTS idx_pages_user ON pages (user_name)",
];

/// SQLite-backed implementation of `PageStore`.
#[derive(Clone)]
pub struct SqlitePageStore {
    pool: SqlitePool,
}

impl SqlitePageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open `database_url` and bootstrap the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let store = Self::new(pool::connect(database_url).await?);
        store.init().await?;
        Ok(store)
    }
}

fn storage_err(op: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| Error::Storage(format!("{op}: {e}"))
}

#[async_trait]
impl PageStore for SqlitePageStore {
    async fn init(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(*stmt)
                .execute(&self.pool)
                .await
                .map_err(storage_err("init"))?;
        }
        debug!("pages schema ready");
        Ok(())
    }

    async fn save(&self, page: &Page) -> Result<SaveOutcome> {
        let res = sqlx::query(
            "INSERT INTO pages (url, user_name, created_at) VALUES (?, ?, ?)
             ON CONFLICT (url, user_name) DO NOTHING",
        )
        .bind(&page.url)
        .bind(page.owner.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage_err("save"))?;

        if res.rows_affected() == 0 {
            Ok(SaveOutcome::AlreadyExists)
        } else {
            Ok(SaveOutcome::Saved)
        }
    }

    async fn pick_random(&self, owner: &Owner) -> Result<Page> {
        let row = sqlx::query(
            "SELECT url, user_name FROM pages WHERE user_name = ? ORDER BY RANDOM() LIMIT 1",
        )
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err("pick_random"))?;

        let Some(row) = row else {
            return Err(Error::NotFound(format!("no saved pages for {owner}")));
        };

        let url: String = row.try_get("url").map_err(storage_err("pick_random"))?;
        let user_name: String = row
            .try_get("user_name")
            .map_err(storage_err("pick_random"))?;
        Ok(Page::new(url, Owner::new(user_name)))
    }

    async fn remove(&self, page: &Page) -> Result<()> {
        let res = sqlx::query("DELETE FROM pages WHERE url = ? AND user_name = ?")
            .bind(&page.url)
            .bind(page.owner.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_err("remove"))?;

        if res.rows_affected() == 0 {
            return Err(Error::NotFound(format!("{} is not saved", page.url)));
        }
        Ok(())
    }

    async fn exists(&self, page: &Page) -> Result<bool> {
        let (exists,): (i64,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM pages WHERE url = ? AND user_name = ?)",
        )
        .bind(&page.url)
        .bind(page.owner.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err("exists"))?;
        Ok(exists != 0)
    }

    async fn count(&self, owner: &Owner) -> Result<u64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pages WHERE user_name = ?")
            .bind(owner.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err("count"))?;
        Ok(n.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    async fn store() -> SqlitePageStore {
        SqlitePageStore::connect("sqlite::memory:").await.unwrap()
    }

    fn alice() -> Owner {
        Owner::new("alice")
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let s = store().await;
        s.init().await.unwrap();
        s.init().await.unwrap();
        assert_eq!(s.count(&alice()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn save_twice_leaves_one_row() {
        let s = store().await;
        let page = Page::new("https://example.com/a", alice());

        assert_eq!(s.save(&page).await.unwrap(), SaveOutcome::Saved);
        assert_eq!(s.save(&page).await.unwrap(), SaveOutcome::AlreadyExists);

        let (rows,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM pages WHERE url = ? AND user_name = ?")
                .bind(&page.url)
                .bind("alice")
                .fetch_one(&s.pool)
                .await
                .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn pick_random_scoped_to_owner() {
        let s = store().await;
        s.save(&Page::new("https://bob.example", Owner::new("bob")))
            .await
            .unwrap();

        assert!(s.pick_random(&alice()).await.unwrap_err().is_not_found());

        s.save(&Page::new("https://alice.example", alice()))
            .await
            .unwrap();
        let picked = s.pick_random(&alice()).await.unwrap();
        assert_eq!(picked, Page::new("https://alice.example", alice()));
    }

    #[tokio::test]
    async fn remove_missing_is_not_found_and_existing_is_gone() {
        let s = store().await;
        let page = Page::new("https://example.com/a", alice());

        assert!(s.remove(&page).await.unwrap_err().is_not_found());

        s.save(&page).await.unwrap();
        assert!(s.exists(&page).await.unwrap());
        s.remove(&page).await.unwrap();
        assert!(!s.exists(&page).await.unwrap());
    }

    #[tokio::test]
    async fn pick_random_covers_all_pages() {
        let s = store().await;
        let urls = ["https://a.example", "https://b.example", "https://c.example"];
        for u in urls {
            s.save(&Page::new(u, alice())).await.unwrap();
        }

        let trials = 900;
        let mut hits: HashMap<String, usize> = HashMap::new();
        for _ in 0..trials {
            *hits.entry(s.pick_random(&alice()).await.unwrap().url).or_default() += 1;
        }

        // Expected 300 each.
        for u in urls {
            let n = hits.get(u).copied().unwrap_or(0);
            assert!((180..=420).contains(&n), "{u} picked {n} times");
        }
    }

    #[tokio::test]
    async fn file_database_survives_reconnect() {
        let path = std::env::temp_dir().join(format!(
            "readbot-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let url = format!("sqlite://{}", path.display());
        let page = Page::new("https://example.com/keep", alice());

        {
            let s = SqlitePageStore::connect(&url).await.unwrap();
            s.save(&page).await.unwrap();
            s.pool.close().await;
        }

        let s = SqlitePageStore::connect(&url).await.unwrap();
        assert!(s.exists(&page).await.unwrap());
        s.pool.close().await;

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}

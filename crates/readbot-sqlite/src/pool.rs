use std::{str::FromStr, time::Duration};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use readbot_core::{errors::Error, Result};

/// Open a pool for `database_url` (`sqlite://path.db`, `sqlite::memory:`).
///
/// The consumer is a single sequential loop, so one connection is enough. It is
/// never recycled, which also keeps an in-memory database alive for the pool's life.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let mut opts = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| Error::Config(format!("invalid DATABASE_URL: {e}")))?
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5))
        .create_if_missing(true);

    if !is_in_memory(database_url) {
        opts = opts.journal_mode(SqliteJournalMode::Wal);
    }

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await
        .map_err(|e| Error::Storage(format!("failed to open {database_url}: {e}")))
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:pages?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://pages.db"));
    }

    #[tokio::test]
    async fn in_memory_pool_answers_queries() {
        let pool = connect("sqlite::memory:").await.unwrap();
        let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);
    }
}

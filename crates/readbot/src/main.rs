use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use readbot_core::{
    config::Config,
    events::{CommandProcessor, EventConsumer},
    messaging::{MessageSender, ThrottleConfig, ThrottledSender},
    storage::{MemoryPageStore, PageStore},
};
use readbot_sqlite::SqlitePageStore;
use readbot_telegram::TelegramTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    readbot_core::logging::init("readbot")?;

    let cfg = Config::load()?;

    let store = open_store(&cfg.database_url).await?;

    let transport = Arc::new(TelegramTransport::from_token(
        &cfg.telegram_bot_token,
        cfg.poll_timeout,
    ));
    let name = transport
        .username()
        .await
        .context("invalid TELEGRAM_BOT_TOKEN")?;
    info!(bot = %name, "readbot started");

    // Throttle replies to stay clear of Telegram 429s; retries live in the adapter.
    let sender: Arc<dyn MessageSender> = Arc::new(ThrottledSender::new(
        transport.clone(),
        ThrottleConfig {
            global_min_interval: cfg.send_min_interval,
            per_chat_min_interval: cfg.chat_min_interval,
        },
    ));
    let processor = Arc::new(CommandProcessor::new(store, sender));

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_ctrl_c(cancel.clone()));

    let consumer =
        EventConsumer::new(transport.clone(), processor, cfg.batch_size).with_cancellation(cancel);
    let result = consumer.run().await;

    if let Err(e) = transport.confirm_cursor().await {
        warn!(error = %e, "failed to confirm update cursor");
    }

    result.context("service is stopped")?;
    info!("service is stopped");
    Ok(())
}

async fn open_store(database_url: &str) -> anyhow::Result<Arc<dyn PageStore>> {
    if database_url == "memory" {
        warn!("DATABASE_URL=memory: saved pages are lost on exit");
        return Ok(Arc::new(MemoryPageStore::new()));
    }
    // `connect` runs the idempotent schema bootstrap.
    let store = SqlitePageStore::connect(database_url)
        .await
        .with_context(|| format!("failed to open storage at {database_url}"))?;
    Ok(Arc::new(store))
}

async fn shutdown_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("shutdown requested; finishing current batch");
            cancel.cancel();
        }
        Err(e) => warn!(error = %e, "cannot listen for ctrl-c"),
    }
}

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    domain::{RawUpdate, UpdateId},
    events::processor::{ProcessOutcome, Processor},
    messaging::port::UpdateSource,
    Result,
};

/// Per-batch tally. Failures are counted here instead of unwinding the batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub received: usize,
    pub handled: usize,
    pub skipped: usize,
    pub failed: usize,
    pub last_position: Option<UpdateId>,
}

/// Drives fetch -> dispatch -> acknowledge until cancelled or a fetch fails.
pub struct EventConsumer {
    source: Arc<dyn UpdateSource>,
    processor: Arc<dyn Processor>,
    batch_size: usize,
    cancel: CancellationToken,
}

impl EventConsumer {
    pub fn new(
        source: Arc<dyn UpdateSource>,
        processor: Arc<dyn Processor>,
        batch_size: usize,
    ) -> Self {
        Self {
            source,
            processor,
            batch_size: batch_size.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token (e.g. wired to SIGINT).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Top-level blocking loop.
    ///
    /// Returns `Ok(())` once cancellation is observed (checked between iterations;
    /// an in-flight long poll is allowed to finish). Returns `Err` on a fetch or
    /// cursor failure, leaving restart policy to the caller.
    pub async fn run(&self) -> Result<()> {
        info!(batch_size = self.batch_size, "event consumer started");

        loop {
            if self.cancel.is_cancelled() {
                info!("event consumer stopped");
                return Ok(());
            }

            let batch = match self.source.fetch_batch(self.batch_size).await {
                Ok(batch) => batch,
                Err(e) => {
                    error!(error = %e, "fetching updates failed; stopping consumer");
                    return Err(e);
                }
            };

            // The transport's long-poll window is the backoff.
            if batch.is_empty() {
                continue;
            }

            let summary = self.handle_batch(batch).await;
            debug!(
                received = summary.received,
                handled = summary.handled,
                skipped = summary.skipped,
                failed = summary.failed,
                "batch done"
            );

            if let Some(last) = summary.last_position {
                if let Err(e) = self.source.advance_cursor(last).await {
                    error!(error = %e, position = %last, "advancing cursor failed; stopping consumer");
                    return Err(e);
                }
            }
        }
    }

    /// Hand every update to the processor, strictly in order.
    ///
    /// One failing update never blocks the rest of the batch.
    pub async fn handle_batch(&self, batch: Vec<RawUpdate>) -> BatchSummary {
        let mut summary = BatchSummary {
            received: batch.len(),
            ..BatchSummary::default()
        };

        for update in batch {
            let position = update.position;
            match self.processor.process(update).await {
                Ok(ProcessOutcome::Handled { .. }) => summary.handled += 1,
                Ok(ProcessOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    warn!(position = %position, error = %e, "update failed; continuing with batch");
                    summary.failed += 1;
                }
            }
            summary.last_position = Some(position);
        }

        summary
    }
}

//! Leaderboard refresh cycle.
//!
//! Each pass reads the row count, then every row in index order, strictly
//! sequentially. A pass either completes and publishes the full sorted list
//! or is discarded whole: a failure mid-pass leaves the last published
//! leaderboard untouched and the cycle retries on its next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

use chain_core::{ChainTransport, LedgerOperations, ScoreRecord, TransportError};

use crate::events::{EventBus, LeaderboardEvent, SyncEvent};

pub(crate) struct LeaderboardWorker {
    transport: Arc<dyn ChainTransport>,
    ops: Arc<dyn LedgerOperations>,
    event_bus: EventBus,
    warmup: Duration,
    steady: Duration,
}

impl LeaderboardWorker {
    pub(crate) fn new(
        transport: Arc<dyn ChainTransport>,
        ops: Arc<dyn LedgerOperations>,
        event_bus: EventBus,
        warmup: Duration,
        steady: Duration,
    ) -> Self {
        Self {
            transport,
            ops,
            event_bus,
            warmup,
            steady,
        }
    }

    pub(crate) async fn run(self) {
        // Stay on the short warm-up interval until the first full pass
        // lands, then widen to reduce node load.
        let mut interval = self.warmup;
        loop {
            time::sleep(interval).await;

            match self.refresh_once().await {
                Ok(records) => {
                    debug!(rows = records.len(), "leaderboard refreshed");
                    interval = self.steady;
                    self.event_bus
                        .publish(SyncEvent::Leaderboard(LeaderboardEvent::Refreshed {
                            records,
                        }));
                }
                Err(error) => {
                    warn!("leaderboard refresh failed, keeping last state: {error}");
                }
            }
        }
    }

    /// One full pass: count, then rows 0..count in increasing order.
    async fn refresh_once(&self) -> Result<Vec<ScoreRecord>, TransportError> {
        let raw = self.transport.call(&self.ops.count_read_call()).await?;
        let count = self.ops.decode_count(&raw)?;

        let mut records = Vec::with_capacity(count as usize);
        for index in 0..count {
            let call = self.ops.score_at_index_read_call(index)?;
            let raw = self.transport.call(&call).await?;
            records.push(self.ops.decode_score_record(&raw)?);
        }

        // Non-increasing by score; sort_by is stable, so ties keep their
        // ledger order.
        records.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(records)
    }
}

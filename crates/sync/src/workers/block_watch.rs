//! Block watch cycle.
//!
//! Periodically reads the chain height as a cheap connectivity signal for
//! display. Failures are quiet; the next tick tries again.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::debug;

use chain_core::ChainTransport;

use crate::events::{ChainEvent, EventBus, SyncEvent};

pub(crate) struct BlockWatchWorker {
    transport: Arc<dyn ChainTransport>,
    event_bus: EventBus,
    warmup: Duration,
    steady: Duration,
}

impl BlockWatchWorker {
    pub(crate) fn new(
        transport: Arc<dyn ChainTransport>,
        event_bus: EventBus,
        warmup: Duration,
        steady: Duration,
    ) -> Self {
        Self {
            transport,
            event_bus,
            warmup,
            steady,
        }
    }

    pub(crate) async fn run(self) {
        let mut interval = self.warmup;
        loop {
            time::sleep(interval).await;
            interval = self.steady;

            match self.transport.block_number().await {
                Ok(block) => {
                    self.event_bus
                        .publish(SyncEvent::Chain(ChainEvent::BlockObserved { block }));
                }
                Err(error) => debug!("block number read failed: {error}"),
            }
        }
    }
}

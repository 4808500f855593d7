//! User-score refresh cycle.
//!
//! Polls the recorded top score for the active address. The first
//! successful read marks chain connectivity as confirmed and tightens the
//! interval; a failure keeps both the interval and the recorded state.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::warn;

use chain_core::{Address, ChainTransport, LedgerOperations, Score, TransportError};

use crate::events::{EventBus, SyncEvent, UserScoreEvent};
use crate::session::SessionContext;

pub(crate) struct UserScoreWorker {
    transport: Arc<dyn ChainTransport>,
    ops: Arc<dyn LedgerOperations>,
    ctx: Arc<SessionContext>,
    event_bus: EventBus,
    interval: Duration,
    synced_interval: Duration,
}

impl UserScoreWorker {
    pub(crate) fn new(
        transport: Arc<dyn ChainTransport>,
        ops: Arc<dyn LedgerOperations>,
        ctx: Arc<SessionContext>,
        event_bus: EventBus,
        interval: Duration,
        synced_interval: Duration,
    ) -> Self {
        Self {
            transport,
            ops,
            ctx,
            event_bus,
            interval,
            synced_interval,
        }
    }

    pub(crate) async fn run(self) {
        let mut interval = self.interval;
        loop {
            time::sleep(interval).await;

            let Some(address) = self.ctx.active_address() else {
                continue;
            };

            match self.read_user_score(address).await {
                Ok(score) => {
                    self.ctx.record_remote_score(score);
                    interval = self.synced_interval;
                    self.event_bus
                        .publish(SyncEvent::UserScore(UserScoreEvent::Updated {
                            address,
                            score,
                        }));
                }
                Err(error) => {
                    warn!("user score read failed for {address}: {error}");
                }
            }
        }
    }

    async fn read_user_score(&self, address: Address) -> Result<Score, TransportError> {
        let call = self.ops.user_score_read_call(address)?;
        let raw = self.transport.call(&call).await?;
        Ok(self.ops.decode_user_score(&raw)?)
    }
}

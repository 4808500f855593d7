//! Submission cycle.
//!
//! Consumes the pending game-over signal: at most one write may be in
//! flight at any time, enforced by the session context's exclusive slot.
//! Transport failures burn one of the signal's bounded attempts; a build
//! failure (unusable issuer key, bad argument) drops the signal outright
//! rather than ever sending something unsigned.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, error, info, warn};

use chain_core::{ChainTransport, LedgerOperations};

use crate::events::{EventBus, SubmissionEvent, SyncEvent};
use crate::session::SessionContext;

pub(crate) struct SubmissionWorker {
    transport: Arc<dyn ChainTransport>,
    ops: Arc<dyn LedgerOperations>,
    ctx: Arc<SessionContext>,
    event_bus: EventBus,
    interval: Duration,
}

impl SubmissionWorker {
    pub(crate) fn new(
        transport: Arc<dyn ChainTransport>,
        ops: Arc<dyn LedgerOperations>,
        ctx: Arc<SessionContext>,
        event_bus: EventBus,
        interval: Duration,
    ) -> Self {
        Self {
            transport,
            ops,
            ctx,
            event_bus,
            interval,
        }
    }

    pub(crate) async fn run(self) {
        loop {
            time::sleep(self.interval).await;
            self.try_submit_once().await;
        }
    }

    async fn try_submit_once(&self) {
        let Some(score) = self.ctx.pending_score() else {
            return;
        };

        let Some(claimant) = self.ctx.active_address() else {
            debug!("submission pending but no active address yet");
            return;
        };

        // The exclusive slot; a concurrent attempt means we skip this tick.
        if !self.ctx.begin_submission() {
            return;
        }

        self.event_bus
            .publish(SyncEvent::Submission(SubmissionEvent::Started {
                claimant,
                score,
            }));

        let payload = match self.ops.submit_write_transaction(claimant, score) {
            Ok(payload) => payload,
            Err(build_error) => {
                error!("cannot build score submission: {build_error}");
                self.ctx.abandon_submission();
                self.event_bus
                    .publish(SyncEvent::Submission(SubmissionEvent::Abandoned {
                        score,
                        reason: build_error.to_string(),
                    }));
                return;
            }
        };

        match self.transport.submit(&payload).await {
            Ok(tx_id) => {
                info!("top score {score} submitted, tx: {tx_id}");
                self.ctx.finish_submission_success();
                self.event_bus
                    .publish(SyncEvent::Submission(SubmissionEvent::Confirmed {
                        tx_id,
                        score,
                    }));
            }
            Err(error) => {
                let attempts_left = self.ctx.finish_submission_failure();
                warn!("score submission failed ({attempts_left} attempts left): {error}");
                self.event_bus
                    .publish(SyncEvent::Submission(SubmissionEvent::Failed {
                        score,
                        error: error.to_string(),
                        attempts_left,
                    }));
                if attempts_left == 0 {
                    self.event_bus
                        .publish(SyncEvent::Submission(SubmissionEvent::Abandoned {
                            score,
                            reason: "attempts exhausted".to_string(),
                        }));
                }
            }
        }
    }
}

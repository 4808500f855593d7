//! The sync orchestrator: owns the session context and the cycle tasks.
//!
//! Construction follows the builder pattern; `start` spawns one task per
//! cycle and returns the orchestrator, which aborts every task on shutdown
//! (and on drop) so a late network completion can never mutate state after
//! teardown. All interaction goes through [`SyncHandle`].

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

use chain_core::{Address, ChainTransport, IdentityProvider, LedgerOperations, Score};

use crate::config::SyncConfig;
use crate::events::{EventBus, SyncEvent, Topic};
use crate::session::SessionContext;
use crate::workers::{
    BlockWatchWorker, IdentityWorker, LeaderboardWorker, SubmissionWorker, UserScoreWorker,
};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("chain transport not configured")]
    MissingTransport,

    #[error("ledger operations not configured")]
    MissingOperations,

    #[error("identity provider not configured")]
    MissingIdentity,
}

/// Builder for [`SyncOrchestrator`].
pub struct SyncOrchestratorBuilder {
    transport: Option<Arc<dyn ChainTransport>>,
    ops: Option<Arc<dyn LedgerOperations>>,
    identity: Option<Arc<dyn IdentityProvider>>,
    config: SyncConfig,
}

impl SyncOrchestratorBuilder {
    pub fn transport(mut self, transport: Arc<dyn ChainTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn operations(mut self, ops: Arc<dyn LedgerOperations>) -> Self {
        self.ops = Some(ops);
        self
    }

    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawn every cycle and hand back the running orchestrator.
    pub fn start(self) -> Result<SyncOrchestrator, OrchestratorError> {
        let transport = self.transport.ok_or(OrchestratorError::MissingTransport)?;
        let ops = self.ops.ok_or(OrchestratorError::MissingOperations)?;
        let identity = self.identity.ok_or(OrchestratorError::MissingIdentity)?;
        let config = self.config;

        let ctx = Arc::new(SessionContext::new());
        let event_bus = EventBus::new();

        let leaderboard = LeaderboardWorker::new(
            Arc::clone(&transport),
            Arc::clone(&ops),
            event_bus.clone(),
            config.leaderboard_warmup,
            config.leaderboard_interval,
        );
        let user_score = UserScoreWorker::new(
            Arc::clone(&transport),
            Arc::clone(&ops),
            Arc::clone(&ctx),
            event_bus.clone(),
            config.user_score_interval,
            config.user_score_interval_synced,
        );
        let submission = SubmissionWorker::new(
            Arc::clone(&transport),
            Arc::clone(&ops),
            Arc::clone(&ctx),
            event_bus.clone(),
            config.submission_interval,
        );
        let identity_worker = IdentityWorker::new(
            identity,
            Arc::clone(&ctx),
            event_bus.clone(),
            config.identity_warmup,
            config.identity_interval,
        );
        let block_watch = BlockWatchWorker::new(
            Arc::clone(&transport),
            event_bus.clone(),
            config.block_warmup,
            config.block_interval,
        );

        let tasks = vec![
            tokio::spawn(leaderboard.run()),
            tokio::spawn(user_score.run()),
            tokio::spawn(submission.run()),
            tokio::spawn(identity_worker.run()),
            tokio::spawn(block_watch.run()),
        ];

        info!("sync orchestrator started");

        Ok(SyncOrchestrator {
            ctx,
            event_bus,
            tasks,
            max_submit_attempts: config.max_submit_attempts,
        })
    }
}

/// Running orchestration of the polling cycles.
pub struct SyncOrchestrator {
    ctx: Arc<SessionContext>,
    event_bus: EventBus,
    tasks: Vec<JoinHandle<()>>,
    max_submit_attempts: u32,
}

impl SyncOrchestrator {
    pub fn builder() -> SyncOrchestratorBuilder {
        SyncOrchestratorBuilder {
            transport: None,
            ops: None,
            identity: None,
            config: SyncConfig::default(),
        }
    }

    pub fn handle(&self) -> SyncHandle {
        SyncHandle {
            ctx: Arc::clone(&self.ctx),
            event_bus: self.event_bus.clone(),
            max_submit_attempts: self.max_submit_attempts,
        }
    }

    /// Cancel every cycle. Pending timers and in-flight waits are dropped
    /// at their next suspension point.
    pub fn shutdown(mut self) {
        self.abort_tasks();
        info!("sync orchestrator stopped");
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for SyncOrchestrator {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// Cloneable handle for the embedding game loop and UI.
#[derive(Clone)]
pub struct SyncHandle {
    ctx: Arc<SessionContext>,
    event_bus: EventBus,
    max_submit_attempts: u32,
}

impl SyncHandle {
    /// The external game-state signal: the run ended with `score`.
    ///
    /// Raises the submission signal only when the remote score is known and
    /// beaten (a session that never managed a read cannot claim a "new"
    /// top). Returns whether a submission is now pending for this score.
    pub fn report_game_over(&self, score: Score) -> bool {
        self.ctx.report_game_over(score, self.max_submit_attempts)
    }

    pub fn subscribe(&self, topic: Topic) -> tokio::sync::broadcast::Receiver<SyncEvent> {
        self.event_bus.subscribe(topic)
    }

    pub fn active_address(&self) -> Option<Address> {
        self.ctx.active_address()
    }

    /// `None` until the first successful user-score read.
    pub fn last_recorded_remote_score(&self) -> Option<Score> {
        self.ctx.remote_score()
    }

    pub fn submission_in_flight(&self) -> bool {
        self.ctx.submission_in_flight()
    }

    pub fn submission_pending(&self) -> bool {
        self.ctx.pending_score().is_some()
    }
}

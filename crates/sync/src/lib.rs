//! Polling orchestration that reconciles local game state with the ledger.
//!
//! This crate wires the chain-core trait boundaries into a set of
//! cooperative polling cycles: leaderboard refresh, user-score refresh,
//! score submission, identity resolution, and a block watch. Consumers embed
//! [`SyncOrchestrator`] to run the cycles and interact with them through
//! [`SyncHandle`].
//!
//! Modules are organized by responsibility:
//! - [`orchestrator`] hosts the orchestrator, builder, and handle
//! - [`session`] is the shared session context (no ambient globals)
//! - [`events`] provides the topic-based event bus cycles publish into
//! - [`view`] renders ledger state into display strings
//! - [`config`] carries the polling schedule and retry policy
//! - workers stay internal to the crate

pub mod config;
pub mod events;
pub mod orchestrator;
pub mod session;
pub mod view;

mod workers;

pub use config::SyncConfig;
pub use events::{
    ChainEvent, EventBus, IdentityEvent, LeaderboardEvent, SubmissionEvent, SyncEvent, Topic,
    UserScoreEvent,
};
pub use orchestrator::{OrchestratorError, SyncHandle, SyncOrchestrator, SyncOrchestratorBuilder};
pub use session::SessionContext;

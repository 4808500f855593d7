//! Topic-based event bus for the sync cycles.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

use chain_core::{Address, BlockNumber, Score, ScoreRecord, TransactionId};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Leaderboard refresh results
    Leaderboard,
    /// The active user's recorded score
    UserScore,
    /// Submission lifecycle
    Submission,
    /// Active address changes
    Identity,
    /// Chain connectivity observations
    Chain,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SyncEvent {
    Leaderboard(LeaderboardEvent),
    UserScore(UserScoreEvent),
    Submission(SubmissionEvent),
    Identity(IdentityEvent),
    Chain(ChainEvent),
}

impl SyncEvent {
    pub fn topic(&self) -> Topic {
        match self {
            SyncEvent::Leaderboard(_) => Topic::Leaderboard,
            SyncEvent::UserScore(_) => Topic::UserScore,
            SyncEvent::Submission(_) => Topic::Submission,
            SyncEvent::Identity(_) => Topic::Identity,
            SyncEvent::Chain(_) => Topic::Chain,
        }
    }
}

/// A complete leaderboard refresh. Partial passes never publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LeaderboardEvent {
    /// Records are sorted non-increasing by score, stable on ties.
    Refreshed { records: Vec<ScoreRecord> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UserScoreEvent {
    /// A successful user-score read for the active address.
    Updated { address: Address, score: Score },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SubmissionEvent {
    /// The cycle claimed the slot and is building/sending the transaction.
    Started { claimant: Address, score: Score },

    /// The node accepted the transaction.
    Confirmed {
        tx_id: TransactionId,
        score: Score,
    },

    /// A transport failure; the signal stays pending while attempts remain.
    Failed {
        score: Score,
        error: String,
        attempts_left: u32,
    },

    /// The signal was dropped; a fresh game-over trigger is required.
    Abandoned { score: Score, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IdentityEvent {
    /// The active address changed (including to absent).
    AddressChanged { address: Option<Address> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChainEvent {
    BlockObserved { block: BlockNumber },
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about.
pub struct EventBus {
    channels: Arc<RwLock<HashMap<Topic, broadcast::Sender<SyncEvent>>>>,
}

const TOPICS: [Topic; 5] = [
    Topic::Leaderboard,
    Topic::UserScore,
    Topic::Submission,
    Topic::Identity,
    Topic::Chain,
];

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let mut channels = HashMap::new();
        for topic in TOPICS {
            channels.insert(topic, broadcast::channel(capacity).0);
        }
        Self {
            channels: Arc::new(RwLock::new(channels)),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: SyncEvent) {
        let topic = event.topic();

        // Use try_read to avoid blocking in async context; events are
        // best-effort and a closed topic just means no subscribers.
        match self.channels.try_read() {
            Ok(channels) => {
                if let Some(tx) = channels.get(&topic)
                    && tx.send(event).is_err()
                {
                    tracing::trace!("no subscribers for topic {:?}", topic);
                }
            }
            Err(_) => {
                tracing::debug!("failed to acquire event bus lock for topic {:?}", topic);
            }
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<SyncEvent> {
        let channels = self
            .channels
            .try_read()
            .expect("failed to acquire read lock on event channels");
        channels
            .get(&topic)
            .expect("topic channel not initialized")
            .subscribe()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_route_to_their_topic_only() {
        let bus = EventBus::new();
        let mut chain_rx = bus.subscribe(Topic::Chain);
        let mut identity_rx = bus.subscribe(Topic::Identity);

        bus.publish(SyncEvent::Chain(ChainEvent::BlockObserved {
            block: BlockNumber(7),
        }));

        let event = chain_rx.recv().await.unwrap();
        assert!(matches!(
            event,
            SyncEvent::Chain(ChainEvent::BlockObserved {
                block: BlockNumber(7)
            })
        ));
        assert!(identity_rx.try_recv().is_err());
    }
}

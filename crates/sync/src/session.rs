//! Shared session state for one sync session.
//!
//! The context is created when the orchestrator starts and dropped when it
//! shuts down; nothing persists across sessions. Each field has exactly one
//! writing cycle:
//! - `active_address` — identity cycle (read by the others)
//! - `remote_score` — user-score cycle
//! - `local_top_score` and the pending signal — the game-over signal raises,
//!   the submission cycle consumes
//! - the in-flight flag — submission cycle only, guarded by compare-exchange
//!   so a second submission can never start while one is outstanding

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chain_core::{Address, Score};

#[derive(Clone, Copy, Debug)]
struct PendingSubmission {
    score: Score,
    attempts_remaining: u32,
}

/// Session-wide state shared by the polling cycles.
#[derive(Debug, Default)]
pub struct SessionContext {
    active_address: Mutex<Option<Address>>,
    local_top_score: Mutex<Score>,
    /// `None` until the first successful user-score read.
    remote_score: Mutex<Option<Score>>,
    pending: Mutex<Option<PendingSubmission>>,
    in_flight: AtomicBool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_address(&self) -> Option<Address> {
        *self.active_address.lock().unwrap()
    }

    /// Record the identity cycle's latest observation. Returns true when the
    /// address actually changed.
    pub fn set_active_address(&self, address: Option<Address>) -> bool {
        let mut current = self.active_address.lock().unwrap();
        let changed = *current != address;
        *current = address;
        changed
    }

    /// The last score successfully read back for the active address, or
    /// `None` before the first successful read.
    pub fn remote_score(&self) -> Option<Score> {
        *self.remote_score.lock().unwrap()
    }

    pub fn record_remote_score(&self, score: Score) {
        *self.remote_score.lock().unwrap() = Some(score);
    }

    pub fn local_top_score(&self) -> Score {
        *self.local_top_score.lock().unwrap()
    }

    /// The game-over signal. Raises the submission signal only when the
    /// remote score has been observed at least once and `score` beats it; a
    /// signal that is already pending is only ever replaced by a higher
    /// score. Returns whether the signal is now pending for `score`.
    pub fn report_game_over(&self, score: Score, max_attempts: u32) -> bool {
        match self.remote_score() {
            Some(remote) if score > remote => {}
            _ => return false,
        }

        *self.local_top_score.lock().unwrap() = score;

        let mut pending = self.pending.lock().unwrap();
        match *pending {
            Some(existing) if existing.score >= score => false,
            _ => {
                *pending = Some(PendingSubmission {
                    score,
                    attempts_remaining: max_attempts.max(1),
                });
                true
            }
        }
    }

    /// The score waiting to be submitted, if any.
    pub fn pending_score(&self) -> Option<Score> {
        self.pending.lock().unwrap().map(|p| p.score)
    }

    /// Claim the exclusive submission slot. Fails when another attempt is
    /// already in flight.
    pub fn begin_submission(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// A submission was confirmed: consume the signal, release the slot.
    pub fn finish_submission_success(&self) {
        *self.pending.lock().unwrap() = None;
        self.in_flight.store(false, Ordering::Release);
    }

    /// A submission attempt failed at the transport. Burns one attempt,
    /// clears the signal when none remain, and releases the slot. Returns
    /// the attempts still available for this signal.
    pub fn finish_submission_failure(&self) -> u32 {
        let mut pending = self.pending.lock().unwrap();
        let remaining = match pending.as_mut() {
            Some(p) => {
                p.attempts_remaining = p.attempts_remaining.saturating_sub(1);
                p.attempts_remaining
            }
            None => 0,
        };
        if remaining == 0 {
            *pending = None;
        }
        drop(pending);
        self.in_flight.store(false, Ordering::Release);
        remaining
    }

    /// The attempt cannot proceed at all (e.g. an unusable issuer key):
    /// drop the signal and release the slot.
    pub fn abandon_submission(&self) {
        *self.pending.lock().unwrap() = None;
        self.in_flight.store(false, Ordering::Release);
    }

    pub fn submission_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

//! Polling schedule and submission retry policy.

use std::env;
use std::time::Duration;

/// Intervals for the polling cycles and the bounded submission retry policy.
///
/// Every cycle takes one short warm-up tick so a freshly started session
/// renders quickly, then settles into its steady interval. Intervals trade
/// freshness for node load.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Steady leaderboard refresh interval, entered after the first
    /// successful full pass.
    pub leaderboard_interval: Duration,
    /// Leaderboard interval until the first successful pass.
    pub leaderboard_warmup: Duration,

    /// User-score poll interval before chain connectivity is confirmed.
    pub user_score_interval: Duration,
    /// Tightened user-score interval after the first successful read.
    pub user_score_interval_synced: Duration,

    /// How often the submission cycle checks for a pending signal.
    pub submission_interval: Duration,

    /// Steady external-identity poll interval.
    pub identity_interval: Duration,
    /// First identity tick.
    pub identity_warmup: Duration,

    /// Steady block watch interval.
    pub block_interval: Duration,
    /// First block watch tick.
    pub block_warmup: Duration,

    /// Transport attempts allowed per pending signal before it is dropped
    /// and a fresh game-over trigger is required.
    pub max_submit_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            leaderboard_interval: Duration::from_secs(20),
            leaderboard_warmup: Duration::from_secs(1),
            user_score_interval: Duration::from_secs(5),
            user_score_interval_synced: Duration::from_secs(3),
            submission_interval: Duration::from_secs(4),
            identity_interval: Duration::from_secs(20),
            identity_warmup: Duration::from_secs(2),
            block_interval: Duration::from_secs(10),
            block_warmup: Duration::from_secs(1),
            max_submit_attempts: 3,
        }
    }
}

impl SyncConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables (all optional):
    /// - `LEADERBOARD_INTERVAL_SECS` - Steady leaderboard refresh (default: 20)
    /// - `USER_SCORE_INTERVAL_SECS` - User-score poll (default: 5)
    /// - `SUBMISSION_INTERVAL_SECS` - Submission check (default: 4)
    /// - `IDENTITY_INTERVAL_SECS` - External identity poll (default: 20)
    /// - `BLOCK_INTERVAL_SECS` - Block watch (default: 10)
    /// - `MAX_SUBMIT_ATTEMPTS` - Attempts per pending signal (default: 3)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = read_env::<u64>("LEADERBOARD_INTERVAL_SECS") {
            config.leaderboard_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = read_env::<u64>("USER_SCORE_INTERVAL_SECS") {
            config.user_score_interval = Duration::from_secs(secs.max(1));
            // The synced interval tightens polling; never let it exceed the base.
            config.user_score_interval_synced = config
                .user_score_interval_synced
                .min(config.user_score_interval);
        }
        if let Some(secs) = read_env::<u64>("SUBMISSION_INTERVAL_SECS") {
            config.submission_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = read_env::<u64>("IDENTITY_INTERVAL_SECS") {
            config.identity_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = read_env::<u64>("BLOCK_INTERVAL_SECS") {
            config.block_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(attempts) = read_env::<u32>("MAX_SUBMIT_ATTEMPTS") {
            config.max_submit_attempts = attempts.max(1);
        }

        config
    }

    /// Uniformly fast schedule for tests.
    pub fn fast(interval: Duration) -> Self {
        Self {
            leaderboard_interval: interval,
            leaderboard_warmup: interval,
            user_score_interval: interval,
            user_score_interval_synced: interval,
            submission_interval: interval,
            identity_interval: interval,
            identity_warmup: interval,
            block_interval: interval,
            block_warmup: interval,
            max_submit_attempts: 3,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

//! End-to-end cycle tests against the mock transport and the real ledger
//! operation builder.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::timeout;

use chain_core::{
    Address, IdentityProvider, MockChainTransport, Score, ScoreRecord, TransportError,
};
use chain_eth::abi::{self, AbiValue};
use chain_eth::{LocalKeyIdentity, PrivateKey, ScoreLedger};
use score_sync::{
    ChainEvent, LeaderboardEvent, SubmissionEvent, SyncConfig, SyncEvent, SyncHandle,
    SyncOrchestrator, Topic, UserScoreEvent,
};

const COUNT_SIG: &str = "getCountTopScores()";
const SCORE_AT_SIG: &str = "topScores(uint256)";
const USER_SCORE_SIG: &str = "userTopScores(address)";

fn issuer_key() -> PrivateKey {
    let mut bytes = [0u8; 32];
    bytes[31] = 0x42;
    PrivateKey::from_bytes(&bytes).unwrap()
}

fn player() -> Address {
    Address::from_bytes([0x11; 20])
}

fn count_bytes(count: u64) -> Vec<u8> {
    abi::encode_word(&AbiValue::Uint {
        value: count,
        bits: 256,
    })
    .unwrap()
    .to_vec()
}

fn record_bytes(owner: Address, score: i64) -> Vec<u8> {
    let mut bytes = abi::encode_word(&AbiValue::Address(owner)).unwrap().to_vec();
    bytes.extend_from_slice(&abi::encode_word(&AbiValue::Int {
        value: score,
        bits: 256,
    })
    .unwrap());
    bytes
}

fn score_bytes(score: i64) -> Vec<u8> {
    abi::encode_word(&AbiValue::Int {
        value: score,
        bits: 256,
    })
    .unwrap()
    .to_vec()
}

/// Identity provider whose exposed account can be flipped mid-test, like a
/// wallet the user connects and disconnects.
struct SwitchableIdentity {
    address: Mutex<Option<Address>>,
}

impl SwitchableIdentity {
    fn new(address: Option<Address>) -> Arc<Self> {
        Arc::new(Self {
            address: Mutex::new(address),
        })
    }

    fn set(&self, address: Option<Address>) {
        *self.address.lock().unwrap() = address;
    }
}

#[async_trait]
impl IdentityProvider for SwitchableIdentity {
    async fn current_address(&self) -> Result<Option<Address>, TransportError> {
        Ok(*self.address.lock().unwrap())
    }

    fn is_static(&self) -> bool {
        false
    }
}

fn start_orchestrator(
    transport: &MockChainTransport,
    identity: Arc<dyn IdentityProvider>,
    gas_limit: u64,
    config: SyncConfig,
) -> (SyncOrchestrator, SyncHandle) {
    let key = issuer_key();
    let ledger = ScoreLedger::new(Address::from_bytes([0xC0; 20]), key.address(), key, gas_limit);
    let orchestrator = SyncOrchestrator::builder()
        .transport(Arc::new(transport.clone()))
        .operations(Arc::new(ledger))
        .identity(identity)
        .config(config)
        .start()
        .unwrap();
    let handle = orchestrator.handle();
    (orchestrator, handle)
}

async fn next_event(rx: &mut broadcast::Receiver<SyncEvent>) -> SyncEvent {
    timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event bus closed")
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for condition"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn fast_config() -> SyncConfig {
    SyncConfig::fast(Duration::from_millis(20))
}

#[tokio::test]
async fn leaderboard_refresh_reads_in_order_and_renders_descending() {
    let transport = MockChainTransport::new();
    transport.enqueue_call_response(&abi::selector(COUNT_SIG), count_bytes(2));
    transport.enqueue_call_response(
        &abi::selector(SCORE_AT_SIG),
        record_bytes(Address::from_bytes([0xAA; 20]), 10),
    );
    transport.enqueue_call_response(
        &abi::selector(SCORE_AT_SIG),
        record_bytes(Address::from_bytes([0xBB; 20]), 25),
    );

    let (_orchestrator, handle) = start_orchestrator(
        &transport,
        SwitchableIdentity::new(None),
        4_712_388,
        fast_config(),
    );
    let mut rx = handle.subscribe(Topic::Leaderboard);

    let SyncEvent::Leaderboard(LeaderboardEvent::Refreshed { records }) = next_event(&mut rx).await
    else {
        panic!("expected a leaderboard event");
    };

    assert_eq!(records, vec![
        ScoreRecord {
            owner: Address::from_bytes([0xBB; 20]),
            score: Score(25),
        },
        ScoreRecord {
            owner: Address::from_bytes([0xAA; 20]),
            score: Score(10),
        },
    ]);

    // Record reads were issued for indices 0..count in increasing order.
    let selector = abi::selector(SCORE_AT_SIG);
    let indices: Vec<u8> = transport
        .recorded_calls()
        .iter()
        .filter(|call| call.data.starts_with(&selector))
        .map(|call| *call.data.last().unwrap())
        .collect();
    assert_eq!(indices, vec![0, 1]);
}

#[tokio::test]
async fn failed_refresh_pass_publishes_nothing_partial() {
    let transport = MockChainTransport::new();
    // First pass: count says two rows, the second row read fails.
    transport.enqueue_call_response(&abi::selector(COUNT_SIG), count_bytes(2));
    transport.enqueue_call_response(
        &abi::selector(SCORE_AT_SIG),
        record_bytes(Address::from_bytes([0xAA; 20]), 10),
    );
    transport.enqueue_call_failure(&abi::selector(SCORE_AT_SIG), "node hiccup");
    // Second pass: both rows land, with distinguishable scores.
    transport.enqueue_call_response(&abi::selector(COUNT_SIG), count_bytes(2));
    transport.enqueue_call_response(
        &abi::selector(SCORE_AT_SIG),
        record_bytes(Address::from_bytes([0xAA; 20]), 11),
    );
    transport.enqueue_call_response(
        &abi::selector(SCORE_AT_SIG),
        record_bytes(Address::from_bytes([0xBB; 20]), 26),
    );

    let (_orchestrator, handle) = start_orchestrator(
        &transport,
        SwitchableIdentity::new(None),
        4_712_388,
        fast_config(),
    );
    let mut rx = handle.subscribe(Topic::Leaderboard);

    // The first published leaderboard is the complete second pass; the
    // failed pass left no partial render behind.
    let SyncEvent::Leaderboard(LeaderboardEvent::Refreshed { records }) = next_event(&mut rx).await
    else {
        panic!("expected a leaderboard event");
    };
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].score, Score(26));
    assert_eq!(records[1].score, Score(11));
}

#[tokio::test]
async fn user_score_read_of_unknown_address_lands_zero_not_unknown() {
    let transport = MockChainTransport::new();
    transport.enqueue_call_response(&abi::selector(USER_SCORE_SIG), score_bytes(0));

    let (_orchestrator, handle) = start_orchestrator(
        &transport,
        SwitchableIdentity::new(Some(player())),
        4_712_388,
        fast_config(),
    );
    let mut rx = handle.subscribe(Topic::UserScore);

    let SyncEvent::UserScore(UserScoreEvent::Updated { address, score }) =
        next_event(&mut rx).await
    else {
        panic!("expected a user score event");
    };
    assert_eq!(address, player());
    assert_eq!(score, Score::ZERO);
    assert_eq!(handle.last_recorded_remote_score(), Some(Score::ZERO));
}

#[tokio::test]
async fn pending_submission_waits_for_an_address() {
    let transport = MockChainTransport::new();
    transport.enqueue_call_response(&abi::selector(USER_SCORE_SIG), score_bytes(0));

    let identity = SwitchableIdentity::new(Some(player()));
    let (_orchestrator, handle) =
        start_orchestrator(&transport, identity.clone(), 4_712_388, fast_config());

    wait_until(|| handle.last_recorded_remote_score().is_some()).await;

    // The wallet disconnects before the run ends.
    identity.set(None);
    wait_until(|| handle.active_address().is_none()).await;

    assert!(handle.report_game_over(Score(42)));
    assert!(handle.submission_pending());

    // Several submission ticks pass without an address: nothing is sent.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(transport.recorded_submissions().is_empty());
    assert!(handle.submission_pending());

    // The wallet comes back; exactly one submission goes out.
    let mut rx = handle.subscribe(Topic::Submission);
    identity.set(Some(player()));
    wait_until(|| !transport.recorded_submissions().is_empty()).await;

    loop {
        if let SyncEvent::Submission(SubmissionEvent::Confirmed { score, .. }) =
            next_event(&mut rx).await
        {
            assert_eq!(score, Score(42));
            break;
        }
    }
    assert_eq!(transport.recorded_submissions().len(), 1);
    assert!(!handle.submission_pending());
}

#[tokio::test]
async fn failed_submission_releases_the_slot_and_retries_bounded() {
    let transport = MockChainTransport::new();
    transport.enqueue_call_response(&abi::selector(USER_SCORE_SIG), score_bytes(0));
    transport.enqueue_submit_failure("nonce too low");

    let identity = SwitchableIdentity::new(Some(player()));
    let (_orchestrator, handle) =
        start_orchestrator(&transport, identity, 4_712_388, fast_config());

    wait_until(|| handle.last_recorded_remote_score().is_some()).await;
    let mut rx = handle.subscribe(Topic::Submission);
    assert!(handle.report_game_over(Score(42)));

    // First attempt fails, the in-flight flag is released, and the same
    // pending signal earns another attempt which succeeds.
    let mut saw_failure = false;
    loop {
        match next_event(&mut rx).await {
            SyncEvent::Submission(SubmissionEvent::Failed {
                attempts_left,
                score,
                ..
            }) => {
                assert_eq!(score, Score(42));
                assert_eq!(attempts_left, 2);
                assert!(!handle.submission_in_flight());
                saw_failure = true;
            }
            SyncEvent::Submission(SubmissionEvent::Confirmed { score, .. }) => {
                assert_eq!(score, Score(42));
                break;
            }
            _ => {}
        }
    }
    assert!(saw_failure);
    assert_eq!(transport.recorded_submissions().len(), 2);
    assert!(!handle.submission_pending());
}

#[tokio::test]
async fn exhausted_attempts_require_a_fresh_trigger() {
    let transport = MockChainTransport::new();
    transport.enqueue_call_response(&abi::selector(USER_SCORE_SIG), score_bytes(0));
    transport.enqueue_submit_failure("node unreachable");

    let mut config = fast_config();
    config.max_submit_attempts = 1;

    let identity = SwitchableIdentity::new(Some(player()));
    let (_orchestrator, handle) = start_orchestrator(&transport, identity, 4_712_388, config);

    wait_until(|| handle.last_recorded_remote_score().is_some()).await;
    let mut rx = handle.subscribe(Topic::Submission);
    assert!(handle.report_game_over(Score(42)));

    loop {
        if let SyncEvent::Submission(SubmissionEvent::Abandoned { score, .. }) =
            next_event(&mut rx).await
        {
            assert_eq!(score, Score(42));
            break;
        }
    }
    assert!(!handle.submission_pending());

    // No silent retry storm: the signal is spent.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(transport.recorded_submissions().len(), 1);

    // A fresh external trigger is still eligible and succeeds this time.
    assert!(handle.report_game_over(Score(42)));
    wait_until(|| transport.recorded_submissions().len() == 2).await;
}

#[tokio::test]
async fn submissions_never_overlap() {
    let transport =
        MockChainTransport::new().with_submit_delay(Duration::from_millis(300));
    transport.enqueue_call_response(&abi::selector(USER_SCORE_SIG), score_bytes(0));

    let identity = SwitchableIdentity::new(Some(player()));
    let (_orchestrator, handle) =
        start_orchestrator(&transport, identity, 4_712_388, fast_config());

    wait_until(|| handle.last_recorded_remote_score().is_some()).await;
    let mut rx = handle.subscribe(Topic::Submission);
    assert!(handle.report_game_over(Score(42)));

    loop {
        if let SyncEvent::Submission(SubmissionEvent::Confirmed { .. }) = next_event(&mut rx).await
        {
            break;
        }
    }

    // Many submission ticks elapsed while the first attempt was in flight;
    // none of them started a second attempt.
    assert_eq!(transport.max_submits_in_flight(), 1);
    assert_eq!(transport.recorded_submissions().len(), 1);
}

#[tokio::test]
async fn unbuildable_submission_never_reaches_the_transport() {
    let transport = MockChainTransport::new();
    transport.enqueue_call_response(&abi::selector(USER_SCORE_SIG), score_bytes(0));

    // Zero gas makes the payload builder reject before any network call.
    let identity = SwitchableIdentity::new(Some(player()));
    let (_orchestrator, handle) = start_orchestrator(&transport, identity, 0, fast_config());

    wait_until(|| handle.last_recorded_remote_score().is_some()).await;
    let mut rx = handle.subscribe(Topic::Submission);
    assert!(handle.report_game_over(Score(42)));

    loop {
        if let SyncEvent::Submission(SubmissionEvent::Abandoned { reason, .. }) =
            next_event(&mut rx).await
        {
            assert!(reason.contains("gas"));
            break;
        }
    }
    assert!(transport.recorded_submissions().is_empty());
    assert!(!handle.submission_pending());
    assert!(!handle.submission_in_flight());
}

#[tokio::test]
async fn game_over_is_ignored_until_the_remote_score_is_known() {
    let transport = MockChainTransport::new();
    // No scripted user-score response: the remote score stays unknown.
    let identity = SwitchableIdentity::new(Some(player()));
    let (_orchestrator, handle) =
        start_orchestrator(&transport, identity, 4_712_388, fast_config());

    assert!(!handle.report_game_over(Score(42)));
    assert!(!handle.submission_pending());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(transport.recorded_submissions().is_empty());
}

#[tokio::test]
async fn block_watch_reports_chain_height() {
    let transport = MockChainTransport::new();
    transport.set_block_number(1207);

    let (_orchestrator, handle) = start_orchestrator(
        &transport,
        SwitchableIdentity::new(None),
        4_712_388,
        fast_config(),
    );
    let mut rx = handle.subscribe(Topic::Chain);

    let SyncEvent::Chain(ChainEvent::BlockObserved { block }) = next_event(&mut rx).await else {
        panic!("expected a chain event");
    };
    assert_eq!(block.0, 1207);
}

#[tokio::test]
async fn static_identity_resolves_once_at_start() {
    let transport = MockChainTransport::new();
    let key = issuer_key();
    let identity = Arc::new(LocalKeyIdentity::new(&key));

    let (_orchestrator, handle) =
        start_orchestrator(&transport, identity, 4_712_388, fast_config());

    wait_until(|| handle.active_address() == Some(key.address())).await;
}

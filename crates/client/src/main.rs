//! Headless score client entry point.
//!
//! Wires the Ethereum transport, the ledger operation builder, and a
//! local-key identity into the sync orchestrator, then renders every event
//! topic to stdout until interrupted. The local signing path is the only
//! one a standalone binary can offer; embedders with an injected wallet
//! construct the orchestrator themselves with an external submit path.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, warn};

use chain_core::Score;
use chain_eth::{EthConfig, LocalKeyIdentity, PrivateKey, RpcTransport, ScoreLedger, SubmitPath};
use score_sync::{
    ChainEvent, IdentityEvent, LeaderboardEvent, SubmissionEvent, SyncConfig, SyncEvent,
    SyncHandle, SyncOrchestrator, Topic, UserScoreEvent, view,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let eth_config = EthConfig::from_env().map_err(|e| anyhow!(e))?;
    eth_config.validate().map_err(|e| anyhow!(e))?;
    let sync_config = SyncConfig::from_env();

    let issuer_key =
        PrivateKey::from_hex(&eth_config.issuer_private_key).context("issuer private key")?;
    if issuer_key.address() != eth_config.issuer_address {
        warn!(
            "issuer key derives {} but ISSUER_ADDRESS is {}",
            issuer_key.address(),
            eth_config.issuer_address
        );
    }

    let Some(raw_player_key) = eth_config.player_private_key.as_deref() else {
        bail!("PLAYER_PRIVATE_KEY is required for the local signing path");
    };
    let player_key = PrivateKey::from_hex(raw_player_key).context("player private key")?;

    let transport = Arc::new(RpcTransport::new(
        eth_config.node_url.clone(),
        eth_config.chain_id,
        SubmitPath::LocalKey(player_key.clone()),
    )?);
    let ledger = Arc::new(ScoreLedger::new(
        eth_config.contract_address,
        eth_config.issuer_address,
        issuer_key,
        eth_config.gas_limit,
    ));
    let identity = Arc::new(LocalKeyIdentity::new(&player_key));

    info!(
        "connecting to {} as {}",
        eth_config.node_url,
        player_key.address()
    );

    let orchestrator = SyncOrchestrator::builder()
        .transport(transport)
        .operations(ledger)
        .identity(identity)
        .config(sync_config)
        .start()?;
    let handle = orchestrator.handle();

    // Optional one-shot trigger: report SUBMIT_SCORE as the finished run's
    // score once the remote score has been read back.
    if let Some(score) = std::env::var("SUBMIT_SCORE")
        .ok()
        .and_then(|raw| raw.parse::<i64>().ok())
    {
        tokio::spawn(report_when_synced(handle.clone(), Score(score)));
    }

    render_events(handle).await;

    orchestrator.shutdown();
    Ok(())
}

async fn report_when_synced(handle: SyncHandle, score: Score) {
    while handle.last_recorded_remote_score().is_none() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    if handle.report_game_over(score) {
        info!("game over reported with score {score}");
    } else {
        info!("score {score} does not beat the recorded top, not submitting");
    }
}

/// Print each topic's display line as events arrive, until ctrl-c.
async fn render_events(handle: SyncHandle) {
    let mut leaderboard = handle.subscribe(Topic::Leaderboard);
    let mut user_score = handle.subscribe(Topic::UserScore);
    let mut submission = handle.subscribe(Topic::Submission);
    let mut identity = handle.subscribe(Topic::Identity);
    let mut chain = handle.subscribe(Topic::Chain);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            event = leaderboard.recv() => {
                if let Ok(SyncEvent::Leaderboard(LeaderboardEvent::Refreshed { records })) = event {
                    println!("{}", view::format_leaderboard(&records));
                }
            }
            event = user_score.recv() => {
                if let Ok(SyncEvent::UserScore(UserScoreEvent::Updated { score, .. })) = event {
                    println!("{}", view::format_user_score(score));
                }
            }
            event = submission.recv() => {
                if let Ok(SyncEvent::Submission(submission_event)) = event {
                    match submission_event {
                        SubmissionEvent::Started { score, .. } => {
                            println!("Submitting top score {score}");
                        }
                        SubmissionEvent::Confirmed { tx_id, score } => {
                            println!("Top score {score} submitted, tx: {tx_id}");
                        }
                        SubmissionEvent::Failed { error, attempts_left, .. } => {
                            println!("Submission failed ({attempts_left} attempts left): {error}");
                        }
                        SubmissionEvent::Abandoned { score, reason } => {
                            println!("Submission of {score} abandoned: {reason}");
                        }
                    }
                }
            }
            event = identity.recv() => {
                if let Ok(SyncEvent::Identity(IdentityEvent::AddressChanged { address })) = event {
                    println!("Account: {}", view::format_identity(address.as_ref()));
                }
            }
            event = chain.recv() => {
                if let Ok(SyncEvent::Chain(ChainEvent::BlockObserved { block })) = event {
                    println!("{}", view::format_block(block));
                }
            }
        }
    }
}

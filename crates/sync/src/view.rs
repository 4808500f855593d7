//! Display-string rendering for ledger state.
//!
//! Formatting only; binding the strings to an actual UI is the embedder's
//! concern.

use chain_core::{Address, BlockNumber, Score, ScoreRecord};

/// Truncated address form used in leaderboard rows: the first 15 characters
/// of the hex form, then an ellipsis.
pub fn shorten_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...", &full[..15])
}

/// Render a refreshed leaderboard. Expects records already sorted
/// non-increasing by score.
pub fn format_leaderboard(records: &[ScoreRecord]) -> String {
    let mut text = String::from("Top Scores\n");
    for record in records {
        text.push_str(&format!(
            "{}-{}\n",
            record.score,
            shorten_address(&record.owner)
        ));
    }
    text
}

pub fn format_user_score(score: Score) -> String {
    format!("Your top: {score}")
}

pub fn format_block(block: BlockNumber) -> String {
    format!("Block: {block}")
}

/// The identity line is the full address, or empty while no account is
/// exposed.
pub fn format_identity(address: Option<&Address>) -> String {
    address.map(Address::to_string).unwrap_or_default()
}

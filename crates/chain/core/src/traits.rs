//! Trait boundaries between the sync orchestration and a concrete chain.
//!
//! The orchestrator only ever talks to these traits; the Ethereum binding
//! implements them, and tests substitute [`crate::MockChainTransport`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{BuildError, CodecError, TransportError};
use crate::types::{
    Address, BlockNumber, CallPayload, Score, ScoreRecord, TransactionId, TransactionPayload,
};

/// Low-level ledger access: read calls and state-mutating submissions.
///
/// `call` executes against the latest block and returns the raw return bytes;
/// `submit` hands a fully built transaction to whichever signing path the
/// transport was configured with (local key or external signer) and returns
/// the node-assigned transaction id. Both argument encodings must be
/// bit-exact for the remote node to accept them.
#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// Execute a read-only call at the latest block.
    async fn call(&self, payload: &CallPayload) -> Result<Vec<u8>, TransportError>;

    /// Sign (or delegate signing of) and broadcast a transaction.
    async fn submit(&self, payload: &TransactionPayload) -> Result<TransactionId, TransportError>;

    /// Current chain height, for connectivity display.
    async fn block_number(&self) -> Result<BlockNumber, TransportError>;
}

/// The fixed operation set of the score ledger contract, with issuer
/// credentials and gas policy bound once at configuration time.
///
/// Payload construction is pure: nothing here touches the network, so an
/// `InvalidArgument` or `InvalidKey` surfaces before any call is attempted.
pub trait LedgerOperations: Send + Sync {
    /// Read the number of rows in the ranked score list.
    fn count_read_call(&self) -> CallPayload;

    /// Read the ranked-list row at `index`.
    fn score_at_index_read_call(&self, index: u64) -> Result<CallPayload, CodecError>;

    /// Read the recorded top score of `user`.
    fn user_score_read_call(&self, user: Address) -> Result<CallPayload, CodecError>;

    /// Build the score-submission transaction: digest the claim, sign it
    /// with the issuer key, and encode `(score, v, r, s)` as arguments.
    /// The sender is `claimant`; the issuer key itself never enters the
    /// payload.
    fn submit_write_transaction(
        &self,
        claimant: Address,
        score: Score,
    ) -> Result<TransactionPayload, BuildError>;

    fn decode_count(&self, bytes: &[u8]) -> Result<u64, CodecError>;

    fn decode_score_record(&self, bytes: &[u8]) -> Result<ScoreRecord, CodecError>;

    fn decode_user_score(&self, bytes: &[u8]) -> Result<Score, CodecError>;
}

/// Source of the acting address.
///
/// Either an external wallet polled on a timer (the address can change or
/// disappear between polls) or a locally configured key resolved once.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The currently active address, or `None` when no account is exposed.
    async fn current_address(&self) -> Result<Option<Address>, TransportError>;

    /// True when the address never changes after the first resolution, in
    /// which case the identity cycle resolves once and stops polling.
    fn is_static(&self) -> bool;
}

/// A wallet injected by the embedding environment.
///
/// Mirrors the two-function surface a browser wallet exposes: report the
/// selected account, and sign-and-send a prepared transaction. An empty
/// account selection is reported as `None`.
#[async_trait]
pub trait ExternalSigner: Send + Sync {
    /// The account the external wallet currently exposes, if any.
    async fn current_address(&self) -> Result<Option<Address>, TransportError>;

    /// Hand the prepared transaction to the wallet for signing and broadcast.
    async fn send_transaction(
        &self,
        payload: &TransactionPayload,
    ) -> Result<TransactionId, TransportError>;
}

/// [`IdentityProvider`] backed by an injected external wallet.
pub struct ExternalSignerIdentity {
    signer: Arc<dyn ExternalSigner>,
}

impl ExternalSignerIdentity {
    pub fn new(signer: Arc<dyn ExternalSigner>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl IdentityProvider for ExternalSignerIdentity {
    async fn current_address(&self) -> Result<Option<Address>, TransportError> {
        self.signer.current_address().await
    }

    fn is_static(&self) -> bool {
        false
    }
}

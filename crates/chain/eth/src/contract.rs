//! The score ledger contract's fixed operation set.
//!
//! Four operations, each with a frozen signature:
//! - `getCountTopScores()` — number of ranked rows
//! - `topScores(uint256)` — ranked row at an index: `(address, int256)`
//! - `userTopScores(address)` — a user's recorded top score: `int256`
//! - `setTopScore(int256,uint8,bytes32,bytes32)` — write a new top score,
//!   authorized by the issuer signature carried in the arguments
//!
//! The write path computes `keccak256(claimant ‖ issuer ‖ int256(score))`,
//! signs it with the issuer key, and embeds only the signature components.
//! The issuer key never enters a payload.

use chain_core::{
    Address, BuildError, CallPayload, CodecError, LedgerOperations, Score, ScoreRecord,
    SignedScoreClaim, TransactionPayload,
};

use crate::abi::{self, AbiValue};
use crate::decode;
use crate::signer::{self, PrivateKey};

const SIG_COUNT: &str = "getCountTopScores()";
const SIG_SCORE_AT: &str = "topScores(uint256)";
const SIG_USER_SCORE: &str = "userTopScores(address)";
const SIG_SET_SCORE: &str = "setTopScore(int256,uint8,bytes32,bytes32)";

/// Operation builder for one deployed score ledger contract, with the
/// issuer credentials and gas policy bound at construction.
pub struct ScoreLedger {
    contract: Address,
    issuer: Address,
    issuer_key: PrivateKey,
    gas_limit: u64,
}

impl ScoreLedger {
    pub fn new(
        contract: Address,
        issuer: Address,
        issuer_key: PrivateKey,
        gas_limit: u64,
    ) -> Self {
        Self {
            contract,
            issuer,
            issuer_key,
            gas_limit,
        }
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    /// Digest binding a claim triple: `keccak256(claimant ‖ issuer ‖
    /// int256(score))`.
    pub fn claim_digest(
        claimant: Address,
        issuer: Address,
        score: Score,
    ) -> Result<[u8; 32], CodecError> {
        let score_word = abi::encode_word(&AbiValue::Int {
            value: score.value(),
            bits: 256,
        })?;
        Ok(signer::digest_parts(&[
            claimant.as_bytes(),
            issuer.as_bytes(),
            &score_word,
        ]))
    }

    /// Produce a fresh single-use claim for one submission attempt.
    pub fn sign_claim(
        claimant: Address,
        issuer: Address,
        issuer_key: &PrivateKey,
        score: Score,
    ) -> Result<SignedScoreClaim, BuildError> {
        let digest = Self::claim_digest(claimant, issuer, score)?;
        let signature = issuer_key.sign_prehash(&digest)?;
        Ok(SignedScoreClaim {
            claimant,
            issuer,
            score,
            v: signature.v_legacy(),
            r: signature.r,
            s: signature.s,
        })
    }

    /// Build the write transaction from explicit issuer credentials.
    ///
    /// Arguments are `(score, v, r, s)`; the sender is the claimant. Fails
    /// before anything is sent if the gas allowance is zero or the key is
    /// unusable.
    pub fn build_submit_write(
        &self,
        claimant: Address,
        issuer: Address,
        issuer_key: &PrivateKey,
        score: Score,
        gas_limit: u64,
    ) -> Result<TransactionPayload, BuildError> {
        if gas_limit == 0 {
            return Err(CodecError::InvalidArgument(
                "gas limit must be nonzero".to_string(),
            )
            .into());
        }
        let claim = Self::sign_claim(claimant, issuer, issuer_key, score)?;
        let data = abi::encode_call(
            abi::selector(SIG_SET_SCORE),
            &[
                AbiValue::Int {
                    value: claim.score.value(),
                    bits: 256,
                },
                AbiValue::Uint {
                    value: u64::from(claim.v),
                    bits: 8,
                },
                AbiValue::Bytes32(claim.r),
                AbiValue::Bytes32(claim.s),
            ],
        )?;
        Ok(TransactionPayload {
            from: claimant,
            to: self.contract,
            data,
            gas_limit,
        })
    }
}

impl LedgerOperations for ScoreLedger {
    fn count_read_call(&self) -> CallPayload {
        CallPayload {
            to: self.contract,
            data: abi::selector(SIG_COUNT).to_vec(),
        }
    }

    fn score_at_index_read_call(&self, index: u64) -> Result<CallPayload, CodecError> {
        let data = abi::encode_call(
            abi::selector(SIG_SCORE_AT),
            &[AbiValue::Uint {
                value: index,
                bits: 256,
            }],
        )?;
        Ok(CallPayload {
            to: self.contract,
            data,
        })
    }

    fn user_score_read_call(&self, user: Address) -> Result<CallPayload, CodecError> {
        let data = abi::encode_call(abi::selector(SIG_USER_SCORE), &[AbiValue::Address(user)])?;
        Ok(CallPayload {
            to: self.contract,
            data,
        })
    }

    fn submit_write_transaction(
        &self,
        claimant: Address,
        score: Score,
    ) -> Result<TransactionPayload, BuildError> {
        self.build_submit_write(claimant, self.issuer, &self.issuer_key, score, self.gas_limit)
    }

    fn decode_count(&self, bytes: &[u8]) -> Result<u64, CodecError> {
        decode::decode_count(bytes)
    }

    fn decode_score_record(&self, bytes: &[u8]) -> Result<ScoreRecord, CodecError> {
        decode::decode_score_record(bytes)
    }

    fn decode_user_score(&self, bytes: &[u8]) -> Result<Score, CodecError> {
        decode::decode_user_score(bytes)
    }
}

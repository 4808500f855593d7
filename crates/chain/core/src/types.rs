//! Common types for ledger interactions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 20-byte account or contract identifier.
///
/// Equality is byte-exact. The textual form is `0x`-prefixed hex,
/// case-insensitive on parse, lowercase on display.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse from a byte slice; fails unless exactly 20 bytes long.
    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressParseError> {
        let bytes: [u8; 20] = slice
            .try_into()
            .map_err(|_| AddressParseError::BadLength(slice.len()))?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let raw = hex::decode(stripped).map_err(|_| AddressParseError::BadHex)?;
        Self::from_slice(&raw)
    }
}

/// Errors from parsing an [`Address`] out of text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    #[error("address must be 20 bytes, got {0}")]
    BadLength(usize),

    #[error("address is not valid hex")]
    BadHex,
}

/// A player's achieved score.
///
/// The ledger declares a 256-bit signed integer; in practice every score the
/// game produces fits `i64`, so that is the domain this client carries. The
/// codec sign-extends to the full ledger word on encode.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Score(pub i64);

impl Score {
    pub const ZERO: Score = Score(0);

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Score {
    fn from(value: i64) -> Self {
        Score(value)
    }
}

/// One row of the ledger's ranked score list.
///
/// Created only by decoding a read response; never mutated locally.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub owner: Address,
    pub score: Score,
}

/// A single-use authorization binding a score to a claimant.
///
/// Producible only by the holder of the issuer's private key. Built fresh for
/// every submission attempt and never reused for a different score value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedScoreClaim {
    pub claimant: Address,
    pub issuer: Address,
    pub score: Score,
    /// Recovery id in the ledger's 27/28 convention.
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

/// Identifier of a submitted transaction, as returned by the node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionId(pub Vec<u8>);

impl TransactionId {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// Observed chain height.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockNumber(pub u64);

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A read-only request against the ledger: selector plus encoded argument
/// words, targeting one contract. Never mutates ledger state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallPayload {
    /// Contract the call is dispatched to.
    pub to: Address,
    /// Selector followed by the argument words in declaration order.
    pub data: Vec<u8>,
}

/// A state-mutating request. Carries the sender and a gas allowance in
/// addition to the encoded call data; authorization material (the issuer
/// signature) travels inside `data` as ordinary arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionPayload {
    /// Sender of the transaction (the claimant, not the issuer).
    pub from: Address,
    /// Contract the transaction is dispatched to.
    pub to: Address,
    /// Selector followed by the argument words in declaration order.
    pub data: Vec<u8>,
    /// Gas limit for execution.
    pub gas_limit: u64,
}

//! Shared error taxonomy.
//!
//! Wraps failures from the transport, the binary codec, and the signing path
//! so every polling cycle can classify what it caught: transport and decode
//! failures are transient and retried on the next tick, argument and key
//! failures are rejected before anything reaches the network.

/// Transport layer errors. Always recoverable: the owning cycle logs the
/// failure and retries on its next scheduled tick.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("node rejected the request: {0}")]
    Rejected(String),

    #[error("external signer unavailable: {0}")]
    SignerUnavailable(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Binary codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Returned bytes do not carry the declared word layout, or a decoded
    /// word does not fit the declared type's domain. Treated as transient
    /// by the cycles that hit it.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A caller-supplied value is outside the declared type's domain.
    /// Rejected before any payload is built or sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Signing errors. An invalid key is fatal to the submission attempt; the
/// client must never fall back to an unsigned submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    #[error("private key is not a valid secp256k1 scalar")]
    InvalidKey,

    #[error("signature recovery failed")]
    RecoveryFailed,
}

/// Errors from building a ledger operation payload.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Sign(#[from] SignError),
}

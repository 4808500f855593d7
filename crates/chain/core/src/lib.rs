//! Chain-agnostic core for the score ledger client.
//!
//! This crate defines the domain types shared by every other crate (addresses,
//! scores, call and transaction payloads), the trait boundaries behind which
//! a concrete chain binding lives, and the error taxonomy for the whole
//! client. It deliberately knows nothing about any particular ledger's wire
//! format; that lives in the binding crate (`chain-eth`).
//!
//! Modules are organized by responsibility:
//! - [`types`] holds the immutable domain types
//! - [`traits`] defines the transport, identity, and signer boundaries
//! - [`error`] is the shared error taxonomy
//! - [`mock`] provides an in-memory transport for tests

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{BuildError, CodecError, SignError, TransportError};
pub use mock::MockChainTransport;
pub use traits::{
    ChainTransport, ExternalSigner, ExternalSignerIdentity, IdentityProvider, LedgerOperations,
};
pub use types::{
    Address, AddressParseError, BlockNumber, CallPayload, Score, ScoreRecord, SignedScoreClaim,
    TransactionId, TransactionPayload,
};

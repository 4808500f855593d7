//! Ethereum binding for the score ledger client.
//!
//! Implements the chain-core trait boundaries against an Ethereum-style
//! ledger: word-level ABI encoding, keccak-based claim signing with
//! recoverable secp256k1 signatures, the fixed contract operation set,
//! legacy transaction assembly, and a JSON-RPC transport.
//!
//! Modules are organized by responsibility:
//! - [`abi`] is the binary codec (words, selectors)
//! - [`signer`] holds keys, digests, and recoverable signatures
//! - [`contract`] builds the four ledger operations
//! - [`decode`] turns raw return bytes into typed results
//! - [`tx`] assembles and signs raw legacy transactions
//! - [`rpc`] is the HTTP JSON-RPC [`chain_core::ChainTransport`]
//! - [`config`] loads the Ethereum-side configuration from the environment

pub mod abi;
pub mod config;
pub mod contract;
pub mod decode;
pub mod rpc;
pub mod signer;
pub mod tx;

pub use config::EthConfig;
pub use contract::ScoreLedger;
pub use rpc::{RpcTransport, SubmitPath};
pub use signer::{LocalKeyIdentity, PrivateKey, RecoverableSignature};

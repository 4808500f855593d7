//! Raw legacy transaction assembly for the local-key signing path.
//!
//! The envelope is the nine-field RLP list `[nonce, gasPrice, gasLimit, to,
//! value, data, v, r, s]` with EIP-155 replay protection: the signing digest
//! covers `[…, chainId, 0, 0]` and `v` folds the chain id in. The external
//! signing path never comes through here — the wallet owns the envelope.

use alloy_rlp::{Encodable, Header};

use chain_core::{Address, SignError};

use crate::abi::keccak256;
use crate::signer::PrivateKey;

/// An unsigned legacy transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    fn encode_base_fields(&self, out: &mut Vec<u8>) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.as_bytes().as_slice().encode(out);
        self.value.encode(out);
        self.data.as_slice().encode(out);
    }

    /// The EIP-155 signing digest: keccak-256 of the RLP list with the
    /// chain id and two zero placeholders appended.
    pub fn signing_digest(&self, chain_id: u64) -> [u8; 32] {
        let mut payload = Vec::new();
        self.encode_base_fields(&mut payload);
        chain_id.encode(&mut payload);
        0u8.encode(&mut payload);
        0u8.encode(&mut payload);
        keccak256(&rlp_list(payload))
    }

    /// Sign with the sender's key and produce the raw broadcastable bytes.
    pub fn sign(&self, key: &PrivateKey, chain_id: u64) -> Result<Vec<u8>, SignError> {
        let signature = key.sign_prehash(&self.signing_digest(chain_id))?;

        let mut payload = Vec::new();
        self.encode_base_fields(&mut payload);
        signature.v_eip155(chain_id).encode(&mut payload);
        trim_leading_zeros(&signature.r).encode(&mut payload);
        trim_leading_zeros(&signature.s).encode(&mut payload);
        Ok(rlp_list(payload))
    }
}

fn rlp_list(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(&payload);
    out
}

/// RLP encodes integers as their minimal big-endian bytes; a 32-byte scalar
/// must be stripped before encoding as a string.
fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

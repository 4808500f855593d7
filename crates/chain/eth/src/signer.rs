//! Keys, claim digests, and recoverable signatures.
//!
//! A score claim is bound by `keccak256(claimant ‖ issuer ‖ int256(score))`
//! and signed with the issuer's secp256k1 key. Signatures are recoverable:
//! the ledger derives the signer's address from `(v, r, s)` and the digest
//! alone, so no public key travels with the claim. Nonces are deterministic
//! per RFC 6979 — no fixed-nonce or RNG-misuse pitfalls.

use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use chain_core::{Address, IdentityProvider, SignError, TransportError};

use crate::abi::keccak256;

/// A secp256k1 private key with its derived ledger address.
#[derive(Clone)]
pub struct PrivateKey {
    key: SigningKey,
    address: Address,
}

impl PrivateKey {
    /// Validate a 32-byte scalar. Zero and values at or above the curve
    /// order are rejected with `InvalidKey`.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, SignError> {
        let key = SigningKey::from_slice(bytes).map_err(|_| SignError::InvalidKey)?;
        let address = address_of_verifying_key(key.verifying_key());
        Ok(Self { key, address })
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(hex_str: &str) -> Result<Self, SignError> {
        let stripped = hex_str
            .strip_prefix("0x")
            .or_else(|| hex_str.strip_prefix("0X"))
            .unwrap_or(hex_str);
        let raw = hex::decode(stripped).map_err(|_| SignError::InvalidKey)?;
        let bytes: [u8; 32] = raw.try_into().map_err(|_| SignError::InvalidKey)?;
        Self::from_bytes(&bytes)
    }

    /// The address derived from this key's public identity.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte digest, producing a recoverable signature.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, SignError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest)
            .map_err(|_| SignError::RecoveryFailed)?;
        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(RecoverableSignature {
            recovery_id: recovery_id.to_byte(),
            r,
            s,
        })
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The scalar stays out of logs.
        f.debug_struct("PrivateKey")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// A recoverable secp256k1 signature over a 32-byte digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    /// Raw recovery id (0 or 1).
    pub recovery_id: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl RecoverableSignature {
    /// Recovery id in the ledger's 27/28 convention, as `ecrecover` expects.
    pub fn v_legacy(&self) -> u8 {
        self.recovery_id + 27
    }

    /// Recovery id in the EIP-155 replay-protected form.
    pub fn v_eip155(&self, chain_id: u64) -> u64 {
        u64::from(self.recovery_id) + chain_id * 2 + 35
    }
}

/// keccak-256 over the concatenation of each part's canonical bytes.
pub fn digest_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        buf.extend_from_slice(part);
    }
    keccak256(&buf)
}

/// Recover the signer's address from a digest and a recoverable signature.
pub fn recover_address(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<Address, SignError> {
    let sig = Signature::from_scalars(signature.r, signature.s)
        .map_err(|_| SignError::RecoveryFailed)?;
    let recovery_id =
        RecoveryId::from_byte(signature.recovery_id).ok_or(SignError::RecoveryFailed)?;
    let verifying_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SignError::RecoveryFailed)?;
    Ok(address_of_verifying_key(&verifying_key))
}

/// Ledger address of a public key: the last 20 bytes of the keccak-256 of
/// the uncompressed point, tag byte excluded.
pub fn address_of_verifying_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..]).expect("keccak output tail is 20 bytes")
}

/// [`IdentityProvider`] for a locally configured key: the address is derived
/// once from the key and never changes.
pub struct LocalKeyIdentity {
    address: Address,
}

impl LocalKeyIdentity {
    pub fn new(key: &PrivateKey) -> Self {
        Self {
            address: key.address(),
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalKeyIdentity {
    async fn current_address(&self) -> Result<Option<Address>, TransportError> {
        Ok(Some(self.address))
    }

    fn is_static(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(seed: u8) -> PrivateKey {
        let mut bytes = [0u8; 32];
        bytes[31] = seed;
        bytes[0] = seed.wrapping_add(1);
        PrivateKey::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn zero_key_is_invalid() {
        assert_eq!(
            PrivateKey::from_bytes(&[0u8; 32]).unwrap_err(),
            SignError::InvalidKey
        );
    }

    #[test]
    fn key_above_curve_order_is_invalid() {
        assert_eq!(
            PrivateKey::from_bytes(&[0xff; 32]).unwrap_err(),
            SignError::InvalidKey
        );
    }

    #[test]
    fn malformed_hex_is_invalid() {
        assert_eq!(
            PrivateKey::from_hex("0xnot-a-key").unwrap_err(),
            SignError::InvalidKey
        );
        assert_eq!(PrivateKey::from_hex("0x1234").unwrap_err(), SignError::InvalidKey);
    }

    #[test]
    fn signatures_recover_the_signing_address() {
        let key = test_key(7);
        let digest = keccak256(b"attested score");
        let signature = key.sign_prehash(&digest).unwrap();
        assert_eq!(recover_address(&digest, &signature).unwrap(), key.address());
    }

    #[test]
    fn recovery_against_a_different_digest_yields_another_address() {
        let key = test_key(9);
        let digest = keccak256(b"score 42");
        let signature = key.sign_prehash(&digest).unwrap();

        let other = keccak256(b"score 43");
        let recovered = recover_address(&other, &signature);
        assert!(recovered.is_err() || recovered.unwrap() != key.address());
    }

    #[test]
    fn digest_changes_with_every_part() {
        let base = digest_parts(&[b"claimant", b"issuer", b"score"]);
        assert_ne!(base, digest_parts(&[b"claimant2", b"issuer", b"score"]));
        assert_ne!(base, digest_parts(&[b"claimant", b"issuer2", b"score"]));
        assert_ne!(base, digest_parts(&[b"claimant", b"issuer", b"score2"]));
    }

    #[test]
    fn signing_is_deterministic_per_message() {
        let key = test_key(11);
        let digest = keccak256(b"same message");
        let first = key.sign_prehash(&digest).unwrap();
        let second = key.sign_prehash(&digest).unwrap();
        assert_eq!(first, second);

        // A different message never reuses the nonce, so r differs.
        let other = key.sign_prehash(&keccak256(b"other message")).unwrap();
        assert_ne!(first.r, other.r);
    }

    #[test]
    fn legacy_v_is_27_or_28() {
        let key = test_key(13);
        let signature = key.sign_prehash(&keccak256(b"v check")).unwrap();
        assert!(matches!(signature.v_legacy(), 27 | 28));
    }

    #[tokio::test]
    async fn local_key_identity_is_static() {
        let key = test_key(17);
        let identity = LocalKeyIdentity::new(&key);
        assert!(identity.is_static());
        assert_eq!(
            identity.current_address().await.unwrap(),
            Some(key.address())
        );
    }
}

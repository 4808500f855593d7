//! Word-level contract ABI codec.
//!
//! The ledger's call convention packs every argument and return value into
//! 32-byte words: unsigned integers left-padded with zeros, signed integers
//! sign-extended, addresses right-aligned. A call payload is a 4-byte
//! selector (keccak-256 of the canonical signature) followed by the argument
//! words in declaration order. Decoding is the exact inverse of encoding for
//! every value inside the declared type's domain.

use chain_core::{Address, CodecError};
use sha3::{Digest, Keccak256};

/// Width of one ABI word in bytes.
pub const WORD: usize = 32;

/// Length of a function selector in bytes.
pub const SELECTOR_LEN: usize = 4;

/// The closed set of value shapes the ledger's operations use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiValue {
    /// Unsigned integer of a declared bit width (8..=256, multiple of 8).
    Uint { value: u64, bits: u16 },
    /// Signed integer of a declared bit width, sign-extended to the word.
    Int { value: i64, bits: u16 },
    Address(Address),
    Bytes32([u8; 32]),
}

/// Declared types for decoding return words.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AbiType {
    Uint(u16),
    Int(u16),
    Address,
    Bytes32,
}

/// keccak-256 over `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Selector for a canonical function signature, e.g. `"topScores(uint256)"`.
pub fn selector(signature: &str) -> [u8; SELECTOR_LEN] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn check_bits(bits: u16) -> Result<(), CodecError> {
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(CodecError::InvalidArgument(format!(
            "unsupported integer width: {bits} bits"
        )));
    }
    Ok(())
}

/// Encode one value into its 32-byte word.
///
/// Fails with `InvalidArgument` when the value does not fit the declared
/// width, before anything could reach the network.
pub fn encode_word(value: &AbiValue) -> Result<[u8; WORD], CodecError> {
    let mut word = [0u8; WORD];
    match value {
        AbiValue::Uint { value, bits } => {
            check_bits(*bits)?;
            if *bits < 64 && *value >> bits != 0 {
                return Err(CodecError::InvalidArgument(format!(
                    "{value} does not fit uint{bits}"
                )));
            }
            word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
        }
        AbiValue::Int { value, bits } => {
            check_bits(*bits)?;
            if *bits < 64 {
                let min = -(1i64 << (bits - 1));
                let max = (1i64 << (bits - 1)) - 1;
                if *value < min || *value > max {
                    return Err(CodecError::InvalidArgument(format!(
                        "{value} does not fit int{bits}"
                    )));
                }
            }
            let fill = if *value < 0 { 0xff } else { 0x00 };
            word[..WORD - 8].fill(fill);
            word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
        }
        AbiValue::Address(address) => {
            word[WORD - Address::LEN..].copy_from_slice(address.as_bytes());
        }
        AbiValue::Bytes32(bytes) => {
            word.copy_from_slice(bytes);
        }
    }
    Ok(word)
}

/// Decode one 32-byte word as the declared type.
///
/// Values the client cannot represent (an unsigned word above `u64::MAX`, a
/// signed word outside `i64`) are malformed responses, not panics.
pub fn decode_word(word: &[u8; WORD], ty: AbiType) -> Result<AbiValue, CodecError> {
    match ty {
        AbiType::Uint(bits) => {
            check_bits(bits).map_err(|_| {
                CodecError::MalformedResponse(format!("unsupported integer width: {bits} bits"))
            })?;
            if word[..WORD - 8].iter().any(|&b| b != 0) {
                return Err(CodecError::MalformedResponse(
                    "unsigned word exceeds the supported 64-bit domain".to_string(),
                ));
            }
            let value = u64::from_be_bytes(word[WORD - 8..].try_into().unwrap());
            if bits < 64 && value >> bits != 0 {
                return Err(CodecError::MalformedResponse(format!(
                    "value {value} does not fit uint{bits}"
                )));
            }
            Ok(AbiValue::Uint { value, bits })
        }
        AbiType::Int(bits) => {
            check_bits(bits).map_err(|_| {
                CodecError::MalformedResponse(format!("unsupported integer width: {bits} bits"))
            })?;
            let value = i64::from_be_bytes(word[WORD - 8..].try_into().unwrap());
            let fill = if value < 0 { 0xff } else { 0x00 };
            if word[..WORD - 8].iter().any(|&b| b != fill) {
                return Err(CodecError::MalformedResponse(
                    "signed word exceeds the supported 64-bit domain".to_string(),
                ));
            }
            Ok(AbiValue::Int { value, bits })
        }
        AbiType::Address => {
            if word[..WORD - Address::LEN].iter().any(|&b| b != 0) {
                return Err(CodecError::MalformedResponse(
                    "address word carries nonzero padding".to_string(),
                ));
            }
            let address = Address::from_slice(&word[WORD - Address::LEN..])
                .expect("slice is exactly 20 bytes");
            Ok(AbiValue::Address(address))
        }
        AbiType::Bytes32 => Ok(AbiValue::Bytes32(*word)),
    }
}

/// Decode a full return buffer against a declared word layout.
///
/// Atomic: the buffer must contain exactly one word per declared type, or
/// the whole decode fails with `MalformedResponse`.
pub fn decode_words(bytes: &[u8], layout: &[AbiType]) -> Result<Vec<AbiValue>, CodecError> {
    let expected = layout.len() * WORD;
    if bytes.len() != expected {
        return Err(CodecError::MalformedResponse(format!(
            "expected {expected} bytes, got {}",
            bytes.len()
        )));
    }
    layout
        .iter()
        .zip(bytes.chunks_exact(WORD))
        .map(|(&ty, chunk)| decode_word(chunk.try_into().unwrap(), ty))
        .collect()
}

/// Concatenate a selector with encoded argument words in declaration order.
pub fn encode_call(
    selector: [u8; SELECTOR_LEN],
    args: &[AbiValue],
) -> Result<Vec<u8>, CodecError> {
    let mut data = Vec::with_capacity(SELECTOR_LEN + args.len() * WORD);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(&encode_word(arg)?);
    }
    Ok(data)
}

impl AbiValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AbiValue::Uint { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AbiValue::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            AbiValue::Address(address) => Some(*address),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn unsigned_words_are_left_padded() {
        let word = encode_word(&AbiValue::Uint {
            value: 0x1234,
            bits: 256,
        })
        .unwrap();
        assert_eq!(&word[..30], &[0u8; 30]);
        assert_eq!(&word[30..], &[0x12, 0x34]);
    }

    #[test]
    fn negative_integers_are_sign_extended() {
        let word = encode_word(&AbiValue::Int {
            value: -1,
            bits: 256,
        })
        .unwrap();
        assert_eq!(word, [0xff; 32]);
    }

    #[test]
    fn addresses_are_right_aligned() {
        let word = encode_word(&AbiValue::Address(addr(0xAA))).unwrap();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], &[0xAA; 20]);
    }

    #[test]
    fn roundtrip_covers_the_declared_domains() {
        for value in [i64::MIN, -1, 0, 1, 42, i64::MAX] {
            let word = encode_word(&AbiValue::Int { value, bits: 256 }).unwrap();
            let decoded = decode_word(&word, AbiType::Int(256)).unwrap();
            assert_eq!(decoded.as_i64(), Some(value));
        }
        for value in [0u64, 1, 255, u64::MAX] {
            let word = encode_word(&AbiValue::Uint { value, bits: 256 }).unwrap();
            let decoded = decode_word(&word, AbiType::Uint(256)).unwrap();
            assert_eq!(decoded.as_u64(), Some(value));
        }
        let address = addr(0x5B);
        let word = encode_word(&AbiValue::Address(address)).unwrap();
        assert_eq!(
            decode_word(&word, AbiType::Address).unwrap().as_address(),
            Some(address)
        );
    }

    #[test]
    fn out_of_width_values_are_rejected_before_encoding() {
        let err = encode_word(&AbiValue::Uint {
            value: 256,
            bits: 8,
        })
        .unwrap_err();
        assert!(matches!(err, CodecError::InvalidArgument(_)));

        let err = encode_word(&AbiValue::Int {
            value: 128,
            bits: 8,
        })
        .unwrap_err();
        assert!(matches!(err, CodecError::InvalidArgument(_)));
    }

    #[test]
    fn short_buffers_fail_to_decode() {
        let err = decode_words(&[0u8; 31], &[AbiType::Uint(256)]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedResponse(_)));

        // A record needs two words; one word is not a partial success.
        let err = decode_words(&[0u8; 32], &[AbiType::Address, AbiType::Int(256)]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedResponse(_)));
    }

    #[test]
    fn oversized_unsigned_words_are_malformed() {
        let mut word = [0u8; 32];
        word[0] = 1;
        let err = decode_word(&word, AbiType::Uint(256)).unwrap_err();
        assert!(matches!(err, CodecError::MalformedResponse(_)));
    }

    #[test]
    fn selectors_are_four_bytes_and_distinct_per_signature() {
        let a = selector("getCountTopScores()");
        let b = selector("topScores(uint256)");
        let c = selector("userTopScores(address)");
        let d = selector("setTopScore(int256,uint8,bytes32,bytes32)");
        assert_eq!(a.len(), SELECTOR_LEN);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(c, d);
        assert_ne!(a, d);
        // Deterministic: same signature, same selector.
        assert_eq!(a, selector("getCountTopScores()"));
    }

    #[test]
    fn known_selector_vector() {
        // The canonical ERC-20 transfer selector pins the hash-and-truncate
        // convention to a published constant.
        assert_eq!(
            selector("transfer(address,uint256)"),
            [0xa9, 0x05, 0x9c, 0xbb]
        );
    }

    #[test]
    fn call_encoding_is_selector_then_words() {
        let data = encode_call(
            [1, 2, 3, 4],
            &[AbiValue::Uint {
                value: 7,
                bits: 256,
            }],
        )
        .unwrap();
        assert_eq!(data.len(), SELECTOR_LEN + WORD);
        assert_eq!(&data[..4], &[1, 2, 3, 4]);
        assert_eq!(data[35], 7);
    }
}

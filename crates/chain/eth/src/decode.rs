//! Typed decoders for the ledger's read returns.
//!
//! One decoder per operation, each against a closed, compile-time word
//! layout. A decode either produces every field or fails atomically with
//! `MalformedResponse` — no partial records.

use chain_core::{CodecError, Score, ScoreRecord};

use crate::abi::{AbiType, decode_words};

/// `getCountTopScores()` return: a single `uint256`.
pub fn decode_count(bytes: &[u8]) -> Result<u64, CodecError> {
    let values = decode_words(bytes, &[AbiType::Uint(256)])?;
    Ok(values[0].as_u64().expect("layout declared uint"))
}

/// `topScores(uint256)` return: `(address owner, int256 score)`.
pub fn decode_score_record(bytes: &[u8]) -> Result<ScoreRecord, CodecError> {
    let values = decode_words(bytes, &[AbiType::Address, AbiType::Int(256)])?;
    Ok(ScoreRecord {
        owner: values[0].as_address().expect("layout declared address"),
        score: Score(values[1].as_i64().expect("layout declared int")),
    })
}

/// `userTopScores(address)` return: a single `int256`. Unknown users come
/// back as the ledger's default of zero.
pub fn decode_user_score(bytes: &[u8]) -> Result<Score, CodecError> {
    let values = decode_words(bytes, &[AbiType::Int(256)])?;
    Ok(Score(values[0].as_i64().expect("layout declared int")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_core::Address;

    use crate::abi::{AbiValue, encode_word};

    fn uint_word(value: u64) -> Vec<u8> {
        encode_word(&AbiValue::Uint { value, bits: 256 })
            .unwrap()
            .to_vec()
    }

    fn int_word(value: i64) -> Vec<u8> {
        encode_word(&AbiValue::Int { value, bits: 256 })
            .unwrap()
            .to_vec()
    }

    #[test]
    fn count_decodes_from_one_word() {
        assert_eq!(decode_count(&uint_word(2)).unwrap(), 2);
        assert_eq!(decode_count(&uint_word(0)).unwrap(), 0);
    }

    #[test]
    fn record_decodes_owner_and_score() {
        let owner = Address::from_bytes([0xBB; 20]);
        let mut bytes = encode_word(&AbiValue::Address(owner)).unwrap().to_vec();
        bytes.extend_from_slice(&int_word(25));

        let record = decode_score_record(&bytes).unwrap();
        assert_eq!(record.owner, owner);
        assert_eq!(record.score, Score(25));
    }

    #[test]
    fn user_score_default_is_zero() {
        assert_eq!(decode_user_score(&int_word(0)).unwrap(), Score::ZERO);
    }

    #[test]
    fn truncated_returns_fail_atomically() {
        assert!(matches!(
            decode_count(&[0u8; 16]).unwrap_err(),
            CodecError::MalformedResponse(_)
        ));
        // A record missing its second word produces nothing, not half a row.
        let owner = Address::from_bytes([0xBB; 20]);
        let bytes = encode_word(&AbiValue::Address(owner)).unwrap();
        assert!(matches!(
            decode_score_record(&bytes).unwrap_err(),
            CodecError::MalformedResponse(_)
        ));
        assert!(matches!(
            decode_user_score(&[]).unwrap_err(),
            CodecError::MalformedResponse(_)
        ));
    }
}

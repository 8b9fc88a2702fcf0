//! Call-data binding for the key/value `Store` contract used by the contract
//! exercises:
//!
//! ```solidity
//! function setItem(bytes32 key, bytes32 value) external;
//! function getItem(bytes32 key) external view returns (bytes32);
//! event ItemSet(bytes32 key, bytes32 value);
//! ```

use crate::abi::{decode_word, encode_call_tokens, event_topic, Token, WORD_SIZE};
use crate::error::EthError;

pub const SET_ITEM: &str = "setItem(bytes32,bytes32)";
pub const GET_ITEM: &str = "getItem(bytes32)";
pub const ITEM_SET_EVENT: &str = "ItemSet(bytes32,bytes32)";

/// Copies a short string into a right-zero-padded `bytes32`.
pub fn bytes32_from_str(s: &str) -> Result<[u8; 32], EthError> {
    let raw = s.as_bytes();
    if raw.len() > WORD_SIZE {
        return Err(EthError::ArgumentTooLarge { len: raw.len() });
    }

    let mut out = [0u8; 32];
    out[..raw.len()].copy_from_slice(raw);
    Ok(out)
}

/// Recovers the string stored by [`bytes32_from_str`], dropping trailing zero
/// bytes.
pub fn bytes32_to_string(value: &[u8; 32]) -> Result<String, EthError> {
    let end = value.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8(value[..end].to_vec())
        .map_err(|e| EthError::DecodingError(format!("bytes32 is not utf-8: {e}")))
}

pub fn encode_set_item(key: [u8; 32], value: [u8; 32]) -> Result<Vec<u8>, EthError> {
    encode_call_tokens(SET_ITEM, &[Token::FixedBytes(key), Token::FixedBytes(value)])
}

pub fn encode_get_item(key: [u8; 32]) -> Result<Vec<u8>, EthError> {
    encode_call_tokens(GET_ITEM, &[Token::FixedBytes(key)])
}

/// Decodes the `bytes32` returned by `getItem`.
pub fn decode_get_item(data: &[u8]) -> Result<[u8; 32], EthError> {
    decode_word(data, 0)
}

/// Decodes an `ItemSet` log into `(key, value)`. Neither field is indexed, so
/// both come from the log data.
pub fn decode_item_set(
    topics: &[[u8; 32]],
    data: &[u8],
) -> Result<([u8; 32], [u8; 32]), EthError> {
    match topics.first() {
        Some(topic) if *topic == event_topic(ITEM_SET_EVENT)? => {
            Ok((decode_word(data, 0)?, decode_word(data, 1)?))
        }
        _ => Err(EthError::DecodingError("not an ItemSet log".into())),
    }
}

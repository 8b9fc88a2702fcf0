//! Fixed-width ABI call encoding.
//!
//! Only static 32-byte argument types are supported: addresses, unsigned
//! integers and `bytesN`. Dynamic types (strings, bytes, arrays) are not.

use alloy_primitives::U256;
use sha3::{Digest, Keccak256};

use crate::address::Address;
use crate::error::EthError;

/// Width of one ABI word.
pub const WORD_SIZE: usize = 32;

/// A single static ABI argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A 20-byte address, left-padded to 32 bytes.
    Address(Address),
    /// A 256-bit unsigned integer, big-endian.
    Uint(U256),
    /// A `bytes32` value, stored verbatim.
    FixedBytes([u8; 32]),
}

impl Token {
    /// Encodes this token as one 32-byte ABI word.
    pub fn to_word(&self) -> [u8; 32] {
        match self {
            Token::Address(addr) => {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(addr.as_bytes());
                word
            }
            Token::Uint(value) => value.to_be_bytes::<32>(),
            Token::FixedBytes(bytes) => *bytes,
        }
    }
}

/// Returns the 4-byte selector of `signature`: the first four bytes of its
/// Keccak-256 hash.
///
/// The signature text is hashed exactly as given, so `"transfer(address,uint256)"`
/// and `"transfer(address, uint256)"` produce different selectors.
pub fn selector(signature: &str) -> Result<[u8; 4], EthError> {
    if signature.is_empty() {
        return Err(EthError::EmptySignature);
    }

    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    Ok(out)
}

/// Left-pads a big-endian value with zero bytes to a full 32-byte word.
pub fn left_pad(bytes: &[u8]) -> Result<[u8; 32], EthError> {
    if bytes.len() > WORD_SIZE {
        return Err(EthError::ArgumentTooLarge { len: bytes.len() });
    }

    let mut word = [0u8; 32];
    word[WORD_SIZE - bytes.len()..].copy_from_slice(bytes);
    Ok(word)
}

/// Builds call data: `selector(signature) || pad(args[0]) || pad(args[1]) || ...`.
///
/// Each argument is its raw big-endian byte representation, at most 32 bytes
/// long. Words appear in argument order; no type introspection happens.
pub fn encode_call(signature: &str, args: &[&[u8]]) -> Result<Vec<u8>, EthError> {
    let selector = selector(signature)?;

    let mut data = Vec::with_capacity(4 + args.len() * WORD_SIZE);
    data.extend_from_slice(&selector);

    for arg in args {
        data.extend_from_slice(&left_pad(arg)?);
    }

    Ok(data)
}

/// Same as [`encode_call`], taking typed tokens instead of raw bytes.
pub fn encode_call_tokens(signature: &str, tokens: &[Token]) -> Result<Vec<u8>, EthError> {
    let selector = selector(signature)?;

    let mut data = Vec::with_capacity(4 + tokens.len() * WORD_SIZE);
    data.extend_from_slice(&selector);

    for token in tokens {
        data.extend_from_slice(&token.to_word());
    }

    Ok(data)
}

/// Returns the `index`-th 32-byte word of ABI return data.
pub fn decode_word(data: &[u8], index: usize) -> Result<[u8; 32], EthError> {
    let end = index
        .checked_mul(WORD_SIZE)
        .and_then(|start| start.checked_add(WORD_SIZE))
        .ok_or_else(|| EthError::DecodingError(format!("word index {index} is out of range")))?;
    let word = data.get(end - WORD_SIZE..end).ok_or_else(|| {
        EthError::DecodingError(format!(
            "need {end} bytes for word {index}, got {}",
            data.len()
        ))
    })?;

    let mut out = [0u8; 32];
    out.copy_from_slice(word);
    Ok(out)
}

/// Decodes a single uint256 return value, e.g. from `balanceOf` or
/// `decimals`. Extra trailing bytes are ignored.
pub fn decode_uint256(data: &[u8]) -> Result<U256, EthError> {
    decode_word(data, 0).map(U256::from_be_bytes)
}

/// Decodes a single address return value. The 12 padding bytes must be zero.
pub fn decode_address(data: &[u8]) -> Result<Address, EthError> {
    let word = decode_word(data, 0)?;
    if word[..12].iter().any(|&b| b != 0) {
        return Err(EthError::DecodingError(
            "address word has non-zero padding".into(),
        ));
    }

    let mut addr = [0u8; 20];
    addr.copy_from_slice(&word[12..]);
    Ok(Address::new(addr))
}

/// Returns the full Keccak-256 hash of an event signature, the value a log
/// carries as `topics[0]`, e.g. `Transfer(address,address,uint256)`.
pub fn event_topic(signature: &str) -> Result<[u8; 32], EthError> {
    if signature.is_empty() {
        return Err(EthError::EmptySignature);
    }

    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    Ok(out)
}

/// Decodes an indexed `address` parameter from a log topic.
pub fn decode_topic_address(topic: &[u8; 32]) -> Result<Address, EthError> {
    decode_address(topic)
}

/// Decodes an indexed `uint256` parameter from a log topic.
pub fn decode_topic_uint256(topic: &[u8; 32]) -> U256 {
    U256::from_be_bytes(*topic)
}

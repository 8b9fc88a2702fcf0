use thiserror::Error;

/// Errors produced by key handling, address derivation, call-data encoding and
/// transaction construction.
///
/// Every variant is a local validation failure. None of them is transient, so
/// retrying with the same input will fail the same way.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("malformed private key hex: {0}")]
    KeyFormatError(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("function signature must not be empty")]
    EmptySignature,

    #[error("argument is {len} bytes, exceeds the 32-byte ABI word")]
    ArgumentTooLarge { len: usize },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(u64),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("gave up after {attempts} attempts")]
    Timeout { attempts: u32 },
}

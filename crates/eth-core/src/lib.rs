//! Ethereum client primitives.
//!
//! This crate provides:
//! - secp256k1 key generation and restoration, with address derivation
//!   (Keccak-256 of the uncompressed public key, last 20 bytes)
//! - EIP-55 checksummed addresses
//! - Fixed-width ABI call-data encoding from a function signature
//! - ERC-20 and `Store` contract call builders
//! - Token unit conversion
//! - Legacy (EIP-155) and EIP-1559 transaction signing
//! - Explicit node configuration and bounded confirmation polling
//!
//! Talking to a node is left to the caller: these functions produce the
//! bytes a JSON-RPC client sends and consume the bytes it returns.

pub mod abi;
pub mod address;
pub mod config;
pub mod erc20;
pub mod error;
pub mod keys;
pub mod poll;
pub mod store;
pub mod transaction;
pub mod units;

pub use abi::{encode_call, event_topic, selector, Token};
pub use address::Address;
pub use error::EthError;
pub use keys::{derive_address, derive_address_hex, PrivateKey, PublicKey};

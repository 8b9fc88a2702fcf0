use std::fmt;
use std::str::FromStr;

use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// A 20-byte account address.
///
/// Displayed in EIP-55 mixed-case checksum form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derives the address of an uncompressed secp256k1 public key (65 bytes,
    /// starting with 0x04).
    ///
    /// The address is the last 20 bytes of the Keccak-256 hash of the 64-byte
    /// X‖Y concatenation, i.e. the key without its SEC1 prefix.
    pub fn from_public_key(uncompressed: &[u8; 65]) -> Result<Self, EthError> {
        if uncompressed[0] != 0x04 {
            return Err(EthError::InvalidPublicKey(
                "uncompressed key must start with 0x04".into(),
            ));
        }

        Ok(Self::from_xy(&uncompressed[1..]))
    }

    /// Hashes the 64-byte X‖Y concatenation and keeps the last 20 bytes.
    pub(crate) fn from_xy(xy: &[u8]) -> Self {
        let hash = Keccak256::digest(xy);

        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash[12..]);
        Self(addr)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the EIP-55 checksummed `0x`-prefixed form.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");

        for (i, c) in lower.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }

        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = EthError;

    /// Parses a `0x`-prefixed 40-character hex address.
    ///
    /// All-lowercase and all-uppercase input is accepted as-is. Mixed case must
    /// match the EIP-55 checksum.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

        if hex_part.len() != 40 {
            return Err(EthError::InvalidAddress(format!(
                "expected 40 hex characters, got {}",
                hex_part.len()
            )));
        }

        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(EthError::InvalidAddress(
                "address contains non-hex characters".into(),
            ));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes)
            .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;
        let address = Self(bytes);

        let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
        let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());

        if !is_all_lower && !is_all_upper && address.to_checksum()[2..] != *hex_part {
            return Err(EthError::InvalidAddress("EIP-55 checksum mismatch".into()));
        }

        Ok(address)
    }
}

/// Lenient address shape check: 40 hex characters with an optional `0x`
/// prefix. The checksum is not verified.
pub fn is_hex_address(s: &str) -> bool {
    let hex_part = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

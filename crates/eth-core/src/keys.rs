use std::fmt;

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::EncodedPoint;
use rand_core::OsRng;
use zeroize::{Zeroize, Zeroizing};

use crate::address::Address;
use crate::error::EthError;

/// A secp256k1 private key.
///
/// The scalar is zeroized on drop and never shown by `Debug`.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Generates a fresh key from the operating system CSPRNG.
    pub fn random() -> Self {
        Self(SigningKey::random(&mut OsRng))
    }

    /// Loads a key from its 32-byte big-endian scalar.
    ///
    /// Fails with [`EthError::InvalidKey`] when the scalar is zero or not below
    /// the curve order.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, EthError> {
        SigningKey::from_bytes(bytes.into())
            .map(Self)
            .map_err(|_| EthError::InvalidKey("scalar must be in [1, n)".into()))
    }

    /// Loads a key from exactly 64 hex characters, without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, EthError> {
        if s.len() != 64 {
            return Err(EthError::KeyFormatError(format!(
                "expected 64 hex characters, got {}",
                s.len()
            )));
        }

        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(s, &mut *bytes)
            .map_err(|e| EthError::KeyFormatError(e.to_string()))?;

        Self::from_bytes(&bytes)
    }

    /// Returns the scalar as 64 lowercase hex characters.
    pub fn to_hex(&self) -> Zeroizing<String> {
        let mut raw = self.0.to_bytes();
        let out = Zeroizing::new(hex::encode(raw.as_slice()));
        raw.as_mut_slice().zeroize();
        out
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(k256::PublicKey::from(self.0.verifying_key()))
    }

    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// A secp256k1 public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(k256::PublicKey);

impl PublicKey {
    /// Parses a SEC1-encoded key, either compressed (33 bytes) or
    /// uncompressed (65 bytes).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, EthError> {
        let encoded = EncodedPoint::from_bytes(bytes)
            .map_err(|e| EthError::InvalidPublicKey(format!("invalid SEC1 encoding: {e}")))?;

        let key: Option<k256::PublicKey> = k256::PublicKey::from_encoded_point(&encoded).into();
        key.map(Self).ok_or_else(|| {
            EthError::InvalidPublicKey("point is not on the secp256k1 curve".into())
        })
    }

    /// Uncompressed SEC1 form: `0x04 || X || Y`.
    pub fn to_uncompressed(&self) -> [u8; 65] {
        let point = self.0.to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Hex of the 64-byte X‖Y concatenation, without the 0x04 prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.to_uncompressed()[1..])
    }

    pub fn address(&self) -> Address {
        Address::from_xy(&self.to_uncompressed()[1..])
    }
}

/// Derives the account address that controls `key`.
pub fn derive_address(key: &PrivateKey) -> Address {
    key.address()
}

/// Parses a 64-character hex private key and derives its address.
pub fn derive_address_hex(private_key_hex: &str) -> Result<Address, EthError> {
    PrivateKey::from_hex(private_key_hex).map(|key| key.address())
}

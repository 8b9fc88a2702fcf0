use alloy_primitives::U256;
use alloy_rlp::{Encodable, RlpEncodable};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature};
use sha3::{Digest, Keccak256};

use crate::address::Address;
use crate::erc20;
use crate::error::EthError;
use crate::keys::PrivateKey;

/// Gas consumed by a plain native-currency transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Raises a node-suggested gas price to at least `floor`.
///
/// Some test networks suggest prices too low to get mined; callers pass a
/// floor such as 10 gwei.
pub fn effective_gas_price(suggested: u128, floor: u128) -> u128 {
    suggested.max(floor)
}

/// An unsigned pre-EIP-2718 transaction, signed with EIP-155 replay
/// protection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    /// Transfer value in wei.
    pub value: U256,
    /// Calldata (empty for simple transfers).
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    /// A native-currency transfer with the standard 21 000 gas limit.
    pub fn transfer(nonce: u64, to: Address, value: U256, gas_price: u128) -> Self {
        Self {
            nonce,
            gas_price,
            gas_limit: TRANSFER_GAS_LIMIT,
            to,
            value,
            data: Vec::new(),
        }
    }

    /// A zero-value contract call carrying `data`.
    pub fn contract_call(
        nonce: u64,
        contract: Address,
        data: Vec<u8>,
        gas_price: u128,
        gas_limit: u64,
    ) -> Self {
        Self {
            nonce,
            gas_price,
            gas_limit,
            to: contract,
            value: U256::ZERO,
            data,
        }
    }

    /// RLP of `[nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]`.
    pub fn signing_payload(&self, chain_id: u64) -> Vec<u8> {
        let fields = LegacyUnsignedFields {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: RlpAddress(*self.to.as_bytes()),
            value: RlpU256(self.value.to_be_bytes::<32>()),
            data: RlpBytes(self.data.clone()),
            chain_id,
            empty_r: 0,
            empty_s: 0,
        };

        let mut out = Vec::new();
        fields.encode(&mut out);
        out
    }

    pub fn signing_hash(&self, chain_id: u64) -> [u8; 32] {
        keccak256(&self.signing_payload(chain_id))
    }

    /// Signs with EIP-155: `v = recovery_id + chain_id * 2 + 35`.
    pub fn sign(&self, key: &PrivateKey, chain_id: u64) -> Result<SignedTransaction, EthError> {
        let signature = sign_hash(key, &self.signing_hash(chain_id))?;

        let v = chain_id
            .checked_mul(2)
            .and_then(|v| v.checked_add(35 + u64::from(signature.y_parity)))
            .ok_or(EthError::UnsupportedChain(chain_id))?;

        let fields = LegacySignedFields {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: RlpAddress(*self.to.as_bytes()),
            value: RlpU256(self.value.to_be_bytes::<32>()),
            data: RlpBytes(self.data.clone()),
            v,
            r: RlpU256(signature.r),
            s: RlpU256(signature.s),
        };

        let mut raw = Vec::new();
        fields.encode(&mut raw);

        tracing::debug!(nonce = self.nonce, chain_id, to = %self.to, "signed legacy transaction");
        Ok(SignedTransaction::new(raw, signature))
    }
}

/// An unsigned EIP-1559 (type 2) transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip1559Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
}

impl Eip1559Transaction {
    /// Wraps an ERC-20 `transfer(address,uint256)` call to `token`.
    pub fn erc20_transfer(
        chain_id: u64,
        nonce: u64,
        token: Address,
        to: Address,
        amount: U256,
        max_priority_fee_per_gas: u128,
        max_fee_per_gas: u128,
        gas_limit: u64,
    ) -> Result<Self, EthError> {
        Ok(Self {
            chain_id,
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to: token,
            value: U256::ZERO,
            data: erc20::encode_transfer(to, amount)?,
        })
    }

    /// `0x02 || rlp([chain_id, nonce, max_priority_fee_per_gas, max_fee_per_gas,
    /// gas_limit, to, value, data, access_list])`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let fields = Eip1559UnsignedFields {
            chain_id: self.chain_id,
            nonce: self.nonce,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            gas_limit: self.gas_limit,
            to: RlpAddress(*self.to.as_bytes()),
            value: RlpU256(self.value.to_be_bytes::<32>()),
            data: RlpBytes(self.data.clone()),
            access_list: Vec::new(),
        };

        let mut rlp_buf = Vec::new();
        fields.encode(&mut rlp_buf);

        let mut payload = Vec::with_capacity(1 + rlp_buf.len());
        payload.push(EIP1559_TX_TYPE);
        payload.extend_from_slice(&rlp_buf);
        payload
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    pub fn sign(&self, key: &PrivateKey) -> Result<SignedTransaction, EthError> {
        let signature = sign_hash(key, &self.signing_hash())?;

        let fields = Eip1559SignedFields {
            chain_id: self.chain_id,
            nonce: self.nonce,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            gas_limit: self.gas_limit,
            to: RlpAddress(*self.to.as_bytes()),
            value: RlpU256(self.value.to_be_bytes::<32>()),
            data: RlpBytes(self.data.clone()),
            access_list: Vec::new(),
            signature_y_parity: signature.y_parity,
            signature_r: RlpU256(signature.r),
            signature_s: RlpU256(signature.s),
        };

        let mut rlp_buf = Vec::new();
        fields.encode(&mut rlp_buf);

        let mut raw = Vec::with_capacity(1 + rlp_buf.len());
        raw.push(EIP1559_TX_TYPE);
        raw.extend_from_slice(&rlp_buf);

        tracing::debug!(
            nonce = self.nonce,
            chain_id = self.chain_id,
            to = %self.to,
            "signed eip-1559 transaction"
        );
        Ok(SignedTransaction::new(raw, signature))
    }
}

const EIP1559_TX_TYPE: u8 = 0x02;

/// Recoverable secp256k1 signature over a transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub y_parity: u8,
}

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Broadcast bytes, including the type prefix for typed transactions.
    pub raw: Vec<u8>,
    /// Keccak-256 of `raw`.
    pub hash: [u8; 32],
    pub signature: TxSignature,
}

impl SignedTransaction {
    fn new(raw: Vec<u8>, signature: TxSignature) -> Self {
        let hash = keccak256(&raw);
        Self {
            raw,
            hash,
            signature,
        }
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }

    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// Signs a 32-byte prehash with RFC 6979 deterministic nonces. The resulting
/// `s` is in the lower half of the curve order.
fn sign_hash(key: &PrivateKey, hash: &[u8; 32]) -> Result<TxSignature, EthError> {
    let (signature, recovery_id): (Signature, RecoveryId) = key
        .signing_key()
        .sign_prehash(hash)
        .map_err(|e| EthError::SigningError(e.to_string()))?;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature.r().to_bytes());
    s.copy_from_slice(&signature.s().to_bytes());

    Ok(TxSignature {
        r,
        s,
        y_parity: recovery_id.is_y_odd() as u8,
    })
}

// ---------------------------------------------------------------------------
// RLP-encodable structures
// ---------------------------------------------------------------------------

#[derive(RlpEncodable)]
struct LegacyUnsignedFields {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    to: RlpAddress,
    value: RlpU256,
    data: RlpBytes,
    chain_id: u64,
    empty_r: u8,
    empty_s: u8,
}

#[derive(RlpEncodable)]
struct LegacySignedFields {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    to: RlpAddress,
    value: RlpU256,
    data: RlpBytes,
    v: u64,
    r: RlpU256,
    s: RlpU256,
}

#[derive(RlpEncodable)]
struct Eip1559UnsignedFields {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: u128,
    max_fee_per_gas: u128,
    gas_limit: u64,
    to: RlpAddress,
    value: RlpU256,
    data: RlpBytes,
    access_list: Vec<AccessListItem>,
}

#[derive(RlpEncodable)]
struct Eip1559SignedFields {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: u128,
    max_fee_per_gas: u128,
    gas_limit: u64,
    to: RlpAddress,
    value: RlpU256,
    data: RlpBytes,
    access_list: Vec<AccessListItem>,
    signature_y_parity: u8,
    signature_r: RlpU256,
    signature_s: RlpU256,
}

/// An EIP-2930 access list entry. Always empty here.
#[derive(Debug, Clone, RlpEncodable)]
struct AccessListItem {
    address: RlpAddress,
    storage_keys: Vec<RlpU256>,
}

/// 20-byte address encoded as an RLP string.
#[derive(Debug, Clone)]
struct RlpAddress([u8; 20]);

impl Encodable for RlpAddress {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.0.as_slice().encode(out);
    }

    fn length(&self) -> usize {
        self.0.as_slice().length()
    }
}

/// 256-bit integer encoded as minimal big-endian bytes (leading zeros
/// stripped).
#[derive(Debug, Clone)]
struct RlpU256([u8; 32]);

impl RlpU256 {
    fn trimmed(&self) -> &[u8] {
        let start = self.0.iter().position(|&b| b != 0).unwrap_or(32);
        &self.0[start..]
    }
}

impl Encodable for RlpU256 {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.trimmed().encode(out);
    }

    fn length(&self) -> usize {
        self.trimmed().length()
    }
}

/// Calldata encoded as an RLP string (a bare `Vec<u8>` would encode as a
/// list of integers).
#[derive(Debug, Clone)]
struct RlpBytes(Vec<u8>);

impl Encodable for RlpBytes {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.0.as_slice().encode(out);
    }

    fn length(&self) -> usize {
        self.0.as_slice().length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::VerifyingKey;
    use k256::elliptic_curve::sec1::ToEncodedPoint;

    use crate::keys::PublicKey;

    const TEST_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    /// Private key from the EIP-155 worked example.
    const EIP155_KEY: &str = "4646464646464646464646464646464646464646464646464646464646464646";

    fn dead() -> Address {
        "0x000000000000000000000000000000000000dEaD".parse().unwrap()
    }

    fn eip155_example() -> LegacyTransaction {
        LegacyTransaction {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: "0x3535353535353535353535353535353535353535".parse().unwrap(),
            value: U256::from(1_000_000_000_000_000_000u128),
            data: Vec::new(),
        }
    }

    fn recover(hash: &[u8; 32], signature: &TxSignature) -> PublicKey {
        let sig = Signature::from_scalars(signature.r, signature.s).unwrap();
        let recid = RecoveryId::new(signature.y_parity == 1, false);
        let vk = VerifyingKey::recover_from_prehash(hash, &sig, recid).unwrap();
        let point = k256::PublicKey::from(&vk).to_encoded_point(false);
        PublicKey::from_sec1_bytes(point.as_bytes()).unwrap()
    }

    #[test]
    fn eip155_signing_payload_matches_reference() {
        let tx = eip155_example();
        assert_eq!(
            hex::encode(tx.signing_payload(1)),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            hex::encode(tx.signing_hash(1)),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn eip155_signed_transaction_matches_reference() {
        let key = PrivateKey::from_hex(EIP155_KEY).unwrap();
        let signed = eip155_example().sign(&key, 1).unwrap();

        assert_eq!(
            hex::encode(&signed.raw),
            concat!(
                "f86c098504a817c800825208943535353535353535353535353535353535353535",
                "880de0b6b3a76400008025",
                "a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276",
                "a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83",
            )
        );
    }

    #[test]
    fn legacy_signature_recovers_sender() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        let tx = LegacyTransaction::transfer(0, dead(), U256::from(1u64), 1_000_000_000);

        let signed = tx.sign(&key, 11_155_111).unwrap();
        let recovered = recover(&tx.signing_hash(11_155_111), &signed.signature);

        assert_eq!(recovered.address(), key.address());
    }

    #[test]
    fn legacy_v_encodes_chain_id() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        let tx = LegacyTransaction::transfer(0, dead(), U256::ZERO, 1);

        // Sepolia: v = 11155111 * 2 + 35 + parity = 22310257 + parity,
        // a 4-byte integer (0x84 prefix) followed by the 0xa0-prefixed r.
        let signed = tx.sign(&key, 11_155_111).unwrap();
        let v = 22_310_257u64 + u64::from(signed.signature.y_parity);
        let v_rlp = [&[0x84u8][..], &v.to_be_bytes()[4..]].concat();

        assert!(signed.raw.windows(v_rlp.len()).any(|w| w == v_rlp.as_slice()));
    }

    #[test]
    fn legacy_transfer_defaults() {
        let tx = LegacyTransaction::transfer(3, dead(), U256::from(10u64), 5);
        assert_eq!(tx.gas_limit, TRANSFER_GAS_LIMIT);
        assert!(tx.data.is_empty());
    }

    #[test]
    fn legacy_contract_call_carries_data() {
        let data = erc20::encode_decimals().unwrap();
        let tx = LegacyTransaction::contract_call(0, dead(), data.clone(), 1, 60_000);
        assert_eq!(tx.value, U256::ZERO);
        assert_eq!(tx.data, data);

        // The calldata appears as an RLP string (0x84 + 4 bytes) in the payload.
        let payload = tx.signing_payload(1);
        let needle = [&[0x84u8][..], &data[..]].concat();
        assert!(payload.windows(needle.len()).any(|w| w == needle.as_slice()));
    }

    #[test]
    fn legacy_signing_is_deterministic() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        let tx = LegacyTransaction::transfer(1, dead(), U256::from(7u64), 9);

        let a = tx.sign(&key, 1).unwrap();
        let b = tx.sign(&key, 1).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.raw, tx.sign(&key, 5).unwrap().raw);
    }

    #[test]
    fn eip1559_payload_starts_with_type_byte() {
        let tx = Eip1559Transaction {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 1_000_000_000,
            max_fee_per_gas: 50_000_000_000,
            gas_limit: TRANSFER_GAS_LIMIT,
            to: dead(),
            value: U256::from(1_000_000_000_000_000_000u128),
            data: Vec::new(),
        };

        let payload = tx.signing_payload();
        assert_eq!(payload[0], 0x02);
        assert!(payload.len() > 1);
    }

    #[test]
    fn eip1559_signed_output_shape() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        let tx = Eip1559Transaction::erc20_transfer(
            1,
            5,
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".parse().unwrap(),
            dead(),
            U256::from(100u64),
            1_000_000_000,
            50_000_000_000,
            65_000,
        )
        .unwrap();

        assert_eq!(tx.data.len(), 68);
        assert_eq!(&tx.data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);

        let signed = tx.sign(&key).unwrap();
        assert_eq!(signed.raw[0], 0x02);
        assert_eq!(signed.hash_hex().len(), 66);
        assert!(signed.raw_hex().starts_with("0x02"));
        assert_eq!(signed.hash, keccak256(&signed.raw));
    }

    #[test]
    fn eip1559_signature_recovers_sender() {
        let key = PrivateKey::random();
        let tx = Eip1559Transaction {
            chain_id: 137,
            nonce: 42,
            max_priority_fee_per_gas: 100,
            max_fee_per_gas: 200,
            gas_limit: TRANSFER_GAS_LIMIT,
            to: dead(),
            value: U256::ZERO,
            data: Vec::new(),
        };

        let signed = tx.sign(&key).unwrap();
        let recovered = recover(&tx.signing_hash(), &signed.signature);
        assert_eq!(recovered.address(), key.address());
    }

    #[test]
    fn eip1559_chains_differ() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        let mut tx = Eip1559Transaction {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 100,
            max_fee_per_gas: 200,
            gas_limit: TRANSFER_GAS_LIMIT,
            to: dead(),
            value: U256::ZERO,
            data: Vec::new(),
        };

        let mainnet = tx.sign(&key).unwrap();
        tx.chain_id = 137;
        let polygon = tx.sign(&key).unwrap();
        assert_ne!(mainnet.raw, polygon.raw);
    }

    #[test]
    fn gas_price_floor() {
        assert_eq!(effective_gas_price(1_000_000_000, 10_000_000_000), 10_000_000_000);
        assert_eq!(effective_gas_price(30_000_000_000, 10_000_000_000), 30_000_000_000);
    }

    #[test]
    fn rlp_u256_zero_encodes_as_empty_string() {
        let mut buf = Vec::new();
        RlpU256([0u8; 32]).encode(&mut buf);
        assert_eq!(buf, vec![0x80]);
    }

    #[test]
    fn rlp_u256_small_value_is_single_byte() {
        let mut value = [0u8; 32];
        value[31] = 42;

        let mut buf = Vec::new();
        RlpU256(value).encode(&mut buf);
        assert_eq!(buf, vec![42]);
    }

    #[test]
    fn rlp_address_is_20_byte_string() {
        let mut buf = Vec::new();
        RlpAddress([0xde; 20]).encode(&mut buf);

        assert_eq!(buf.len(), 21);
        assert_eq!(buf[0], 0x94);
        assert_eq!(&buf[1..], &[0xde; 20]);
    }

    #[test]
    fn rlp_empty_bytes_is_empty_string() {
        let mut buf = Vec::new();
        RlpBytes(Vec::new()).encode(&mut buf);
        assert_eq!(buf, vec![0x80]);
    }
}

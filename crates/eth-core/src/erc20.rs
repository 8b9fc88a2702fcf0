use alloy_primitives::U256;

use crate::abi::{
    decode_topic_address, decode_uint256, encode_call_tokens, event_topic, Token,
};
use crate::address::Address;
use crate::error::EthError;

pub const TRANSFER: &str = "transfer(address,uint256)";
pub const BALANCE_OF: &str = "balanceOf(address)";
pub const DECIMALS: &str = "decimals()";
pub const APPROVE: &str = "approve(address,uint256)";
pub const ALLOWANCE: &str = "allowance(address,address)";
pub const TRANSFER_FROM: &str = "transferFrom(address,address,uint256)";
pub const TOTAL_SUPPLY: &str = "totalSupply()";

pub const TRANSFER_EVENT: &str = "Transfer(address,address,uint256)";

/// A decoded `Transfer` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// Encodes `transfer(address,uint256)`.
///
/// Returns 68 bytes: the selector plus two ABI words.
pub fn encode_transfer(to: Address, amount: U256) -> Result<Vec<u8>, EthError> {
    encode_call_tokens(TRANSFER, &[Token::Address(to), Token::Uint(amount)])
}

/// Encodes `balanceOf(address)`.
pub fn encode_balance_of(owner: Address) -> Result<Vec<u8>, EthError> {
    encode_call_tokens(BALANCE_OF, &[Token::Address(owner)])
}

/// Encodes `decimals()`. The result is the bare selector.
pub fn encode_decimals() -> Result<Vec<u8>, EthError> {
    encode_call_tokens(DECIMALS, &[])
}

/// Encodes `approve(address,uint256)`.
pub fn encode_approve(spender: Address, amount: U256) -> Result<Vec<u8>, EthError> {
    encode_call_tokens(APPROVE, &[Token::Address(spender), Token::Uint(amount)])
}

/// Encodes `allowance(address,address)`.
pub fn encode_allowance(owner: Address, spender: Address) -> Result<Vec<u8>, EthError> {
    encode_call_tokens(ALLOWANCE, &[Token::Address(owner), Token::Address(spender)])
}

/// Encodes `transferFrom(address,address,uint256)`. The caller must hold an
/// allowance from `from` of at least `amount`.
pub fn encode_transfer_from(
    from: Address,
    to: Address,
    amount: U256,
) -> Result<Vec<u8>, EthError> {
    encode_call_tokens(
        TRANSFER_FROM,
        &[Token::Address(from), Token::Address(to), Token::Uint(amount)],
    )
}

/// Encodes `totalSupply()`.
pub fn encode_total_supply() -> Result<Vec<u8>, EthError> {
    encode_call_tokens(TOTAL_SUPPLY, &[])
}

/// Decodes the return value of `decimals()`.
pub fn decode_decimals(data: &[u8]) -> Result<u8, EthError> {
    let value = decode_uint256(data)?;
    u8::try_from(value)
        .map_err(|_| EthError::DecodingError(format!("decimals out of range: {value}")))
}

/// Decodes a `Transfer` log. `from` and `to` are indexed and sit in
/// `topics[1..3]`; `value` is the log data.
pub fn decode_transfer_log(topics: &[[u8; 32]], data: &[u8]) -> Result<TransferEvent, EthError> {
    let [signature, from, to] = topics else {
        return Err(EthError::DecodingError(format!(
            "Transfer log needs 3 topics, got {}",
            topics.len()
        )));
    };
    if *signature != event_topic(TRANSFER_EVENT)? {
        return Err(EthError::DecodingError("not a Transfer log".into()));
    }

    Ok(TransferEvent {
        from: decode_topic_address(from)?,
        to: decode_topic_address(to)?,
        value: decode_uint256(data)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dead() -> Address {
        "0x000000000000000000000000000000000000dEaD".parse().unwrap()
    }

    fn usdc() -> Address {
        "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".parse().unwrap()
    }

    #[test]
    fn encode_transfer_layout() {
        let data = encode_transfer(dead(), U256::from(100u64)).unwrap();

        // 4 (selector) + 32 (address) + 32 (amount) = 68 bytes.
        assert_eq!(data.len(), 68);
        assert_eq!(hex::encode(&data[..4]), "a9059cbb");
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(data[34], 0xde);
        assert_eq!(data[35], 0xad);
        assert_eq!(&data[36..67], &[0u8; 31]);
        assert_eq!(data[67], 0x64);
    }

    #[test]
    fn encode_transfer_one_token_full_calldata() {
        let to: Address = "0xdead000000000000000000000000000000000000".parse().unwrap();
        let amount = U256::from(1_000_000_000_000_000_000u128);

        let data = encode_transfer(to, amount).unwrap();

        let expected = concat!(
            "a9059cbb",
            "000000000000000000000000dead000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000de0b6b3a7640000",
        );
        assert_eq!(hex::encode(data), expected);
    }

    #[test]
    fn encode_balance_of_layout() {
        let data = encode_balance_of(dead()).unwrap();
        assert_eq!(data.len(), 36);
        assert_eq!(hex::encode(&data[..4]), "70a08231");
    }

    #[test]
    fn encode_decimals_is_selector() {
        assert_eq!(hex::encode(encode_decimals().unwrap()), "313ce567");
    }

    #[test]
    fn encode_approve_layout() {
        let data = encode_approve(usdc(), U256::MAX).unwrap();
        assert_eq!(data.len(), 68);
        assert_eq!(hex::encode(&data[..4]), "095ea7b3");
        assert_eq!(&data[36..], &[0xff; 32]);
    }

    #[test]
    fn encode_allowance_layout() {
        let data = encode_allowance(dead(), usdc()).unwrap();
        assert_eq!(data.len(), 68);
        assert_eq!(hex::encode(&data[..4]), "dd62ed3e");
        assert_eq!(&data[48..68], usdc().as_bytes());
    }

    #[test]
    fn encode_transfer_from_layout() {
        let data = encode_transfer_from(dead(), usdc(), U256::from(5u64)).unwrap();
        assert_eq!(data.len(), 4 + 3 * 32);
        assert_eq!(hex::encode(&data[..4]), "23b872dd");
        assert_eq!(&data[16..36], dead().as_bytes());
        assert_eq!(&data[48..68], usdc().as_bytes());
        assert_eq!(data[99], 5);
    }

    #[test]
    fn encode_total_supply_is_selector() {
        assert_eq!(hex::encode(encode_total_supply().unwrap()), "18160ddd");
    }

    #[test]
    fn decode_decimals_valid() {
        let mut data = [0u8; 32];
        data[31] = 18;
        assert_eq!(decode_decimals(&data).unwrap(), 18);
    }

    #[test]
    fn decode_decimals_out_of_range() {
        let mut data = [0u8; 32];
        data[30] = 1;
        assert!(matches!(
            decode_decimals(&data),
            Err(EthError::DecodingError(_))
        ));
    }

    #[test]
    fn decode_decimals_too_short() {
        assert!(decode_decimals(&[18u8]).is_err());
    }

    #[test]
    fn decode_transfer_log_fields() {
        let topics = [
            event_topic(TRANSFER_EVENT).unwrap(),
            Token::Address(usdc()).to_word(),
            Token::Address(dead()).to_word(),
        ];
        let data = Token::Uint(U256::from(1_500_000u64)).to_word();

        let event = decode_transfer_log(&topics, &data).unwrap();
        assert_eq!(event.from, usdc());
        assert_eq!(event.to, dead());
        assert_eq!(event.value, U256::from(1_500_000u64));
    }

    #[test]
    fn decode_transfer_log_rejects_other_events() {
        let data = [0u8; 32];
        let approval = [
            event_topic("Approval(address,address,uint256)").unwrap(),
            Token::Address(usdc()).to_word(),
            Token::Address(dead()).to_word(),
        ];
        assert!(matches!(
            decode_transfer_log(&approval, &data),
            Err(EthError::DecodingError(_))
        ));
        assert!(decode_transfer_log(&approval[..1], &data).is_err());
    }
}

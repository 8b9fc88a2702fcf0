use alloy_primitives::U256;

use crate::error::EthError;

/// Decimals of the native currency (1 ether = 10^18 wei).
pub const ETHER_DECIMALS: u8 = 18;

/// Largest decimals value whose scale, 10^decimals, still fits in a U256.
pub const MAX_DECIMALS: u8 = 77;

fn scale(decimals: u8) -> Result<U256, EthError> {
    if decimals > MAX_DECIMALS {
        return Err(EthError::InvalidAmount(format!(
            "decimals must be at most {MAX_DECIMALS}, got {decimals}"
        )));
    }
    Ok(U256::from(10u64).pow(U256::from(decimals)))
}

fn parse_digits(digits: &str) -> Result<U256, EthError> {
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EthError::InvalidAmount(format!("not a decimal number: {digits}")));
    }
    U256::from_str_radix(digits, 10)
        .map_err(|e| EthError::InvalidAmount(format!("{digits}: {e}")))
}

/// Converts a human-readable amount such as `"1.5"` into base units with
/// `decimals` fractional digits.
///
/// Arithmetic is exact. An amount with more fractional digits than `decimals`
/// is rejected rather than rounded.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, EthError> {
    let scale = scale(decimals)?;
    let amount = amount.trim();

    let (int_part, frac_part) = match amount.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (amount, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(EthError::InvalidAmount("empty amount".into()));
    }
    if frac_part.len() > decimals as usize {
        return Err(EthError::InvalidAmount(format!(
            "{} fractional digits exceed token precision of {decimals}",
            frac_part.len()
        )));
    }

    let int_value = parse_digits(int_part)?;
    let frac_value = parse_digits(frac_part)?;
    // Weight of the last written fractional digit: 10^(decimals - frac_len).
    let frac_weight = scale / U256::from(10u64).pow(U256::from(frac_part.len()));

    int_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value * frac_weight))
        .ok_or_else(|| EthError::InvalidAmount(format!("{amount} overflows uint256")))
}

/// Formats base units as a decimal string with trailing fractional zeros
/// removed, e.g. `1500000` with 6 decimals becomes `"1.5"`.
pub fn format_units(value: U256, decimals: u8) -> Result<String, EthError> {
    Ok(format_scaled(value, scale(decimals)?, decimals))
}

fn format_scaled(value: U256, scale: U256, decimals: u8) -> String {
    let int_part = value / scale;
    let frac_part = value % scale;

    if frac_part.is_zero() {
        return int_part.to_string();
    }

    let frac = format!("{:0>width$}", frac_part.to_string(), width = decimals as usize);
    format!("{int_part}.{}", frac.trim_end_matches('0'))
}

/// Parses an ether amount into wei.
pub fn parse_ether(amount: &str) -> Result<U256, EthError> {
    parse_units(amount, ETHER_DECIMALS)
}

/// Formats wei as ether.
pub fn format_ether(wei: U256) -> String {
    let scale = U256::from(10u64).pow(U256::from(ETHER_DECIMALS));
    format_scaled(wei, scale, ETHER_DECIMALS)
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Exact conversion between integer plank amounts and human decimals.
//!
//! On-chain values stay in `U256` plank until a formatting or payout boundary,
//! where they become `rust_decimal::Decimal`. Nothing in here touches floats.

use alloy::primitives::U256;
use rust_decimal::Decimal;

/// Largest scale `Decimal` can represent.
const MAX_DECIMAL_SCALE: u8 = 28;

/// Denominator of a perbill fraction.
const PERBILL: u32 = 1_000_000_000;

/// Errors from parsing human-readable amounts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("Too many decimal places (max {0})")]
    TooManyDecimals(u8),

    #[error("Amount overflow")]
    Overflow,
}

/// Convert a plank amount into a decimal with `precision` fractional digits.
///
/// Returns `None` when the value does not fit a `Decimal` (96-bit mantissa).
pub fn to_decimal(value: U256, precision: u8) -> Option<Decimal> {
    if precision > MAX_DECIMAL_SCALE {
        return None;
    }
    let raw = u128::try_from(value).ok()?;
    let signed = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(signed, u32::from(precision))
        .ok()
        .map(|d| d.normalize())
}

/// Convert a perbill integer (parts per billion) into a fraction in `[0, 1]`.
pub fn perbill_to_fraction(perbill: u32) -> Option<Decimal> {
    if perbill > PERBILL {
        return None;
    }
    Some(Decimal::new(i64::from(perbill), 9).normalize())
}

/// Convert a decimal back into plank, truncating digits beyond `precision`.
pub fn decimal_to_plank(value: Decimal, precision: u8) -> Option<U256> {
    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    let mantissa = U256::from(value.mantissa().unsigned_abs());
    let scale = value.scale();
    let precision = u32::from(precision);

    if precision >= scale {
        let factor = U256::from(10u64).checked_pow(U256::from(precision - scale))?;
        mantissa.checked_mul(factor)
    } else {
        let divisor = U256::from(10u64).checked_pow(U256::from(scale - precision))?;
        Some(mantissa / divisor)
    }
}

/// Parse a human-readable amount to plank (or token units).
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals (18 for AVAX, 6 for USDC)
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let parts: Vec<&str> = amount.trim().split('.').collect();

    if parts.len() > 2 || parts[0].is_empty() {
        return Err(AmountError::InvalidFormat(amount.to_string()));
    }

    let whole = U256::from_str_radix(parts[0], 10)
        .map_err(|_| AmountError::InvalidFormat(amount.to_string()))?;

    let fraction = if parts.len() == 2 {
        let dec_str = parts[1];
        if dec_str.len() > decimals as usize {
            return Err(AmountError::TooManyDecimals(decimals));
        }
        if dec_str.is_empty() {
            U256::ZERO
        } else {
            // Pad with zeros to match decimals
            let padded = format!("{:0<width$}", dec_str, width = decimals as usize);
            U256::from_str_radix(&padded, 10)
                .map_err(|_| AmountError::InvalidFormat(amount.to_string()))?
        }
    } else {
        U256::ZERO
    };

    let multiplier = U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or(AmountError::Overflow)?;

    whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(AmountError::Overflow)
}

/// Format plank (or token units) as a human-readable amount.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }
}

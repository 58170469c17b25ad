// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hex-string decoding for addresses and chain identifiers.
//!
//! Every address and chain id reaches the engine as a hex string. These
//! helpers turn them into raw bytes and fail loudly on malformed input; callers
//! propagate the error instead of substituting defaults.

use alloy::primitives::Address;

/// Length of an EVM account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Errors produced while decoding hex-encoded identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),
}

/// Decode a hex string (with or without `0x`) into raw bytes.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, AddressError> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    alloy::hex::decode(digits).map_err(|e| AddressError::InvalidHex(format!("{value}: {e}")))
}

/// Decode a 20-byte EVM address from its hex form.
///
/// Checksums are not enforced; mixed-case input is accepted as plain hex.
pub fn parse_address(value: &str) -> Result<Address, AddressError> {
    let bytes = decode_hex(value)?;
    if bytes.len() != ADDRESS_LEN {
        return Err(AddressError::InvalidLength {
            expected: ADDRESS_LEN,
            actual: bytes.len(),
        });
    }
    Ok(Address::from_slice(&bytes))
}

/// Decode a hex chain id (e.g. `"0xa86a"`) into its numeric value.
pub fn parse_chain_id(value: &str) -> Result<u64, AddressError> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(AddressError::InvalidChainId(value.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|e| AddressError::InvalidChainId(format!("{value}: {e}")))
}

/// Encode a numeric chain id as the `0x`-prefixed hex form used on the wire.
pub fn chain_id_to_hex(chain_id: u64) -> String {
    format!("{chain_id:#x}")
}

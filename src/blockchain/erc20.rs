// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 token call encoding.
//!
//! The token transfer payload is fully static (selector plus ABI-encoded
//! `address,uint256`), so it is produced from the `sol!` definition directly
//! without any contract instance or runtime ABI lookup.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

// Define the ERC-20 interface using alloy's sol! macro
sol! {
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// Signature of a token-transfer payload encoder.
///
/// The engine takes one of these so the encoding step stays a plain function.
pub type TransferCallEncoder = fn(Address, U256) -> Bytes;

/// Encode `transfer(to, amount)` call data.
pub fn transfer_call_data(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_selector_is_correct() {
        // keccak256("transfer(address,uint256)")[..4]
        assert_eq!(IERC20::transferCall::SELECTOR, [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn transfer_call_layout() {
        let to: Address = "0x76568BEd5Acf1A5Cd888773C8cAe9ea2a9131A63".parse().unwrap();
        let data = transfer_call_data(to, U256::from(1_500_000u64));

        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[..4], &IERC20::transferCall::SELECTOR);
        // Address is left-padded into the first word
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..36], to.as_slice());
        assert_eq!(U256::from_be_slice(&data[36..68]), U256::from(1_500_000u64));
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account id to display address conversion.

use alloy::primitives::Address;

use super::types::AccountId;
use crate::blockchain::address::{decode_hex, AddressError, ADDRESS_LEN};

/// Chain-specific encoding between raw account ids and display addresses.
///
/// SS58 and other chain formats live behind this trait; the payout math only
/// needs the display address to key identity lookups.
pub trait AccountAddressCodec: Send + Sync {
    fn address_from_account_id(&self, account_id: &[u8]) -> Result<String, AddressError>;

    fn account_id_from_address(&self, address: &str) -> Result<AccountId, AddressError>;
}

/// `0x`-hex codec with a fixed account id length.
///
/// 20-byte ids are rendered as EIP-55 checksummed addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexAccountCodec {
    account_id_len: usize,
}

impl HexAccountCodec {
    /// EVM-style 20-byte accounts.
    pub const fn evm() -> Self {
        Self {
            account_id_len: ADDRESS_LEN,
        }
    }

    /// 32-byte public-key accounts.
    pub const fn raw32() -> Self {
        Self { account_id_len: 32 }
    }

    fn check_len(&self, actual: usize) -> Result<(), AddressError> {
        if actual == self.account_id_len {
            Ok(())
        } else {
            Err(AddressError::InvalidLength {
                expected: self.account_id_len,
                actual,
            })
        }
    }
}

impl AccountAddressCodec for HexAccountCodec {
    fn address_from_account_id(&self, account_id: &[u8]) -> Result<String, AddressError> {
        self.check_len(account_id.len())?;
        if account_id.len() == ADDRESS_LEN {
            Ok(Address::from_slice(account_id).to_checksum(None))
        } else {
            Ok(format!("0x{}", alloy::hex::encode(account_id)))
        }
    }

    fn account_id_from_address(&self, address: &str) -> Result<AccountId, AddressError> {
        let bytes = decode_hex(address)?;
        self.check_len(bytes.len())?;
        Ok(bytes)
    }
}

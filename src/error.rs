// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy of the transfer engine.
//!
//! Domain failures get their own variants; failures from address decoding,
//! chain queries and signing pass through untouched so callers can tell a
//! malformed address from a node rejection.

use crate::blockchain::{AddressError, QueryError, SigningError};

/// Reason used when an asset kind cannot be handled.
pub const UNKNOWN_ASSET: &str = "unknown asset";

/// Reason used when token call encoding produced no bytes.
pub const EMPTY_TOKEN_PAYLOAD: &str = "Cannot create ERC20 transfer transaction";

/// Reason used when a transfer's sender is not the engine's signer.
pub const SENDER_MISMATCH: &str = "sender does not match signer";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("Cannot estimate fee: {0}")]
    CannotEstimateFee(String),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Signing(#[from] SigningError),
}

impl TransferError {
    pub fn unknown_asset_fee() -> Self {
        Self::CannotEstimateFee(UNKNOWN_ASSET.to_string())
    }

    pub fn unknown_asset_transfer() -> Self {
        Self::TransferFailed(UNKNOWN_ASSET.to_string())
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM transfer construction.
//!
//! This module provides functionality for:
//! - Fee estimation under legacy and EIP-1559 fee markets
//! - Native coin and ERC-20 transfer building, signing and broadcasting
//! - Head-driven fee subscriptions
//! - Exact plank/decimal amount conversion

pub mod address;
pub mod amount;
pub mod erc20;
pub mod fee_subscription;
pub mod query;
pub mod signing;
pub mod transfer;
pub mod types;

pub use address::{parse_address, parse_chain_id, AddressError};
pub use amount::{decimal_to_plank, format_amount, parse_amount, perbill_to_fraction, to_decimal, AmountError};
pub use fee_subscription::{FeeSubscription, FeeUpdate};
pub use query::{AlloyQueryService, CallRequest, ChainQueryService, HeadNotification, HeadStream, QueryError};
pub use signing::{LocalTransactionSigner, SigningError, TransactionSigner};
pub use transfer::{FeeCapStrategy, TransferEngine};
pub use types::*;

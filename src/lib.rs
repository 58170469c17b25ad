// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Chain Core - Transfers and Staking Payouts
//!
//! This crate builds, signs and submits native coin and ERC-20 transfers on
//! EVM chains (legacy and EIP-1559 fee markets), streams fee quotes as new
//! blocks arrive, and computes validator payouts from past-era data.
//!
//! ## Modules
//!
//! - `blockchain` - Transfer engine, fee subscriptions, signing and chain queries
//! - `staking` - Exact-decimal validator payout calculator
//! - `config` - Environment configuration
//! - `error` - Transfer errors
//! - `logging` - Tracing subscriber setup

pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod staking;

pub use blockchain::{
    AlloyQueryService, ChainQueryService, FeeCapStrategy, FeeQuote, FeeSubscription, LocalTransactionSigner,
    TransactionSigner, Transfer, TransferEngine,
};
pub use error::TransferError;
pub use staking::{PayoutCalculator, PayoutInfo};

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Staking payout math over past-era aggregates.

pub mod codec;
pub mod payout;
pub mod types;

pub use codec::{AccountAddressCodec, HexAccountCodec};
pub use payout::{PayoutCalculator, RewardBreakdown};
pub use types::*;

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Era data snapshots and payout results.

use std::collections::BTreeMap;

use alloy::primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::blockchain::amount::decimal_to_plank;

/// Staking era number.
pub type EraIndex = u32;

/// Raw on-chain account identifier.
pub type AccountId = Vec<u8>;

/// Stake backing a validator in one era, in plank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exposure {
    /// Validator's self-stake
    pub own: U256,
    /// Self-stake plus nominator stake
    pub total: U256,
}

/// Validator preferences for one era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidatorPrefs {
    /// Commission in parts per billion
    pub commission: u32,
    pub blocked: bool,
}

/// Snapshot of one validator in one era.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EraValidatorInfo {
    pub account_id: AccountId,
    pub exposure: Exposure,
    pub prefs: ValidatorPrefs,
}

/// Reward points earned in one era.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EraRewardPoints {
    pub total: u32,
    pub individual: Vec<(AccountId, u32)>,
}

impl EraRewardPoints {
    /// Points earned by `account_id`, if it earned any entry at all.
    pub fn points_of(&self, account_id: &[u8]) -> Option<u32> {
        self.individual
            .iter()
            .find(|(id, _)| id.as_slice() == account_id)
            .map(|(_, points)| *points)
    }
}

/// Era-wide reward pools and point distributions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErasRewardDistribution {
    /// Reward pool for all validators per era, in plank
    pub total_validator_reward_by_era: BTreeMap<EraIndex, U256>,
    pub validator_points_distribution_by_era: BTreeMap<EraIndex, EraRewardPoints>,
}

/// On-chain identity registered for an address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

/// Payout owed to a validator for one past era.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutInfo {
    pub era: EraIndex,
    pub validator_account_id: AccountId,
    /// Display address derived from the account id
    pub validator_address: String,
    /// Stake reward plus commission, in display units
    pub reward: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<AccountIdentity>,
}

impl PayoutInfo {
    /// Reward in plank, truncated at `precision` digits.
    pub fn reward_in_plank(&self, precision: u8) -> Option<U256> {
        decimal_to_plank(self.reward, precision)
    }
}

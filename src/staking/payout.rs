// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Validator Payouts
//!
//! Computes what a validator earned for a past era from era-wide aggregates:
//!
//! ```text
//! reward_fraction  = validator_points / total_points
//! validator_total  = total_reward * reward_fraction
//! stake_reward     = validator_total * (1 - commission) * (own_stake / total_stake)
//! commission_reward = validator_total * commission
//! reward           = stake_reward + commission_reward
//! ```
//!
//! All arithmetic is checked `Decimal`. Missing era data, a validator without
//! points, zero denominators, or values that do not fit a `Decimal` are soft
//! misses (`Ok(None)`). Only address encoding can fail hard.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tracing::trace;

use super::codec::AccountAddressCodec;
use super::types::{AccountIdentity, EraIndex, EraValidatorInfo, ErasRewardDistribution, PayoutInfo};
use crate::blockchain::address::AddressError;
use crate::blockchain::amount::{perbill_to_fraction, to_decimal};

/// Intermediate reward split for one validator in one era.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardBreakdown {
    pub validator_total_reward: Decimal,
    pub stake_reward: Decimal,
    pub commission_reward: Decimal,
}

impl RewardBreakdown {
    pub fn payout(&self) -> Option<Decimal> {
        self.stake_reward.checked_add(self.commission_reward)
    }
}

/// Pure payout calculator for one staking asset.
#[derive(Debug, Clone)]
pub struct PayoutCalculator<C> {
    precision: u8,
    codec: C,
}

impl<C: AccountAddressCodec> PayoutCalculator<C> {
    /// `precision` is the number of fractional digits of the staking asset.
    pub fn new(precision: u8, codec: C) -> Self {
        Self { precision, codec }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Payout owed to `validator` for `era`, or `None` when it cannot be computed.
    pub fn calculate(
        &self,
        era: EraIndex,
        validator: &EraValidatorInfo,
        distribution: &ErasRewardDistribution,
        identities: &HashMap<String, AccountIdentity>,
    ) -> Result<Option<PayoutInfo>, AddressError> {
        let Some(reward) = self
            .reward_breakdown(era, validator, distribution)
            .and_then(|breakdown| breakdown.payout())
        else {
            trace!(era, "No payout computable");
            return Ok(None);
        };

        let validator_address = self.codec.address_from_account_id(&validator.account_id)?;
        let identity = identities.get(&validator_address).cloned();

        Ok(Some(PayoutInfo {
            era,
            validator_account_id: validator.account_id.clone(),
            validator_address,
            reward,
            identity,
        }))
    }

    /// Payouts for every validator of every era, in ascending era order.
    ///
    /// Validators keep their input order within an era. Soft misses are skipped.
    pub fn calculate_all(
        &self,
        validators_by_era: &BTreeMap<EraIndex, Vec<EraValidatorInfo>>,
        distribution: &ErasRewardDistribution,
        identities: &HashMap<String, AccountIdentity>,
    ) -> Result<Vec<PayoutInfo>, AddressError> {
        let mut payouts = Vec::new();
        for (era, validators) in validators_by_era {
            for validator in validators {
                if let Some(payout) = self.calculate(*era, validator, distribution, identities)? {
                    payouts.push(payout);
                }
            }
        }
        Ok(payouts)
    }

    /// Reward split for `validator` in `era` without address resolution.
    pub fn reward_breakdown(
        &self,
        era: EraIndex,
        validator: &EraValidatorInfo,
        distribution: &ErasRewardDistribution,
    ) -> Option<RewardBreakdown> {
        let total_reward = distribution
            .total_validator_reward_by_era
            .get(&era)
            .and_then(|reward| to_decimal(*reward, self.precision))?;
        let points = distribution.validator_points_distribution_by_era.get(&era)?;

        let own_stake = to_decimal(validator.exposure.own, self.precision)?;
        let total_stake = to_decimal(validator.exposure.total, self.precision)?;
        let commission = perbill_to_fraction(validator.prefs.commission)?;
        let validator_points = points.points_of(&validator.account_id)?;

        let reward_fraction = Decimal::from(validator_points).checked_div(Decimal::from(points.total))?;
        let validator_total_reward = total_reward.checked_mul(reward_fraction)?;

        let stake_share = own_stake.checked_div(total_stake)?;
        let stake_reward = validator_total_reward
            .checked_mul(Decimal::ONE.checked_sub(commission)?)?
            .checked_mul(stake_share)?;
        let commission_reward = validator_total_reward.checked_mul(commission)?;

        Some(RewardBreakdown {
            validator_total_reward,
            stake_reward,
            commission_reward,
        })
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! by the `fee-watch` binary and anything else embedding the engine.
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RPC_WS_URL` | WebSocket JSON-RPC endpoint | Preset endpoint of `NETWORK` |
//! | `NETWORK` | Network preset (`fuji` or `mainnet`) | `fuji` |
//! | `FEE_CAP_STRATEGY` | Fee caps for submissions (`legacy-compatible` or `market-aware`) | `legacy-compatible` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::str::FromStr;

use crate::blockchain::transfer::FeeCapStrategy;
use crate::blockchain::types::{network_by_name, NetworkConfig};

/// Environment variable name for the WebSocket RPC endpoint.
///
/// Must point at a node that supports `eth_subscribe("newHeads")`.
///
/// # Default
/// The public endpoint of the selected network preset
pub const RPC_WS_URL_ENV: &str = "RPC_WS_URL";

/// Environment variable name for the network preset.
///
/// # Default
/// `fuji` (Avalanche testnet)
pub const NETWORK_ENV: &str = "NETWORK";

/// Environment variable name for the submission fee-cap strategy.
pub const FEE_CAP_STRATEGY_ENV: &str = "FEE_CAP_STRATEGY";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_NETWORK: &str = "fuji";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            _ => Err(()),
        }
    }
}

/// Settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub rpc_ws_url: String,
    pub network: NetworkConfig,
    pub fee_cap_strategy: FeeCapStrategy,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network_name = lookup(NETWORK_ENV).unwrap_or_else(|| DEFAULT_NETWORK.to_string());
        let network = network_by_name(&network_name).ok_or(ConfigError::Invalid {
            name: NETWORK_ENV,
            value: network_name,
        })?;

        let rpc_ws_url = lookup(RPC_WS_URL_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| network.ws_url.to_string());

        let fee_cap_strategy = match lookup(FEE_CAP_STRATEGY_ENV) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: FEE_CAP_STRATEGY_ENV,
                value,
            })?,
            None => FeeCapStrategy::default(),
        };

        let log_format = match lookup(LOG_FORMAT_ENV) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                value,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            rpc_ws_url,
            network,
            fee_cap_strategy,
            log_format,
        })
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `fee-watch`: stream EIP-1559 fee quotes for a native or token transfer.
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `FEE_WATCH_FROM` | Sender address |
//! | `FEE_WATCH_TO` | Receiver address |
//! | `FEE_WATCH_AMOUNT` | Amount in display units (e.g. `0.25`) |
//! | `FEE_WATCH_ASSET` | `AVAX` (default), `USDC` or `rEUR` |
//!
//! Connection, network and logging settings come from [`ServiceConfig`].

use std::env;
use std::error::Error;
use std::sync::Arc;

use alloy::consensus::TxEip1559;
use alloy::primitives::Address;
use async_trait::async_trait;
use tracing::{info, warn};

use relational_chain_core::blockchain::{
    asset_by_symbol, parse_address, parse_amount, AlloyQueryService, SignedTransactionEnvelope, SigningError,
    TransactionSigner, Transfer, TransferEngine, NATIVE_SYMBOL,
};
use relational_chain_core::config::{ConfigError, ServiceConfig};
use relational_chain_core::logging::init_tracing;

const FROM_ENV: &str = "FEE_WATCH_FROM";
const TO_ENV: &str = "FEE_WATCH_TO";
const AMOUNT_ENV: &str = "FEE_WATCH_AMOUNT";
const ASSET_ENV: &str = "FEE_WATCH_ASSET";

/// Holds an address but no key; quoting never signs.
struct WatchOnlySigner {
    address: Address,
}

#[async_trait]
impl TransactionSigner for WatchOnlySigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_transaction(
        &self,
        _tx: TxEip1559,
        _chain_id: u64,
    ) -> Result<SignedTransactionEnvelope, SigningError> {
        Err(SigningError::Signer("watch-only signer holds no key".to_string()))
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ServiceConfig::from_env()?;
    init_tracing(config.log_format)?;

    let from = required(FROM_ENV)?;
    let to = required(TO_ENV)?;
    let amount = required(AMOUNT_ENV)?;

    let symbol = env::var(ASSET_ENV).unwrap_or_else(|_| NATIVE_SYMBOL.to_string());
    let asset = asset_by_symbol(&symbol, &config.network).ok_or(ConfigError::Invalid {
        name: ASSET_ENV,
        value: symbol,
    })?;

    let value = parse_amount(&amount, asset.precision)?;
    let transfer = Transfer::new(config.network.chain(), asset, from.as_str(), to.as_str(), value);

    let query = AlloyQueryService::connect_ws(&config.rpc_ws_url).await?;
    let signer = WatchOnlySigner {
        address: parse_address(&from)?,
    };
    let engine = TransferEngine::new(Arc::new(query), Arc::new(signer)).with_fee_cap_strategy(config.fee_cap_strategy);

    info!(
        network = config.network.name,
        chain_id = config.network.chain_id,
        asset = %transfer.chain_asset.asset.symbol,
        amount = %amount,
        "Watching fees"
    );

    let mut subscription = engine.subscribe_for_fee(&transfer).await?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            update = subscription.next() => match update {
                Some(Ok(quote)) => match serde_json::to_string(&quote) {
                    Ok(json) => info!(quote = %json, "Fee quote"),
                    Err(e) => warn!(error = %e, "Cannot serialize fee quote"),
                },
                Some(Err(e)) => warn!(error = %e, "Fee estimation failed"),
                None => {
                    warn!("Head subscription ended");
                    break;
                }
            },
        }
    }

    subscription.unsubscribe();
    Ok(())
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain query contract consumed by the transfer engine.
//!
//! The engine only needs a handful of JSON-RPC round-trips (`eth_gasPrice`,
//! `eth_estimateGas`, `eth_getTransactionCount`, `eth_maxPriorityFeePerGas`,
//! `eth_sendRawTransaction`, `eth_subscribe("newHeads")`). They are collected
//! behind [`ChainQueryService`] so the engine can run against any backend;
//! [`AlloyQueryService`] is the production one.

use alloy::{
    consensus::BlockHeader,
    eips::BlockNumberOrTag,
    primitives::{Address, Bytes, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder, WsConnect},
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};

/// Errors raised by chain queries. Reasons carry the node's own message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),
}

/// Fully shaped call used for gas estimation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

impl CallRequest {
    /// Value-carrying call with no payload.
    pub fn native(from: Address, to: Address, value: U256) -> Self {
        Self {
            from: Some(from),
            to,
            value,
            input: Bytes::new(),
        }
    }

    /// Zero-value contract call from `from` carrying `input`.
    pub fn contract(from: Address, contract: Address, input: Bytes) -> Self {
        Self {
            from: Some(from),
            to: contract,
            value: U256::ZERO,
            input,
        }
    }
}

impl From<&CallRequest> for TransactionRequest {
    fn from(call: &CallRequest) -> Self {
        let mut tx = TransactionRequest::default()
            .to(call.to)
            .value(call.value)
            .input(call.input.clone().into());
        if let Some(from) = call.from {
            tx = tx.from(from);
        }
        tx
    }
}

/// New block head as seen by a `newHeads` subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadNotification {
    pub number: u64,
    /// Absent on chains that predate the EIP-1559 upgrade
    pub base_fee_per_gas: Option<u128>,
}

/// Stream of head notifications; ends when the subscription closes.
pub type HeadStream = BoxStream<'static, Result<HeadNotification, QueryError>>;

/// Network queries the transfer engine depends on.
#[async_trait]
pub trait ChainQueryService: Send + Sync {
    /// `eth_gasPrice`
    async fn gas_price(&self) -> Result<u128, QueryError>;

    /// `eth_estimateGas` for a fully shaped call.
    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, QueryError>;

    /// Next nonce for `address`, including pending transactions.
    async fn transaction_count(&self, address: Address) -> Result<u64, QueryError>;

    /// `eth_maxPriorityFeePerGas`
    async fn max_priority_fee_per_gas(&self) -> Result<u128, QueryError>;

    /// Base fee of the latest block, `None` on pre-EIP-1559 chains.
    async fn base_fee_per_gas(&self) -> Result<Option<u128>, QueryError>;

    /// `eth_sendRawTransaction`; returns the transaction hash.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, QueryError>;

    /// `eth_subscribe("newHeads")`
    async fn subscribe_new_heads(&self) -> Result<HeadStream, QueryError>;
}

/// [`ChainQueryService`] backed by an alloy provider.
pub struct AlloyQueryService<P> {
    provider: P,
}

impl<P: Provider> AlloyQueryService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl AlloyQueryService<DynProvider> {
    /// Connect over WebSocket, which head subscriptions require.
    pub async fn connect_ws(ws_url: &str) -> Result<Self, QueryError> {
        let url: url::Url = ws_url
            .parse()
            .map_err(|e: url::ParseError| QueryError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new()
            .connect_ws(WsConnect::new(url.as_str()))
            .await
            .map_err(|e| QueryError::Rpc(format!("WebSocket connect failed: {}", e)))?
            .erased();

        Ok(Self::new(provider))
    }
}

#[async_trait]
impl<P: Provider + 'static> ChainQueryService for AlloyQueryService<P> {
    async fn gas_price(&self) -> Result<u128, QueryError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| QueryError::Rpc(e.to_string()))
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, QueryError> {
        self.provider
            .estimate_gas(<TransactionRequest as From<&CallRequest>>::from(call))
            .await
            .map_err(|e| QueryError::Rpc(format!("Gas estimation failed: {}", e)))
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, QueryError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| QueryError::Rpc(e.to_string()))
    }

    async fn max_priority_fee_per_gas(&self) -> Result<u128, QueryError> {
        self.provider
            .get_max_priority_fee_per_gas()
            .await
            .map_err(|e| QueryError::Rpc(e.to_string()))
    }

    async fn base_fee_per_gas(&self) -> Result<Option<u128>, QueryError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| QueryError::Rpc(format!("Failed to get block: {}", e)))?
            .ok_or_else(|| QueryError::Rpc("No latest block".to_string()))?;

        Ok(block.header.base_fee_per_gas().map(u128::from))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, QueryError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| QueryError::Rejected(e.to_string()))?;

        Ok(*pending.tx_hash())
    }

    async fn subscribe_new_heads(&self) -> Result<HeadStream, QueryError> {
        let subscription = self
            .provider
            .subscribe_blocks()
            .await
            .map_err(|e| QueryError::Subscription(e.to_string()))?;

        let stream = subscription.into_stream().map(|header| {
            Ok(HeadNotification {
                number: header.number(),
                base_fee_per_gas: header.base_fee_per_gas().map(u128::from),
            })
        });

        Ok(stream.boxed())
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer engine: fee estimation, transaction building, signing and
//! broadcasting for native coin and ERC-20 transfers.
//!
//! Both legacy (`gasPrice`) and EIP-1559 (`baseFeePerGas` + tip) fee
//! markets are supported for estimation. Submitted transactions are always
//! type-2 envelopes whose fee caps come from the engine's [`FeeCapStrategy`].
//!
//! ## Query ordering
//!
//! Gas price and gas limit for a call have no data dependency and are
//! requested concurrently. The nonce is requested last, right before
//! signing, so that a slow fee round-trip cannot leave it stale.

use std::str::FromStr;
use std::sync::Arc;

use alloy::{
    consensus::TxEip1559,
    primitives::{Address, Bytes, TxKind, U256},
};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::address::{parse_address, parse_chain_id};
use super::erc20::{transfer_call_data, TransferCallEncoder};
use super::fee_subscription::FeeSubscription;
use super::query::{CallRequest, ChainQueryService, HeadStream};
use super::signing::TransactionSigner;
use super::types::{AssetKind, Chain, FeeMarket, FeeQuote, GasPricing, SignedTransactionEnvelope, Transfer};
use crate::error::{TransferError, EMPTY_TOKEN_PAYLOAD, SENDER_MISMATCH};

/// How fee caps are filled in on submitted transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeeCapStrategy {
    /// `maxFeePerGas = maxPriorityFeePerGas = gasPrice`.
    ///
    /// The whole gas price is offered as tip, so the transaction pays what a
    /// legacy transaction at `gasPrice` would. Mirrors the behaviour wallets
    /// on this stack have always shipped with.
    #[default]
    LegacyCompatible,
    /// `maxFeePerGas = 2 * baseFee + tip`, `maxPriorityFeePerGas = tip`.
    ///
    /// Falls back to `LegacyCompatible` when the chain reports no base fee.
    MarketAware,
}

impl FromStr for FeeCapStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "legacy-compatible" | "legacy" => Ok(Self::LegacyCompatible),
            "market-aware" | "eip1559" => Ok(Self::MarketAware),
            other => Err(format!("Unknown fee cap strategy `{other}`")),
        }
    }
}

/// Fee caps applied to a type-2 transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FeeCaps {
    max_fee_per_gas: u128,
    max_priority_fee_per_gas: u128,
}

/// Builds, signs and submits transfers for one signer.
///
/// Holds no per-request state; clones share the query service and signer.
pub struct TransferEngine<Q, S> {
    query: Arc<Q>,
    signer: Arc<S>,
    strategy: FeeCapStrategy,
    encode_transfer_call: TransferCallEncoder,
}

impl<Q, S> Clone for TransferEngine<Q, S> {
    fn clone(&self) -> Self {
        Self {
            query: Arc::clone(&self.query),
            signer: Arc::clone(&self.signer),
            strategy: self.strategy,
            encode_transfer_call: self.encode_transfer_call,
        }
    }
}

impl<Q, S> TransferEngine<Q, S>
where
    Q: ChainQueryService + 'static,
    S: TransactionSigner + 'static,
{
    pub fn new(query: Arc<Q>, signer: Arc<S>) -> Self {
        Self {
            query,
            signer,
            strategy: FeeCapStrategy::default(),
            encode_transfer_call: transfer_call_data,
        }
    }

    pub fn with_fee_cap_strategy(mut self, strategy: FeeCapStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replace the ERC-20 `transfer` payload encoder.
    pub fn with_call_encoder(mut self, encoder: TransferCallEncoder) -> Self {
        self.encode_transfer_call = encoder;
        self
    }

    // =========================================================================
    // Fee estimation
    // =========================================================================

    /// Estimate the fee under the legacy market: `gasLimit * gasPrice`.
    pub async fn estimate_fee(&self, transfer: &Transfer) -> Result<FeeQuote, TransferError> {
        let call = self.estimate_call(transfer)?;

        let (gas_price, gas_limit) = tokio::try_join!(
            self.query.gas_price(),
            self.query.estimate_gas(&call)
        )?;

        let total_fee = U256::from(gas_limit) * U256::from(gas_price);
        debug!(
            asset = transfer.asset_kind().label(),
            gas_limit,
            gas_price,
            total_fee = %total_fee,
            "Legacy fee estimated"
        );

        Ok(FeeQuote::new(
            transfer,
            GasPricing::Legacy { gas_price },
            gas_limit,
            total_fee,
        ))
    }

    /// Estimate the fee under EIP-1559:
    /// `gasLimit * (baseFeePerGas + maxPriorityFeePerGas)`.
    ///
    /// The priority fee is always queried fresh.
    pub async fn estimate_fee_eip1559(
        &self,
        transfer: &Transfer,
        base_fee_per_gas: u128,
    ) -> Result<FeeQuote, TransferError> {
        let call = self.estimate_call(transfer)?;

        let (max_priority_fee_per_gas, gas_limit) = tokio::try_join!(
            self.query.max_priority_fee_per_gas(),
            self.query.estimate_gas(&call)
        )?;

        let per_gas = U256::from(base_fee_per_gas) + U256::from(max_priority_fee_per_gas);
        let total_fee = U256::from(gas_limit) * per_gas;
        debug!(
            asset = transfer.asset_kind().label(),
            gas_limit,
            base_fee_per_gas,
            max_priority_fee_per_gas,
            total_fee = %total_fee,
            "EIP-1559 fee estimated"
        );

        Ok(FeeQuote::new(
            transfer,
            GasPricing::Eip1559 {
                base_fee_per_gas,
                max_fee_per_gas: base_fee_per_gas.saturating_add(max_priority_fee_per_gas),
                max_priority_fee_per_gas,
            },
            gas_limit,
            total_fee,
        ))
    }

    /// Estimate with whichever market the transfer's chain runs.
    ///
    /// On EIP-1559 chains the base fee of the latest block is used.
    pub async fn estimate_fee_for_market(&self, transfer: &Transfer) -> Result<FeeQuote, TransferError> {
        match transfer.chain().fee_market {
            FeeMarket::Legacy => self.estimate_fee(transfer).await,
            FeeMarket::Eip1559 => {
                if matches!(transfer.asset_kind(), AssetKind::Unsupported(_)) {
                    return Err(TransferError::unknown_asset_fee());
                }
                let base_fee = self.query.base_fee_per_gas().await?.ok_or_else(|| {
                    TransferError::CannotEstimateFee("chain reported no baseFeePerGas".to_string())
                })?;
                self.estimate_fee_eip1559(transfer, base_fee).await
            }
        }
    }

    /// Stream EIP-1559 fee estimates, one per new block head.
    ///
    /// See [`FeeSubscription`] for delivery and cancellation rules. A head
    /// subscription that cannot be opened is reported to the listener as a
    /// single `CannotEstimateFee` delivery, after which the stream ends.
    pub async fn subscribe_for_fee(&self, transfer: &Transfer) -> Result<FeeSubscription, TransferError> {
        if matches!(transfer.asset_kind(), AssetKind::Unsupported(_)) {
            return Err(TransferError::unknown_asset_fee());
        }

        let heads: HeadStream = match self.query.subscribe_new_heads().await {
            Ok(heads) => heads,
            Err(e) => {
                warn!(error = %e, "Cannot open head subscription");
                stream::once(async move { Err(e) }).boxed()
            }
        };
        let engine = self.clone();
        let transfer = transfer.clone();

        Ok(FeeSubscription::spawn(heads, move |base_fee| {
            let engine = engine.clone();
            let transfer = transfer.clone();
            async move { engine.estimate_fee_eip1559(&transfer, base_fee).await }
        }))
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Build, sign and broadcast a transfer; returns the `0x` transaction hash.
    ///
    /// Single-shot: nothing is retried here. A failed submission must be
    /// re-invoked by the caller, which fetches a fresh nonce.
    pub async fn submit(&self, transfer: &Transfer) -> Result<String, TransferError> {
        match transfer.asset_kind() {
            AssetKind::Native => self.submit_native(transfer).await,
            AssetKind::Erc20 { contract } => self.submit_token(transfer, contract).await,
            AssetKind::Unsupported(_) => Err(TransferError::unknown_asset_transfer()),
        }
    }

    /// Submit only if `quote` was computed for exactly this transfer.
    pub async fn submit_with_quote(&self, transfer: &Transfer, quote: &FeeQuote) -> Result<String, TransferError> {
        if !quote.is_valid_for(transfer) {
            return Err(TransferError::TransferFailed("fee quote is stale".to_string()));
        }
        self.submit(transfer).await
    }

    async fn submit_native(&self, transfer: &Transfer) -> Result<String, TransferError> {
        let receiver = parse_address(&transfer.receiver)?;
        let sender = parse_address(&transfer.sender)?;
        let chain_id = parse_chain_id(&transfer.chain().chain_id)?;

        let call = CallRequest::native(sender, receiver, transfer.amount);
        let tx = self.build_transaction(sender, call).await?;

        self.sign_and_broadcast(tx, chain_id, transfer).await
    }

    async fn submit_token(&self, transfer: &Transfer, contract: &str) -> Result<String, TransferError> {
        let receiver = parse_address(&transfer.receiver)?;
        let sender = parse_address(&transfer.sender)?;
        let contract = parse_address(contract)?;
        let chain_id = parse_chain_id(&transfer.chain().chain_id)?;

        let data = (self.encode_transfer_call)(receiver, transfer.amount);
        if data.is_empty() {
            return Err(TransferError::TransferFailed(EMPTY_TOKEN_PAYLOAD.to_string()));
        }

        let call = CallRequest::contract(sender, contract, data);
        let tx = self.build_transaction(sender, call).await?;

        self.sign_and_broadcast(tx, chain_id, transfer).await
    }

    /// Query fees and limit for `call`, then the nonce, and assemble the
    /// unsigned transaction.
    ///
    /// The sender must be the signer: the nonce is the sender's, the
    /// signature is the signer's.
    async fn build_transaction(&self, sender: Address, call: CallRequest) -> Result<TxEip1559, TransferError> {
        let signer = self.signer.address();
        if sender != signer {
            warn!(sender = %sender, signer = %signer, "Transfer sender differs from signer address");
            return Err(TransferError::TransferFailed(SENDER_MISMATCH.to_string()));
        }

        let (gas_price, gas_limit) =
            tokio::try_join!(self.query.gas_price(), self.query.estimate_gas(&call))?;
        let caps = self.fee_caps(gas_price).await?;

        let nonce = self.query.transaction_count(sender).await?;

        Ok(TxEip1559 {
            nonce,
            gas_limit,
            max_fee_per_gas: caps.max_fee_per_gas,
            max_priority_fee_per_gas: caps.max_priority_fee_per_gas,
            to: TxKind::Call(call.to),
            value: call.value,
            input: call.input,
            ..Default::default()
        })
    }

    async fn fee_caps(&self, gas_price: u128) -> Result<FeeCaps, TransferError> {
        let legacy = FeeCaps {
            max_fee_per_gas: gas_price,
            max_priority_fee_per_gas: gas_price,
        };

        match self.strategy {
            FeeCapStrategy::LegacyCompatible => Ok(legacy),
            FeeCapStrategy::MarketAware => {
                let (base_fee, tip) = tokio::try_join!(
                    self.query.base_fee_per_gas(),
                    self.query.max_priority_fee_per_gas()
                )?;
                Ok(match base_fee {
                    // Max fee = 2 * base_fee + priority_fee (allows for base fee increase)
                    Some(base_fee) => FeeCaps {
                        max_fee_per_gas: base_fee.saturating_mul(2).saturating_add(tip),
                        max_priority_fee_per_gas: tip,
                    },
                    None => legacy,
                })
            }
        }
    }

    async fn sign_and_broadcast(
        &self,
        tx: TxEip1559,
        chain_id: u64,
        transfer: &Transfer,
    ) -> Result<String, TransferError> {
        let nonce = tx.nonce;
        let envelope = self.signer.sign_transaction(tx, chain_id).await?;
        let tx_hash = self.broadcast(envelope).await?;

        info!(
            chain = %transfer.chain().name,
            asset = transfer.asset_kind().label(),
            nonce,
            tx_hash = %tx_hash,
            "Transfer submitted"
        );

        Ok(tx_hash)
    }

    // =========================================================================
    // Low-level primitives for delegated signing
    // =========================================================================

    /// Sign `tx` for `chain` with the held key without broadcasting.
    pub async fn sign(&self, tx: TxEip1559, chain: &Chain) -> Result<SignedTransactionEnvelope, TransferError> {
        let chain_id = parse_chain_id(&chain.chain_id)?;
        Ok(self.signer.sign_transaction(tx, chain_id).await?)
    }

    /// Sign `tx` for `chain` and broadcast it; returns the `0x` hash.
    pub async fn send(&self, tx: TxEip1559, chain: &Chain) -> Result<String, TransferError> {
        let envelope = self.sign(tx, chain).await?;
        self.broadcast(envelope).await
    }

    /// Broadcast a signed envelope. Consumes it: the nonce is spent.
    pub async fn broadcast(&self, envelope: SignedTransactionEnvelope) -> Result<String, TransferError> {
        let hash = self.query.send_raw_transaction(&envelope.raw).await?;
        if hash != envelope.hash {
            warn!(
                expected = %envelope.hash_hex(),
                reported = %hash,
                "Node reported a different transaction hash"
            );
        }
        Ok(format!("{hash:#x}"))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Call whose gas is estimated for `transfer`, shaped exactly as it will be sent.
    fn estimate_call(&self, transfer: &Transfer) -> Result<CallRequest, TransferError> {
        match transfer.asset_kind() {
            AssetKind::Native => {
                let sender = parse_address(&transfer.sender)?;
                let receiver = parse_address(&transfer.receiver)?;
                Ok(CallRequest::native(sender, receiver, transfer.amount))
            }
            AssetKind::Erc20 { contract } => {
                let sender = parse_address(&transfer.sender)?;
                let receiver = parse_address(&transfer.receiver)?;
                let contract = parse_address(contract)?;
                let data: Bytes = (self.encode_transfer_call)(receiver, transfer.amount);
                if data.is_empty() {
                    return Err(TransferError::CannotEstimateFee(EMPTY_TOKEN_PAYLOAD.to_string()));
                }
                Ok(CallRequest::contract(sender, contract, data))
            }
            AssetKind::Unsupported(_) => Err(TransferError::unknown_asset_fee()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alloy::consensus::{Transaction, TxEnvelope};
    use alloy::eips::eip2718::Decodable2718;
    use alloy::primitives::{keccak256, B256};
    use async_trait::async_trait;
    use futures::channel::mpsc::{unbounded, UnboundedSender};
    use futures::stream::StreamExt;

    use super::*;
    use crate::blockchain::query::{HeadNotification, QueryError};
    use crate::blockchain::signing::LocalTransactionSigner;
    use crate::blockchain::types::{Asset, AVAX_FUJI};
    use crate::blockchain::AddressError;

    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const RECEIVER: &str = "0x2222222222222222222222222222222222222222";
    const TOKEN: &str = "0x76568BEd5Acf1A5Cd888773C8cAe9ea2a9131A63";

    /// In-memory chain that records every query it answers.
    struct MockChain {
        gas_price: u128,
        gas_limit: u64,
        nonce: u64,
        tip: u128,
        base_fee: Option<u128>,
        reject_with: Option<String>,
        calls: Mutex<Vec<&'static str>>,
        estimates: Mutex<Vec<CallRequest>>,
        sent: Mutex<Vec<Bytes>>,
        heads: Mutex<Option<HeadStream>>,
    }

    impl MockChain {
        fn new() -> Self {
            Self {
                gas_price: 25_000_000_000,
                gas_limit: 21_000,
                nonce: 9,
                tip: 1_500_000_000,
                base_fee: Some(10_000_000_000),
                reject_with: None,
                calls: Mutex::new(Vec::new()),
                estimates: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                heads: Mutex::new(None),
            }
        }

        fn record(&self, name: &'static str) {
            self.calls.lock().unwrap().push(name);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn position(&self, name: &str) -> usize {
            self.calls().iter().position(|c| *c == name).unwrap()
        }

        fn with_heads(self) -> (Self, UnboundedSender<Result<HeadNotification, QueryError>>) {
            let (tx, rx) = unbounded();
            *self.heads.lock().unwrap() = Some(rx.boxed());
            (self, tx)
        }
    }

    #[async_trait]
    impl ChainQueryService for MockChain {
        async fn gas_price(&self) -> Result<u128, QueryError> {
            self.record("gas_price");
            Ok(self.gas_price)
        }

        async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, QueryError> {
            self.record("estimate_gas");
            self.estimates.lock().unwrap().push(call.clone());
            Ok(self.gas_limit)
        }

        async fn transaction_count(&self, _address: Address) -> Result<u64, QueryError> {
            self.record("transaction_count");
            Ok(self.nonce)
        }

        async fn max_priority_fee_per_gas(&self) -> Result<u128, QueryError> {
            self.record("max_priority_fee_per_gas");
            Ok(self.tip)
        }

        async fn base_fee_per_gas(&self) -> Result<Option<u128>, QueryError> {
            self.record("base_fee_per_gas");
            Ok(self.base_fee)
        }

        async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, QueryError> {
            self.record("send_raw_transaction");
            if let Some(reason) = &self.reject_with {
                return Err(QueryError::Rejected(reason.clone()));
            }
            self.sent.lock().unwrap().push(Bytes::copy_from_slice(raw));
            Ok(keccak256(raw))
        }

        async fn subscribe_new_heads(&self) -> Result<HeadStream, QueryError> {
            self.record("subscribe_new_heads");
            self.heads
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| QueryError::Subscription("no heads".to_string()))
        }
    }

    fn engine(chain: MockChain) -> (TransferEngine<MockChain, LocalTransactionSigner>, Arc<MockChain>) {
        let chain = Arc::new(chain);
        let signer = Arc::new(LocalTransactionSigner::from_hex(TEST_KEY).unwrap());
        (TransferEngine::new(Arc::clone(&chain), signer), chain)
    }

    fn sender() -> String {
        LocalTransactionSigner::from_hex(TEST_KEY).unwrap().address().to_string()
    }

    fn native_transfer(amount: u64) -> Transfer {
        Transfer::new(AVAX_FUJI.chain(), Asset::native("AVAX"), sender(), RECEIVER, U256::from(amount))
    }

    fn token_transfer(amount: u64) -> Transfer {
        let asset = Asset {
            symbol: "rEUR".to_string(),
            precision: 6,
            kind: AssetKind::Erc20 {
                contract: TOKEN.to_string(),
            },
        };
        Transfer::new(AVAX_FUJI.chain(), asset, sender(), RECEIVER, U256::from(amount))
    }

    fn unknown_transfer() -> Transfer {
        let asset = Asset {
            symbol: "XOR".to_string(),
            precision: 18,
            kind: AssetKind::Unsupported("ormlChain".to_string()),
        };
        Transfer::new(AVAX_FUJI.chain(), asset, sender(), RECEIVER, U256::from(1u64))
    }

    fn decode_sent(chain: &MockChain) -> TxEnvelope {
        let sent = chain.sent.lock().unwrap();
        TxEnvelope::decode_2718(&mut sent[0].as_ref()).unwrap()
    }

    fn empty_encoder(_: Address, _: U256) -> Bytes {
        Bytes::new()
    }

    #[tokio::test]
    async fn native_legacy_fee_is_limit_times_price() {
        let (engine, chain) = engine(MockChain::new());
        let transfer = native_transfer(1_000);

        let quote = engine.estimate_fee(&transfer).await.unwrap();

        assert_eq!(quote.total_fee, U256::from(21_000u64 * 25_000_000_000u64));
        assert_eq!(quote.gas_limit, 21_000);
        assert_eq!(quote.pricing, GasPricing::Legacy { gas_price: 25_000_000_000 });
        assert!(quote.is_valid_for(&transfer));

        let estimates = chain.estimates.lock().unwrap();
        assert_eq!(estimates[0].to, parse_address(RECEIVER).unwrap());
        assert_eq!(estimates[0].value, U256::from(1_000u64));
        assert!(estimates[0].input.is_empty());
    }

    #[tokio::test]
    async fn token_fee_estimates_zero_value_contract_call() {
        let (engine, chain) = engine(MockChain::new());
        let transfer = token_transfer(2_500_000);

        let quote = engine.estimate_fee(&transfer).await.unwrap();
        assert_eq!(quote.total_fee, U256::from(21_000u64 * 25_000_000_000u64));

        let estimates = chain.estimates.lock().unwrap();
        let call = &estimates[0];
        assert_eq!(call.from, Some(parse_address(&sender()).unwrap()));
        assert_eq!(call.to, parse_address(TOKEN).unwrap());
        assert_eq!(call.value, U256::ZERO);
        assert_eq!(
            call.input,
            transfer_call_data(parse_address(RECEIVER).unwrap(), U256::from(2_500_000u64))
        );
    }

    #[tokio::test]
    async fn eip1559_fee_adds_base_and_tip() {
        let (engine, chain) = engine(MockChain::new());
        let quote = engine
            .estimate_fee_eip1559(&native_transfer(1), 7_000_000_000)
            .await
            .unwrap();

        let expected = U256::from(21_000u64) * U256::from(7_000_000_000u64 + 1_500_000_000u64);
        assert_eq!(quote.total_fee, expected);
        assert_eq!(
            quote.pricing,
            GasPricing::Eip1559 {
                base_fee_per_gas: 7_000_000_000,
                max_fee_per_gas: 8_500_000_000,
                max_priority_fee_per_gas: 1_500_000_000,
            }
        );
        assert!(chain.calls().contains(&"max_priority_fee_per_gas"));
        assert!(!chain.calls().contains(&"gas_price"));
    }

    #[tokio::test]
    async fn unknown_asset_fails_without_queries() {
        let (engine, chain) = engine(MockChain::new());
        let transfer = unknown_transfer();

        assert_eq!(
            engine.estimate_fee(&transfer).await,
            Err(TransferError::unknown_asset_fee())
        );
        assert_eq!(
            engine.estimate_fee_eip1559(&transfer, 1).await,
            Err(TransferError::unknown_asset_fee())
        );
        assert_eq!(
            engine.estimate_fee_for_market(&transfer).await,
            Err(TransferError::unknown_asset_fee())
        );
        assert_eq!(
            engine.submit(&transfer).await,
            Err(TransferError::unknown_asset_transfer())
        );
        assert!(engine.subscribe_for_fee(&transfer).await.is_err());
        assert!(chain.calls().is_empty());
    }

    #[tokio::test]
    async fn market_estimate_follows_chain() {
        let mut legacy_chain = MockChain::new();
        legacy_chain.base_fee = None;
        let (engine, _) = engine(legacy_chain);

        let mut transfer = native_transfer(1);
        assert!(matches!(
            engine.estimate_fee_for_market(&transfer).await,
            Err(TransferError::CannotEstimateFee(_))
        ));

        transfer.chain_asset.chain.fee_market = FeeMarket::Legacy;
        let quote = engine.estimate_fee_for_market(&transfer).await.unwrap();
        assert!(matches!(quote.pricing, GasPricing::Legacy { .. }));
    }

    #[tokio::test]
    async fn native_submit_signs_legacy_compatible_transaction() {
        let (engine, chain) = engine(MockChain::new());
        let transfer = native_transfer(1_000_000);

        let tx_hash = engine.submit(&transfer).await.unwrap();

        let decoded = decode_sent(&chain);
        assert_eq!(tx_hash, format!("{:#x}", decoded.tx_hash()));
        assert_eq!(decoded.to(), Some(parse_address(RECEIVER).unwrap()));
        assert_eq!(decoded.value(), U256::from(1_000_000u64));
        assert_eq!(decoded.nonce(), 9);
        assert_eq!(decoded.chain_id(), Some(43113));
        assert_eq!(decoded.max_fee_per_gas(), 25_000_000_000);
        assert_eq!(decoded.max_priority_fee_per_gas(), Some(25_000_000_000));
        assert_eq!(decoded.gas_limit(), 21_000);
    }

    #[tokio::test]
    async fn nonce_is_fetched_after_fees_and_before_broadcast() {
        let (engine, chain) = engine(MockChain::new());
        engine.submit(&native_transfer(1)).await.unwrap();

        let nonce_at = chain.position("transaction_count");
        assert!(chain.position("gas_price") < nonce_at);
        assert!(chain.position("estimate_gas") < nonce_at);
        assert!(nonce_at < chain.position("send_raw_transaction"));
    }

    #[tokio::test]
    async fn token_submit_calls_contract_with_zero_value() {
        let (engine, chain) = engine(MockChain::new());
        engine.submit(&token_transfer(2_500_000)).await.unwrap();

        let decoded = decode_sent(&chain);
        assert_eq!(decoded.to(), Some(parse_address(TOKEN).unwrap()));
        assert_eq!(decoded.value(), U256::ZERO);
        assert_eq!(
            decoded.input(),
            &transfer_call_data(parse_address(RECEIVER).unwrap(), U256::from(2_500_000u64))
        );
    }

    #[tokio::test]
    async fn empty_token_payload_fails_before_queries() {
        let (engine, chain) = engine(MockChain::new());
        let engine = engine.with_call_encoder(empty_encoder);

        assert_eq!(
            engine.submit(&token_transfer(1)).await,
            Err(TransferError::TransferFailed(
                "Cannot create ERC20 transfer transaction".to_string()
            ))
        );
        assert!(chain.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_receiver_propagates_decoding_error() {
        let (engine, chain) = engine(MockChain::new());
        let mut transfer = native_transfer(1);
        transfer.receiver = "0xnot-an-address".to_string();

        assert!(matches!(
            engine.submit(&transfer).await,
            Err(TransferError::Address(AddressError::InvalidHex(_)))
        ));
        assert!(chain.calls().is_empty());
    }

    #[tokio::test]
    async fn market_aware_caps_use_base_fee_and_tip() {
        let (engine, chain) = engine(MockChain::new());
        let engine = engine.with_fee_cap_strategy(FeeCapStrategy::MarketAware);
        engine.submit(&native_transfer(1)).await.unwrap();

        let decoded = decode_sent(&chain);
        assert_eq!(decoded.max_fee_per_gas(), 2 * 10_000_000_000 + 1_500_000_000);
        assert_eq!(decoded.max_priority_fee_per_gas(), Some(1_500_000_000));
    }

    #[tokio::test]
    async fn broadcast_rejection_propagates() {
        let mut mock = MockChain::new();
        mock.reject_with = Some("nonce too low".to_string());
        let (engine, _) = engine(mock);

        assert_eq!(
            engine.submit(&native_transfer(1)).await,
            Err(TransferError::Query(QueryError::Rejected("nonce too low".to_string())))
        );
    }

    #[tokio::test]
    async fn stale_quote_is_refused() {
        let (engine, chain) = engine(MockChain::new());
        let quote = engine.estimate_fee(&native_transfer(1)).await.unwrap();
        chain.calls.lock().unwrap().clear();

        assert_eq!(
            engine.submit_with_quote(&native_transfer(2), &quote).await,
            Err(TransferError::TransferFailed("fee quote is stale".to_string()))
        );
        assert!(chain.calls().is_empty());

        assert!(engine.submit_with_quote(&native_transfer(1), &quote).await.is_ok());
    }

    #[tokio::test]
    async fn quote_does_not_pin_submitted_fees() {
        let (engine, chain) = engine(MockChain::new());
        let transfer = native_transfer(1);
        let old_quote = engine.estimate_fee_eip1559(&transfer, 1).await.unwrap();

        engine.submit_with_quote(&transfer, &old_quote).await.unwrap();

        let decoded = decode_sent(&chain);
        assert_eq!(decoded.max_fee_per_gas(), 25_000_000_000);
        assert!(chain.calls().contains(&"gas_price"));
    }

    #[tokio::test]
    async fn sign_and_send_primitives() {
        let (engine, chain) = engine(MockChain::new());
        let tx = TxEip1559 {
            nonce: 3,
            gas_limit: 50_000,
            max_fee_per_gas: 1,
            max_priority_fee_per_gas: 1,
            to: TxKind::Call(parse_address(RECEIVER).unwrap()),
            value: U256::from(42u64),
            ..Default::default()
        };

        let signed = engine.sign(tx.clone(), &AVAX_FUJI.chain()).await.unwrap();
        assert!(chain.calls().is_empty());

        let hash = engine.send(tx, &AVAX_FUJI.chain()).await.unwrap();
        assert_eq!(hash, signed.hash_hex());

        let mut bad_chain = AVAX_FUJI.chain();
        bad_chain.chain_id = "0xfuji".to_string();
        assert!(matches!(
            engine.sign(TxEip1559::default(), &bad_chain).await,
            Err(TransferError::Address(AddressError::InvalidChainId(_)))
        ));
    }

    #[tokio::test]
    async fn fee_subscription_recomputes_per_head() {
        let (mock, heads) = MockChain::new().with_heads();
        let (engine, _) = engine(mock);
        let mut subscription = engine.subscribe_for_fee(&native_transfer(1)).await.unwrap();

        heads
            .unbounded_send(Ok(HeadNotification {
                number: 1,
                base_fee_per_gas: Some(2_000_000_000),
            }))
            .unwrap();
        let quote = subscription.next().await.unwrap().unwrap();
        assert_eq!(
            quote.total_fee,
            U256::from(21_000u64) * U256::from(2_000_000_000u64 + 1_500_000_000u64)
        );

        heads
            .unbounded_send(Ok(HeadNotification {
                number: 2,
                base_fee_per_gas: None,
            }))
            .unwrap();
        assert!(matches!(
            subscription.next().await,
            Some(Err(TransferError::CannotEstimateFee(_)))
        ));

        subscription.unsubscribe();
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn subscription_open_failure_is_delivered_to_listener() {
        let (engine, chain) = engine(MockChain::new());
        let mut subscription = engine.subscribe_for_fee(&native_transfer(1)).await.unwrap();

        assert_eq!(
            subscription.next().await,
            Some(Err(TransferError::CannotEstimateFee(
                "Subscription error: no heads".to_string()
            )))
        );
        assert_eq!(subscription.next().await, None);
        assert_eq!(chain.calls(), vec!["subscribe_new_heads"]);
    }

    #[tokio::test]
    async fn sender_other_than_signer_is_refused_before_queries() {
        let (engine, chain) = engine(MockChain::new());
        let mut transfer = native_transfer(1);
        transfer.sender = "0x1111111111111111111111111111111111111111".to_string();

        assert_eq!(
            engine.submit(&transfer).await,
            Err(TransferError::TransferFailed(
                "sender does not match signer".to_string()
            ))
        );

        let mut token = token_transfer(1);
        token.sender = transfer.sender.clone();
        assert!(matches!(
            engine.submit(&token).await,
            Err(TransferError::TransferFailed(_))
        ));

        assert!(chain.calls().is_empty());
        assert!(chain.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn fee_cap_strategy_parses() {
        assert_eq!("legacy-compatible".parse(), Ok(FeeCapStrategy::LegacyCompatible));
        assert_eq!("Market-Aware".parse(), Ok(FeeCapStrategy::MarketAware));
        assert!("fastest".parse::<FeeCapStrategy>().is_err());
    }
}

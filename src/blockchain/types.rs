// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::{Bytes, B256, U256};
use rust_decimal::Decimal;
use serde::Serialize;

use super::address::chain_id_to_hex;
use super::amount::to_decimal;

/// Symbol of the native coin on the supported networks.
pub const NATIVE_SYMBOL: &str = "AVAX";

/// Fee market a chain runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeMarket {
    /// Single `gasPrice` field.
    Legacy,
    /// `baseFeePerGas` plus a priority tip.
    Eip1559,
}

/// Static network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// WebSocket RPC endpoint
    pub ws_url: &'static str,
    /// Fee market active on the network
    pub fee_market: FeeMarket,
}

impl NetworkConfig {
    /// Chain descriptor used by transfers on this network.
    pub fn chain(&self) -> Chain {
        Chain {
            name: self.name.to_string(),
            chain_id: chain_id_to_hex(self.chain_id),
            fee_market: self.fee_market,
        }
    }
}

/// Avalanche C-Chain Mainnet configuration.
pub const AVAX_MAINNET: NetworkConfig = NetworkConfig {
    name: "Avalanche C-Chain",
    chain_id: 43114,
    ws_url: "wss://api.avax.network/ext/bc/C/ws",
    fee_market: FeeMarket::Eip1559,
};

/// Avalanche Fuji Testnet configuration.
pub const AVAX_FUJI: NetworkConfig = NetworkConfig {
    name: "Avalanche Fuji Testnet",
    chain_id: 43113,
    ws_url: "wss://api.avax-test.network/ext/bc/C/ws",
    fee_market: FeeMarket::Eip1559,
};

/// Look up a network preset by its short name (`fuji`, `mainnet`).
pub fn network_by_name(raw: &str) -> Option<NetworkConfig> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "fuji" => Some(AVAX_FUJI),
        "mainnet" => Some(AVAX_MAINNET),
        _ => None,
    }
}

/// Known ERC-20 token.
#[derive(Debug, Clone)]
pub struct Erc20Token {
    pub symbol: &'static str,
    pub decimals: u8,
    /// Mainnet contract address
    pub mainnet_address: Option<&'static str>,
    /// Fuji testnet contract address
    pub fuji_address: Option<&'static str>,
}

impl Erc20Token {
    /// Asset descriptor for this token on the given network, if deployed there.
    pub fn asset_on(&self, network: &NetworkConfig) -> Option<Asset> {
        let contract = if network.chain_id == AVAX_MAINNET.chain_id {
            self.mainnet_address
        } else {
            self.fuji_address
        }?;

        Some(Asset {
            symbol: self.symbol.to_string(),
            precision: self.decimals,
            kind: AssetKind::Erc20 {
                contract: contract.to_string(),
            },
        })
    }
}

/// USDC for reference/testing.
pub const USDC_TOKEN: Erc20Token = Erc20Token {
    symbol: "USDC",
    decimals: 6,
    // Official USDC on Avalanche C-Chain
    mainnet_address: Some("0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"),
    // Fuji testnet USDC (Circle's test token)
    fuji_address: Some("0x5425890298aed601595a70AB815c96711a31Bc65"),
};

/// Relational Euro (`rEUR`) token deployed on Fuji.
pub const REUR_TOKEN: Erc20Token = Erc20Token {
    symbol: "rEUR",
    decimals: 6,
    mainnet_address: None,
    fuji_address: Some("0x76568BEd5Acf1A5Cd888773C8cAe9ea2a9131A63"),
};

/// Tokens resolvable by symbol.
pub const KNOWN_TOKENS: [Erc20Token; 2] = [USDC_TOKEN, REUR_TOKEN];

/// Resolve `symbol` to an asset on `network`: the native coin (`AVAX`) or a
/// known token deployed there. Matching ignores ASCII case.
pub fn asset_by_symbol(symbol: &str, network: &NetworkConfig) -> Option<Asset> {
    let symbol = symbol.trim();
    if symbol.eq_ignore_ascii_case(NATIVE_SYMBOL) {
        return Some(Asset::native(NATIVE_SYMBOL));
    }
    KNOWN_TOKENS
        .iter()
        .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
        .and_then(|token| token.asset_on(network))
}

/// Chain a transfer executes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub name: String,
    /// Hex chain id, e.g. `0xa869`
    pub chain_id: String,
    pub fee_market: FeeMarket,
}

/// How an asset moves on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKind {
    /// Chain's native coin, moved by transaction value.
    Native,
    /// ERC-20 style token, moved by a contract call.
    Erc20 { contract: String },
    /// Asset type the engine cannot move; carries the raw type tag.
    Unsupported(String),
}

impl AssetKind {
    /// Interpret an asset type tag as stored in chain registries.
    ///
    /// `native`/`normal` map to the native coin; `erc20`/`bep20` need a
    /// contract address. Everything else is kept as `Unsupported`.
    pub fn from_type_tag(tag: &str, contract: Option<&str>) -> Self {
        match (tag.trim().to_ascii_lowercase().as_str(), contract) {
            ("native" | "normal", _) => AssetKind::Native,
            ("erc20" | "bep20", Some(contract)) => AssetKind::Erc20 {
                contract: contract.to_string(),
            },
            _ => AssetKind::Unsupported(tag.to_string()),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &str {
        match self {
            AssetKind::Native => "native",
            AssetKind::Erc20 { .. } => "erc20",
            AssetKind::Unsupported(tag) => tag,
        }
    }
}

/// Asset metadata needed to move and display it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub symbol: String,
    /// Number of decimal places between plank and display units
    pub precision: u8,
    pub kind: AssetKind,
}

impl Asset {
    /// Native coin descriptor with 18 decimals.
    pub fn native(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            precision: 18,
            kind: AssetKind::Native,
        }
    }
}

/// Chain plus the asset being moved on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAsset {
    pub chain: Chain,
    pub asset: Asset,
}

/// One logical transfer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub chain_asset: ChainAsset,
    /// Sender address (hex)
    pub sender: String,
    /// Receiver address (hex)
    pub receiver: String,
    /// Amount in plank
    pub amount: U256,
}

impl Transfer {
    pub fn new(
        chain: Chain,
        asset: Asset,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: U256,
    ) -> Self {
        Self {
            chain_asset: ChainAsset { chain, asset },
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain_asset.chain
    }

    pub fn asset_kind(&self) -> &AssetKind {
        &self.chain_asset.asset.kind
    }

    fn fingerprint(&self) -> TransferFingerprint {
        TransferFingerprint {
            chain_id: self.chain().chain_id.to_ascii_lowercase(),
            asset: self.asset_kind().clone(),
            sender: self.sender.to_ascii_lowercase(),
            receiver: self.receiver.to_ascii_lowercase(),
            amount: self.amount,
        }
    }
}

/// Inputs a fee quote was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TransferFingerprint {
    chain_id: String,
    asset: AssetKind,
    sender: String,
    receiver: String,
    amount: U256,
}

/// Fee fields of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "market", rename_all = "snake_case")]
pub enum GasPricing {
    Legacy {
        gas_price: u128,
    },
    Eip1559 {
        base_fee_per_gas: u128,
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
}

/// Fee estimate for one exact transfer.
///
/// A quote is bound to the transfer it was computed from; any change in
/// sender, receiver, amount, asset or chain makes it stale.
///
/// The binding does not cover fee parameters: a newer head or a moved base
/// fee leaves the quote valid for its transfer. Submission always re-queries
/// fees, so a quote is an estimate of what will be paid, never a fee cap.
/// Subscribers who need fresh numbers take the latest delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeQuote {
    pub pricing: GasPricing,
    pub gas_limit: u64,
    /// Total fee in plank of the chain's native coin
    pub total_fee: U256,
    #[serde(skip)]
    quoted_for: TransferFingerprint,
}

impl FeeQuote {
    pub(crate) fn new(transfer: &Transfer, pricing: GasPricing, gas_limit: u64, total_fee: U256) -> Self {
        Self {
            pricing,
            gas_limit,
            total_fee,
            quoted_for: transfer.fingerprint(),
        }
    }

    /// Whether this quote was computed for exactly this transfer.
    pub fn is_valid_for(&self, transfer: &Transfer) -> bool {
        self.quoted_for == transfer.fingerprint()
    }

    /// Total fee as a display decimal.
    pub fn fee_amount(&self, precision: u8) -> Option<Decimal> {
        to_decimal(self.total_fee, precision)
    }
}

/// Signed, EIP-2718 encoded transaction ready for broadcast.
///
/// Consumed on broadcast: its nonce is spent once accepted, so a resend
/// must go through a fresh build.
#[derive(Debug, PartialEq, Eq)]
pub struct SignedTransactionEnvelope {
    pub raw: Bytes,
    pub hash: B256,
}

impl SignedTransactionEnvelope {
    /// `0x`-prefixed transaction hash.
    pub fn hash_hex(&self) -> String {
        format!("{:#x}", self.hash)
    }
}

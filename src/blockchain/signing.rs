// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction signing.
//!
//! Key material never leaves the signer: the engine hands over an unsigned
//! EIP-1559 transaction plus the chain id and gets back the encoded envelope.
//! Local keys can be loaded from raw hex or from PKCS#8/SEC1 PEM.

use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxEnvelope},
    eips::eip2718::Encodable2718,
    network::TxSignerSync,
    primitives::Address,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use k256::SecretKey;

use super::types::SignedTransactionEnvelope;

/// Errors from key loading and signing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Signing failed: {0}")]
    Signer(String),
}

/// Holder of private key material able to sign transactions.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Address derived from the held key.
    fn address(&self) -> Address;

    /// Sign `tx` for `chain_id` and return the EIP-2718 encoded envelope.
    async fn sign_transaction(
        &self,
        tx: TxEip1559,
        chain_id: u64,
    ) -> Result<SignedTransactionEnvelope, SigningError>;
}

/// Signer backed by an in-memory secp256k1 key.
#[derive(Debug, Clone)]
pub struct LocalTransactionSigner {
    signer: PrivateKeySigner,
}

impl LocalTransactionSigner {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// Load from a hex private key (64 characters, optional 0x prefix).
    pub fn from_hex(private_key_hex: &str) -> Result<Self, SigningError> {
        create_signer(private_key_hex).map(Self::new)
    }

    /// Load from a PEM-encoded private key.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, SigningError> {
        signer_from_pem(pem_bytes).map(Self::new)
    }
}

#[async_trait]
impl TransactionSigner for LocalTransactionSigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_transaction(
        &self,
        mut tx: TxEip1559,
        chain_id: u64,
    ) -> Result<SignedTransactionEnvelope, SigningError> {
        tx.chain_id = chain_id;

        let signature = self
            .signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| SigningError::Signer(e.to_string()))?;

        let signed = tx.into_signed(signature);
        let hash = *signed.hash();
        let envelope = TxEnvelope::from(signed);

        Ok(SignedTransactionEnvelope {
            raw: envelope.encoded_2718().into(),
            hash,
        })
    }
}

/// Create a signer from a private key hex string.
pub fn create_signer(private_key_hex: &str) -> Result<PrivateKeySigner, SigningError> {
    let key_bytes = alloy::hex::decode(private_key_hex.trim())
        .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))
}

/// Parse a private key from PEM format to hex string.
///
/// Accepts SEC1 (`EC PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) encodings.
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, SigningError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid key format: {}", e)))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from a PEM-encoded private key.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, SigningError> {
    let hex_key = pem_to_hex(pem_bytes)?;
    create_signer(&hex_key)
}

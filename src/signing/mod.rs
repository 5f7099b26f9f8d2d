//! Key and address utilities.
//!
//! This module provides utilities for:
//! - Creating signers from private keys
//! - Computing wallet addresses
//! - EIP-55 checksumming of addresses returned by the market backend

use std::str::FromStr;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::error::AgentError;

/// Create a LocalSigner from a hex-encoded private key.
///
/// The private key can be with or without the "0x" prefix.
pub fn create_signer(private_key: &str) -> Result<PrivateKeySigner, AgentError> {
    let key = private_key.strip_prefix("0x").unwrap_or(private_key);
    let bytes = hex::decode(key)
        .map_err(|e| AgentError::Signing(format!("Invalid private key hex: {}", e)))?;

    if bytes.len() != 32 {
        return Err(AgentError::Signing(format!(
            "Private key must be 32 bytes, got {}",
            bytes.len()
        )));
    }

    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&bytes);

    PrivateKeySigner::from_bytes(&key_bytes.into())
        .map_err(|e| AgentError::Signing(format!("Failed to create signer: {}", e)))
}

/// Get the checksummed wallet address from a private key.
pub fn address_from_private_key(private_key: &str) -> Result<String, AgentError> {
    let signer = create_signer(private_key)?;
    Ok(signer.address().to_checksum(None))
}

/// Parse an address in any case and return its EIP-55 checksummed form.
pub fn checksum_address(address: &str) -> Result<String, AgentError> {
    let parsed = Address::from_str(address.trim())
        .map_err(|e| AgentError::Signing(format!("Invalid address '{}': {}", address, e)))?;
    Ok(parsed.to_checksum(None))
}

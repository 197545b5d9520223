//! Utility functions and helpers

pub mod serde_pubkey;

use std::str::FromStr;
use solana_pubkey::Pubkey;
use crate::errors::{DetectorError, DetectorResult};

/// Parse a base58 pubkey, naming what it was meant to be on failure.
pub fn parse_pubkey(value: &str, what: &str) -> DetectorResult<Pubkey> {
    Pubkey::from_str(value.trim()).map_err(|e| {
        DetectorError::TransactionParsing(format!("invalid {} '{}': {}", what, value, e))
    })
}

/// Decode base58 instruction data as carried by `json`-encoded RPC responses.
pub fn decode_instruction_data(data: &str) -> DetectorResult<Vec<u8>> {
    bs58::decode(data).into_vec().map_err(|e| {
        DetectorError::TransactionParsing(format!("instruction data is not base58: {}", e))
    })
}

//! RPC client interactions

use std::sync::Arc;
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction_status::{EncodedConfirmedTransactionWithStatusMeta, UiTransactionEncoding};

use crate::analyzer::AccountInfoLookup;
use crate::errors::{DetectorResult, ErrorContext, ErrorExt};
use crate::models::AccountInfo;

/// One entry of a signature page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    /// The transaction landed but returned an error
    pub failed: bool,
}

/// Get up to `limit` signatures for `address`, newest first, older than `before`
pub async fn get_signatures(
    rpc_client: &RpcClient,
    address: &Pubkey,
    before: Option<Signature>,
    limit: usize,
) -> DetectorResult<Vec<SignatureInfo>> {
    let config = GetConfirmedSignaturesForAddress2Config {
        before,
        limit: Some(limit),
        ..GetConfirmedSignaturesForAddress2Config::default()
    };
    let statuses = rpc_client
        .get_signatures_for_address_with_config(address, config)
        .await
        .with_context(ErrorContext {
            signature: None,
            component: "rpc".to_string(),
            operation: "get_signatures_for_address".to_string(),
            details: Some(format!("address={}", address)),
        })?;

    Ok(statuses
        .into_iter()
        .map(|status| SignatureInfo {
            signature: status.signature,
            slot: status.slot,
            failed: status.err.is_some(),
        })
        .collect())
}

/// Get a confirmed transaction with its status metadata
pub async fn get_transaction(
    rpc_client: &RpcClient,
    signature: &Signature,
) -> DetectorResult<EncodedConfirmedTransactionWithStatusMeta> {
    let config = RpcTransactionConfig {
        encoding: Some(UiTransactionEncoding::Json),
        max_supported_transaction_version: Some(0),
        ..RpcTransactionConfig::default()
    };
    rpc_client
        .get_transaction_with_config(signature, config)
        .await
        .with_context(ErrorContext {
            signature: Some(signature.to_string()),
            component: "rpc".to_string(),
            operation: "get_transaction".to_string(),
            details: None,
        })
}

/// Get account info, `None` when the account does not exist
pub async fn get_account_info(rpc_client: &RpcClient, account: &Pubkey) -> DetectorResult<Option<AccountInfo>> {
    let response = rpc_client
        .get_account_with_commitment(account, rpc_client.commitment())
        .await
        .with_context(ErrorContext {
            signature: None,
            component: "lookup".to_string(),
            operation: "get_account".to_string(),
            details: Some(format!("account={}", account)),
        })?;
    Ok(response.value.map(AccountInfo::from))
}

/// [`AccountInfoLookup`] backed by an RPC node
#[derive(Clone)]
pub struct RpcAccountLookup {
    rpc_client: Arc<RpcClient>,
}

impl RpcAccountLookup {
    pub fn new(rpc_client: Arc<RpcClient>) -> Self {
        Self { rpc_client }
    }
}

#[async_trait]
impl AccountInfoLookup for RpcAccountLookup {
    async fn get_account_info(&self, account: &Pubkey) -> DetectorResult<Option<AccountInfo>> {
        get_account_info(&self.rpc_client, account).await
    }
}

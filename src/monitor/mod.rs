//! Transaction data provider and history scan for a subject account

mod rpc;
pub mod transaction;
#[cfg(test)]
mod tests;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use log::{info, warn};
use serde::Serialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_pubkey::Pubkey;
use solana_signature::Signature;

use crate::analyzer::{analyze_transaction, AccountCreationDetector};
use crate::config::ScanSettings;
use crate::errors::{DetectorError, DetectorResult};
use crate::models::{CreatedAccountRecord, ParsedTransaction};

pub use self::rpc::{RpcAccountLookup, SignatureInfo};

/// One page of a subject's signature history
#[derive(Debug, Clone)]
pub struct SignaturePage {
    pub signatures: Vec<SignatureInfo>,
    /// Cursor for the next (older) page, `None` once history is exhausted
    pub next_before: Option<Signature>,
}

/// What happened to one transaction of a scan
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransactionOutcome {
    Detected {
        signature: String,
        slot: u64,
        created: Vec<CreatedAccountRecord>,
    },
    /// Failed transactions roll back every account they created
    Skipped { signature: String, slot: u64 },
    Failed {
        signature: String,
        slot: u64,
        error: String,
        retryable: bool,
    },
}

/// Results of a scan over a subject's history
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub subject: String,
    pub pages: usize,
    pub outcomes: Vec<TransactionOutcome>,
}

impl ScanReport {
    /// All created-account records, newest transaction first
    pub fn created(&self) -> impl Iterator<Item = &CreatedAccountRecord> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                TransactionOutcome::Detected { created, .. } => Some(created),
                _ => None,
            })
            .flatten()
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, TransactionOutcome::Failed { .. }))
            .count()
    }
}

/// Monitor for fetching a subject's transactions
pub struct Monitor {
    rpc_client: Arc<RpcClient>,
}

impl Monitor {
    /// Create a new monitor with the given RPC URL and default settings
    pub fn new(rpc_url: &str) -> Self {
        Self::with_settings(rpc_url, &ScanSettings::default())
    }

    /// Create a monitor reading at `confirmed` commitment
    pub fn with_settings(rpc_url: &str, settings: &ScanSettings) -> Self {
        let rpc_client = RpcClient::new_with_timeout_and_commitment(
            rpc_url.to_string(),
            Duration::from_secs(settings.rpc_timeout_secs),
            CommitmentConfig::confirmed(),
        );
        Self {
            rpc_client: Arc::new(rpc_client),
        }
    }

    /// Account lookup sharing this monitor's connection
    pub fn account_lookup(&self) -> RpcAccountLookup {
        RpcAccountLookup::new(self.rpc_client.clone())
    }

    /// Get one page of signatures for `subject`, older than `before`
    pub async fn signature_page(
        &self,
        subject: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> DetectorResult<SignaturePage> {
        let signatures = rpc::get_signatures(&self.rpc_client, subject, before, limit).await?;
        let next_before = if signatures.len() < limit {
            None
        } else {
            signatures
                .last()
                .map(|last| parse_signature(&last.signature))
                .transpose()?
        };
        Ok(SignaturePage {
            signatures,
            next_before,
        })
    }

    /// Fetch and convert a single transaction
    pub async fn fetch_transaction(&self, signature: &str) -> DetectorResult<ParsedTransaction> {
        let signature = parse_signature(signature)?;
        let encoded = rpc::get_transaction(&self.rpc_client, &signature).await?;
        transaction::from_encoded(&encoded)
    }

    /// Walk `subject`'s history page by page and detect created accounts in
    /// every transaction.
    ///
    /// A failing transaction is recorded in the report and the scan continues.
    /// Only a failed signature-page request aborts the scan.
    pub async fn scan(
        &self,
        subject: &Pubkey,
        detector: &AccountCreationDetector,
        settings: &ScanSettings,
    ) -> DetectorResult<ScanReport> {
        settings.validate()?;
        let lookup = self.account_lookup();
        let mut report = ScanReport {
            subject: subject.to_string(),
            pages: 0,
            outcomes: Vec::new(),
        };
        let mut before = None;

        loop {
            if settings.max_pages.is_some_and(|max| report.pages >= max) {
                break;
            }
            let page = self.signature_page(subject, before, settings.page_size).await?;
            report.pages += 1;
            info!(
                "Scanning page {} with {} signatures for {}",
                report.pages,
                page.signatures.len(),
                subject
            );

            for entry in &page.signatures {
                if entry.failed {
                    report.outcomes.push(TransactionOutcome::Skipped {
                        signature: entry.signature.clone(),
                        slot: entry.slot,
                    });
                    continue;
                }
                let outcome = match self.detect_one(&entry.signature, subject, detector, &lookup).await {
                    Ok(created) => TransactionOutcome::Detected {
                        signature: entry.signature.clone(),
                        slot: entry.slot,
                        created,
                    },
                    Err(e) => {
                        warn!("Skipping transaction {}: {}", entry.signature, e);
                        TransactionOutcome::Failed {
                            signature: entry.signature.clone(),
                            slot: entry.slot,
                            error: e.to_string(),
                            retryable: e.is_retryable(),
                        }
                    }
                };
                report.outcomes.push(outcome);
            }

            match page.next_before {
                Some(cursor) => before = Some(cursor),
                None => break,
            }
        }

        info!(
            "Scan of {} finished: {} transactions, {} created accounts, {} failures",
            subject,
            report.outcomes.len(),
            report.created().count(),
            report.failures()
        );
        Ok(report)
    }

    async fn detect_one(
        &self,
        signature: &str,
        subject: &Pubkey,
        detector: &AccountCreationDetector,
        lookup: &RpcAccountLookup,
    ) -> DetectorResult<Vec<CreatedAccountRecord>> {
        let tx = self.fetch_transaction(signature).await?;
        analyze_transaction(detector, &tx, subject, lookup).await
    }
}

fn parse_signature(signature: &str) -> DetectorResult<Signature> {
    Signature::from_str(signature).map_err(|e| {
        DetectorError::TransactionParsing(format!("invalid signature '{}': {}", signature, e))
    })
}

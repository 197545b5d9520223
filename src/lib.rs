//! Detection of accounts created by Solana transactions
//!
//! This crate rebuilds the cross-program-invocation call tree of a
//! transaction from its flat inner-instruction groups, then finds the
//! accounts that came into existence during it. This covers program-derived
//! addresses, associated token accounts and accounts allocated at any depth.
//!
//! ```no_run
//! use solana_pda_detector::{analyzer, config::DetectorConfig, monitor::Monitor};
//! # async fn run(subject: solana_pubkey::Pubkey) -> solana_pda_detector::errors::DetectorResult<()> {
//! let monitor = Monitor::new("https://api.mainnet-beta.solana.com");
//! let detector = analyzer::AccountCreationDetector::new(DetectorConfig::default());
//! let tx = monitor.fetch_transaction("5h6x...").await?;
//! let tree = analyzer::build_transaction_tree(&tx)?;
//! let created = detector.detect(&tx, &tree, &subject, &monitor.account_lookup()).await?;
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod monitor;
pub mod utils;

pub use analyzer::{AccountCreationDetector, AccountInfoLookup};
pub use errors::{DetectorError, DetectorResult};

/// Version of the detector
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

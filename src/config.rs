//! Detector and scan configuration
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration. The file is named by `--config` or the
//! `PDA_DETECTOR_CONFIG` environment variable.

use std::fs;
use std::path::{Path, PathBuf};
use log::debug;
use serde::Deserialize;
use solana_pubkey::Pubkey;

use crate::analyzer::recipes::SeedRecipe;
use crate::constants::programs::{
    ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID, TOKEN_2022_PROGRAM_ID, TOKEN_PROGRAM_ID,
};
use crate::errors::{DetectorError, DetectorResult};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "PDA_DETECTOR_CONFIG";

/// Largest page `getSignaturesForAddress` will return
pub const MAX_SIGNATURE_PAGE_SIZE: usize = 1000;

/// Full configuration file
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Configuration {
    pub detector: DetectorConfig,
    pub scan: ScanSettings,
}

/// Program identities the detector compares against
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ProgramIds {
    #[serde(with = "crate::utils::serde_pubkey")]
    pub system_program: Pubkey,
    /// Token programs an associated token account may be derived for
    #[serde(deserialize_with = "crate::utils::serde_pubkey::vec::deserialize")]
    pub token_programs: Vec<Pubkey>,
    #[serde(with = "crate::utils::serde_pubkey")]
    pub associated_token_program: Pubkey,
}

impl Default for ProgramIds {
    fn default() -> Self {
        Self {
            system_program: SYSTEM_PROGRAM_ID,
            token_programs: vec![TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID],
            associated_token_program: ASSOCIATED_TOKEN_PROGRAM_ID,
        }
    }
}

/// Which mints are checked when testing a candidate for the subject's
/// associated token account
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct AtaPolicy {
    /// Mints always checked
    #[serde(deserialize_with = "crate::utils::serde_pubkey::vec::deserialize")]
    pub mints: Vec<Pubkey>,
    /// Also check the mint stored in a token-program-owned candidate's data
    pub infer_mint_from_account_data: bool,
}

impl Default for AtaPolicy {
    fn default() -> Self {
        Self {
            mints: Vec::new(),
            infer_mint_from_account_data: true,
        }
    }
}

/// Which otherwise-filtered candidates are reported anyway
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FilterPolicy {
    /// Report the subject itself, tagged `self`
    pub keep_subject: bool,
    /// Report system-owned candidates, tagged `system-owned`
    pub keep_system_owned: bool,
}

/// Configuration of [`crate::analyzer::AccountCreationDetector`]
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DetectorConfig {
    pub program_ids: ProgramIds,
    pub ata: AtaPolicy,
    pub filter: FilterPolicy,
    /// Upper bound on account lookups in flight for one transaction
    pub max_concurrent_lookups: usize,
    /// Known derivation recipes used to classify program-owned candidates
    pub recipes: Vec<SeedRecipe>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            program_ids: ProgramIds::default(),
            ata: AtaPolicy::default(),
            filter: FilterPolicy::default(),
            max_concurrent_lookups: 8,
            recipes: Vec::new(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> DetectorResult<()> {
        if self.max_concurrent_lookups == 0 {
            return Err(DetectorError::Config(
                "max_concurrent_lookups must be at least 1".to_string(),
            ));
        }
        for recipe in &self.recipes {
            recipe.validate()?;
        }
        Ok(())
    }
}

/// Settings for walking a subject's signature history over RPC
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ScanSettings {
    /// Signatures requested per page
    pub page_size: usize,
    /// Stop after this many pages. Defaults to one page when the field is
    /// omitted; an explicit `null` walks the whole history.
    pub max_pages: Option<usize>,
    /// Maximum allowed duration of an RPC call in seconds
    pub rpc_timeout_secs: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: Some(1),
            rpc_timeout_secs: 30,
        }
    }
}

impl ScanSettings {
    pub fn validate(&self) -> DetectorResult<()> {
        if self.page_size == 0 || self.page_size > MAX_SIGNATURE_PAGE_SIZE {
            return Err(DetectorError::Config(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_SIGNATURE_PAGE_SIZE, self.page_size
            )));
        }
        Ok(())
    }
}

impl Configuration {
    /// Parse and validate a configuration file
    pub fn from_file(path: &Path) -> DetectorResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            DetectorError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Configuration = serde_json::from_str(&json).map_err(|e| {
            DetectorError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.detector.validate()?;
        config.scan.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, else from [`CONFIG_ENV`], else defaults
    pub fn load(path: Option<&Path>) -> DetectorResult<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));
        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }
}

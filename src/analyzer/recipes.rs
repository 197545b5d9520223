//! Known address derivations used to classify program-owned accounts
//!
//! The canonical associated-token-account derivation is built in. Everything
//! else goes through [`DerivationRecipes`], so callers can plug in their own
//! protocol knowledge without touching the detector.

use log::debug;
use serde::Deserialize;
use solana_pubkey::Pubkey;

use crate::config::{AtaPolicy, ProgramIds};
use crate::errors::{DetectorError, DetectorResult};
use crate::models::AccountInfo;

/// Longest single seed accepted by the runtime
pub const MAX_SEED_LEN: usize = 32;

/// Seeds per derivation, leaving room for the bump seed
pub const MAX_SEEDS: usize = 15;

/// Recipe that matched a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeMatch {
    pub program_id: Pubkey,
    pub recipe: String,
}

/// Strategy that recognises program-derived addresses of known protocols
pub trait DerivationRecipes: Send + Sync {
    /// Return the recipe that derives `candidate`, given its current `owner`
    /// and the subject being analysed.
    fn match_candidate(&self, candidate: &Pubkey, owner: &Pubkey, subject: &Pubkey) -> Option<RecipeMatch>;
}

/// Recognises nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecipes;

impl DerivationRecipes for NoRecipes {
    fn match_candidate(&self, _candidate: &Pubkey, _owner: &Pubkey, _subject: &Pubkey) -> Option<RecipeMatch> {
        None
    }
}

/// One seed of a derivation
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeedComponent {
    /// UTF-8 bytes of the string, e.g. `"vault"`
    Literal(String),
    /// Hex-encoded raw bytes
    Hex(String),
    /// The 32 bytes of a fixed base58 pubkey
    Pubkey(String),
    /// The 32 bytes of the subject account
    Subject,
}

impl SeedComponent {
    fn bytes(&self, subject: &Pubkey) -> DetectorResult<Vec<u8>> {
        let bytes = match self {
            SeedComponent::Literal(value) => value.as_bytes().to_vec(),
            SeedComponent::Hex(value) => hex::decode(value).map_err(|e| {
                DetectorError::Config(format!("invalid hex seed '{}': {}", value, e))
            })?,
            SeedComponent::Pubkey(value) => crate::utils::parse_pubkey(value, "seed pubkey")
                .map_err(|e| DetectorError::Config(e.to_string()))?
                .to_bytes()
                .to_vec(),
            SeedComponent::Subject => subject.to_bytes().to_vec(),
        };
        if bytes.len() > MAX_SEED_LEN {
            return Err(DetectorError::Config(format!(
                "seed is {} bytes, the maximum is {}",
                bytes.len(),
                MAX_SEED_LEN
            )));
        }
        Ok(bytes)
    }
}

/// A named derivation: `find_program_address(seeds, program_id)`
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SeedRecipe {
    pub name: String,
    #[serde(with = "crate::utils::serde_pubkey")]
    pub program_id: Pubkey,
    pub seeds: Vec<SeedComponent>,
}

impl SeedRecipe {
    pub fn new(name: impl Into<String>, program_id: Pubkey, seeds: Vec<SeedComponent>) -> Self {
        Self {
            name: name.into(),
            program_id,
            seeds,
        }
    }

    /// Check seed count and encodings without deriving anything
    pub fn validate(&self) -> DetectorResult<()> {
        if self.seeds.len() > MAX_SEEDS {
            return Err(DetectorError::Config(format!(
                "recipe '{}' has {} seeds, the maximum is {}",
                self.name,
                self.seeds.len(),
                MAX_SEEDS
            )));
        }
        let placeholder = Pubkey::default();
        for seed in &self.seeds {
            seed.bytes(&placeholder)?;
        }
        Ok(())
    }

    /// Canonical address of this recipe for `subject`
    pub fn derive(&self, subject: &Pubkey) -> DetectorResult<Option<Pubkey>> {
        let seeds = self
            .seeds
            .iter()
            .map(|seed| seed.bytes(subject))
            .collect::<DetectorResult<Vec<_>>>()?;
        let seed_refs: Vec<&[u8]> = seeds.iter().map(Vec::as_slice).collect();
        Ok(Pubkey::try_find_program_address(&seed_refs, &self.program_id).map(|(address, _)| address))
    }
}

/// Table of seed recipes, checked in order
#[derive(Debug, Clone, Default)]
pub struct SeedRecipeTable {
    recipes: Vec<SeedRecipe>,
}

impl SeedRecipeTable {
    pub fn new(recipes: Vec<SeedRecipe>) -> Self {
        Self { recipes }
    }
}

impl DerivationRecipes for SeedRecipeTable {
    fn match_candidate(&self, candidate: &Pubkey, owner: &Pubkey, subject: &Pubkey) -> Option<RecipeMatch> {
        self.recipes
            .iter()
            .filter(|recipe| recipe.program_id == *owner)
            .find(|recipe| match recipe.derive(subject) {
                Ok(address) => address.as_ref() == Some(candidate),
                Err(e) => {
                    debug!("Skipping recipe '{}': {}", recipe.name, e);
                    false
                }
            })
            .map(|recipe| RecipeMatch {
                program_id: recipe.program_id,
                recipe: recipe.name.clone(),
            })
    }
}

/// Canonical associated token account of `wallet` for `mint` under `token_program`
pub fn associated_token_address(
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
    associated_token_program: &Pubkey,
) -> Option<Pubkey> {
    Pubkey::try_find_program_address(
        &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
        associated_token_program,
    )
    .map(|(address, _)| address)
}

/// Mint for which `candidate` is the subject's associated token account.
///
/// Only token-program-owned candidates can match. The mints tried are the
/// policy's explicit list, then the mint stored in the candidate's data when
/// the policy allows it.
pub fn match_associated_token_account(
    candidate: &Pubkey,
    info: &AccountInfo,
    subject: &Pubkey,
    program_ids: &ProgramIds,
    policy: &AtaPolicy,
) -> Option<Pubkey> {
    if !program_ids.token_programs.contains(&info.owner) {
        return None;
    }
    let inferred = policy
        .infer_mint_from_account_data
        .then(|| info.token_account_mint())
        .flatten();

    policy
        .mints
        .iter()
        .copied()
        .chain(inferred)
        .find(|mint| {
            associated_token_address(subject, mint, &info.owner, &program_ids.associated_token_program)
                .as_ref()
                == Some(candidate)
        })
}

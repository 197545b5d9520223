//! Detection of accounts created by a transaction
//!
//! Two independent signals are merged:
//!
//! - **balance**: the account held zero lamports before the transaction and a
//!   positive balance after it. This also fires for plain funded wallets.
//! - **allocation**: the account is passed to a system-program
//!   create/allocate instruction anywhere in the call tree. This also catches
//!   accounts that were funded ahead of time and allocated later.
//!
//! The union is then filtered and classified against each candidate's current
//! state, fetched through an [`AccountInfoLookup`].

use std::collections::HashMap;
use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use log::{debug, warn};
use solana_pubkey::Pubkey;

use crate::analyzer::recipes::{self, DerivationRecipes, SeedRecipeTable};
use crate::config::DetectorConfig;
use crate::constants::system::{
    ALLOCATE, ALLOCATE_WITH_SEED, CREATE_ACCOUNT, CREATE_ACCOUNT_WITH_SEED, DISCRIMINANT_LEN,
};
use crate::errors::{DetectorError, DetectorResult};
use crate::models::{
    pre_order, AccountClass, AccountInfo, CallNode, CreatedAccountRecord, InstructionRecord,
    ParsedTransaction, Signals,
};

/// Source of current account state.
///
/// `Ok(None)` means the account does not exist right now. An account with zero
/// lamports is treated the same way. `Err` is reserved
/// for transport failures and aborts detection with
/// [`DetectorError::LookupFailure`].
#[async_trait]
pub trait AccountInfoLookup: Send + Sync {
    async fn get_account_info(&self, account: &Pubkey) -> DetectorResult<Option<AccountInfo>>;
}

#[async_trait]
impl AccountInfoLookup for HashMap<Pubkey, AccountInfo> {
    async fn get_account_info(&self, account: &Pubkey) -> DetectorResult<Option<AccountInfo>> {
        Ok(self.get(account).cloned())
    }
}

/// System instructions that bring an account into existence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationKind {
    CreateAccount,
    CreateAccountWithSeed,
    Allocate,
    AllocateWithSeed,
}

impl AllocationKind {
    /// Decode the little-endian `u32` discriminant of a system instruction
    pub fn from_data(data: &[u8]) -> Option<Self> {
        let tag = data.get(..DISCRIMINANT_LEN)?;
        match u32::from_le_bytes([tag[0], tag[1], tag[2], tag[3]]) {
            CREATE_ACCOUNT => Some(AllocationKind::CreateAccount),
            CREATE_ACCOUNT_WITH_SEED => Some(AllocationKind::CreateAccountWithSeed),
            ALLOCATE => Some(AllocationKind::Allocate),
            ALLOCATE_WITH_SEED => Some(AllocationKind::AllocateWithSeed),
            _ => None,
        }
    }

    /// Account positions flagged as creation candidates.
    ///
    /// The first account argument always is. The create variants take the
    /// funding payer first and the allocated account second, so both are
    /// flagged; a payer is removed later by the subject and system-owned
    /// filters.
    pub fn candidate_positions(self) -> &'static [usize] {
        match self {
            AllocationKind::CreateAccount | AllocationKind::CreateAccountWithSeed => &[0, 1],
            AllocationKind::Allocate | AllocationKind::AllocateWithSeed => &[0],
        }
    }
}

/// Unfiltered creation candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub account: Pubkey,
    pub signals: Signals,
}

/// Detects accounts created by a transaction.
///
/// Holds configuration only; every call works on its own inputs.
pub struct AccountCreationDetector {
    config: DetectorConfig,
    recipes: Box<dyn DerivationRecipes>,
}

impl AccountCreationDetector {
    /// Create a detector using the recipes listed in `config`
    pub fn new(config: DetectorConfig) -> Self {
        let recipes = Box::new(SeedRecipeTable::new(config.recipes.clone()));
        Self { config, recipes }
    }

    /// Replace the derivation-recipe strategy
    pub fn with_recipes(mut self, recipes: impl DerivationRecipes + 'static) -> Self {
        self.recipes = Box::new(recipes);
        self
    }

    /// Merge both signals into one candidate list, deduplicated by account in
    /// discovery order: balance hits by key index, then allocation arguments
    /// in execution order.
    ///
    /// # Errors
    ///
    /// [`DetectorError::MissingMetadata`] when the transaction has no execution
    /// metadata, and [`DetectorError::MalformedInput`] when the balance arrays
    /// do not line up with the account keys.
    pub fn collect_candidates(
        &self,
        tx: &ParsedTransaction,
        tree: &[CallNode<'_>],
    ) -> DetectorResult<Vec<Candidate>> {
        let meta = tx.meta.as_ref().ok_or_else(|| {
            DetectorError::MissingMetadata(format!("transaction {} has no status metadata", tx.label()))
        })?;
        if meta.inner_instructions.is_none() {
            return Err(DetectorError::MissingMetadata(format!(
                "transaction {} has no inner instruction data",
                tx.label()
            )));
        }
        if meta.pre_balances.is_empty() && meta.post_balances.is_empty() && !tx.account_keys.is_empty() {
            return Err(DetectorError::MissingMetadata(format!(
                "transaction {} has no balances",
                tx.label()
            )));
        }
        if meta.pre_balances.len() != tx.account_keys.len()
            || meta.post_balances.len() != tx.account_keys.len()
        {
            return Err(DetectorError::MalformedInput(format!(
                "transaction {} has {} account keys but {} pre and {} post balances",
                tx.label(),
                tx.account_keys.len(),
                meta.pre_balances.len(),
                meta.post_balances.len()
            )));
        }

        let mut candidates: Vec<Candidate> = Vec::new();
        let mut seen: HashMap<Pubkey, usize> = HashMap::new();
        let mut flag = |account: Pubkey, mark: fn(&mut Signals)| {
            let index = *seen.entry(account).or_insert_with(|| {
                candidates.push(Candidate {
                    account,
                    signals: Signals::default(),
                });
                candidates.len() - 1
            });
            mark(&mut candidates[index].signals);
        };

        for (index, account) in tx.account_keys.iter().enumerate() {
            if meta.pre_balances[index] == 0 && meta.post_balances[index] > 0 {
                flag(*account, |signals| signals.balance = true);
            }
        }

        for node in pre_order(tree) {
            for account in self.allocation_targets(&tx.account_keys, node.instruction) {
                debug!(
                    "{} allocated at depth {} in {}",
                    account,
                    node.depth,
                    tx.label()
                );
                flag(*account, |signals| signals.allocation = true);
            }
        }

        Ok(candidates)
    }

    fn allocation_targets<'k>(&self, account_keys: &'k [Pubkey], ix: &InstructionRecord) -> Vec<&'k Pubkey> {
        if ix.program_id(account_keys) != Some(&self.config.program_ids.system_program) {
            return Vec::new();
        }
        let Some(kind) = AllocationKind::from_data(&ix.data) else {
            return Vec::new();
        };
        kind.candidate_positions()
            .iter()
            .filter_map(|position| ix.account(account_keys, *position))
            .collect()
    }

    /// Detect and classify the accounts created by `tx`.
    ///
    /// `tree` is the call forest of the same transaction. Each distinct
    /// candidate is looked up once, with up to `max_concurrent_lookups`
    /// lookups in flight. Records keep candidate discovery order. Dropping the
    /// returned future abandons outstanding lookups.
    pub async fn detect<L>(
        &self,
        tx: &ParsedTransaction,
        tree: &[CallNode<'_>],
        subject: &Pubkey,
        lookup: &L,
    ) -> DetectorResult<Vec<CreatedAccountRecord>>
    where
        L: AccountInfoLookup + ?Sized,
    {
        let candidates = self.collect_candidates(tx, tree)?;
        let filter = self.config.filter;
        let mut records = Vec::new();
        let mut pending = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if candidate.account == *subject {
                if filter.keep_subject {
                    records.push(CreatedAccountRecord {
                        account: candidate.account,
                        class: AccountClass::SelfAccount,
                        owner: None,
                        signals: candidate.signals,
                    });
                } else {
                    debug!("Dropping subject {} from candidates", subject);
                }
                continue;
            }
            pending.push(candidate);
        }

        let resolved: Vec<(Candidate, Option<AccountInfo>)> = stream::iter(pending)
            .map(|candidate| async move {
                let info = lookup
                    .get_account_info(&candidate.account)
                    .await
                    .map_err(|e| match e {
                        DetectorError::LookupFailure(_) => e,
                        other => DetectorError::LookupFailure(format!("{}: {}", candidate.account, other)),
                    })?;
                Ok::<_, DetectorError>((candidate, info))
            })
            .buffered(self.config.max_concurrent_lookups.max(1))
            .try_collect()
            .await?;

        for (candidate, info) in resolved {
            let Some(info) = info.filter(AccountInfo::is_live) else {
                warn!(
                    "Candidate {} from {} does not exist anymore, dropping",
                    candidate.account,
                    tx.label()
                );
                continue;
            };

            if info.owner == self.config.program_ids.system_program {
                if filter.keep_system_owned {
                    records.push(CreatedAccountRecord {
                        account: candidate.account,
                        class: AccountClass::SystemOwned,
                        owner: Some(info.owner),
                        signals: candidate.signals,
                    });
                } else {
                    debug!("Dropping system-owned candidate {}", candidate.account);
                }
                continue;
            }

            let class = self.classify(&candidate.account, &info, subject);
            debug!("Candidate {} classified as {}", candidate.account, class);
            records.push(CreatedAccountRecord {
                account: candidate.account,
                class,
                owner: Some(info.owner),
                signals: candidate.signals,
            });
        }

        Ok(records)
    }

    /// Associated token accounts take precedence over recipe matches.
    fn classify(&self, candidate: &Pubkey, info: &AccountInfo, subject: &Pubkey) -> AccountClass {
        if let Some(mint) = recipes::match_associated_token_account(
            candidate,
            info,
            subject,
            &self.config.program_ids,
            &self.config.ata,
        ) {
            return AccountClass::AssociatedTokenAccount { mint };
        }
        match self.recipes.match_candidate(candidate, &info.owner, subject) {
            Some(found) => AccountClass::ProgramOwnedMatched {
                program_id: found.program_id,
                recipe: found.recipe,
            },
            None => AccountClass::ProgramOwnedUnclassified,
        }
    }
}

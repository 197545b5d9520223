//! Core analysis: call-tree reconstruction and account-creation detection

pub mod creation;
pub mod recipes;
pub mod stack_height;
pub mod tree;

use solana_pubkey::Pubkey;

use crate::errors::DetectorResult;
use crate::models::{CreatedAccountRecord, ParsedTransaction};

pub use self::creation::{AccountCreationDetector, AccountInfoLookup, AllocationKind, Candidate};
pub use self::recipes::{DerivationRecipes, NoRecipes, RecipeMatch, SeedComponent, SeedRecipe, SeedRecipeTable};
pub use self::stack_height::{annotate_stack_heights, log_annotated_groups, reconstruct_stack_heights};
pub use self::tree::{build_transaction_tree, build_tree, build_tree_with_logs};

/// Build the call tree of `tx` and run detection over it.
///
/// Groups without declared stack heights are annotated from the logs first,
/// as [`build_tree_with_logs`] does, without modifying `tx`.
pub async fn analyze_transaction<L>(
    detector: &AccountCreationDetector,
    tx: &ParsedTransaction,
    subject: &Pubkey,
    lookup: &L,
) -> DetectorResult<Vec<CreatedAccountRecord>>
where
    L: AccountInfoLookup + ?Sized,
{
    let annotated = log_annotated_groups(tx);
    let groups = annotated.as_deref().unwrap_or(tx.inner_groups());
    let tree = build_tree(&tx.instructions, groups)?;
    detector.detect(tx, &tree, subject, lookup).await
}

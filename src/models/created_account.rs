//! Detection results

use std::fmt;
use serde::{Serialize, Serializer};
use solana_pubkey::Pubkey;

/// Classification attached to a created account
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountClass {
    /// The subject account itself, only reported when the filter policy keeps it
    SelfAccount,
    /// Canonical associated token account of the subject for `mint`
    AssociatedTokenAccount { mint: Pubkey },
    /// Still owned by the system program, only reported when the filter policy keeps it
    SystemOwned,
    /// Owned by a program, derivation unknown
    ProgramOwnedUnclassified,
    /// Matched a known derivation recipe of `program_id`
    ProgramOwnedMatched { program_id: Pubkey, recipe: String },
}

impl AccountClass {
    pub fn is_associated_token_account(&self) -> bool {
        matches!(self, AccountClass::AssociatedTokenAccount { .. })
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountClass::SelfAccount => write!(f, "self"),
            AccountClass::AssociatedTokenAccount { .. } => write!(f, "associated-token-account"),
            AccountClass::SystemOwned => write!(f, "system-owned"),
            AccountClass::ProgramOwnedUnclassified => write!(f, "program-owned-unclassified"),
            AccountClass::ProgramOwnedMatched { program_id, .. } => {
                write!(f, "program-owned-matched:{}", program_id)
            }
        }
    }
}

impl Serialize for AccountClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which heuristics flagged an account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Signals {
    /// Balance went from zero to non-zero
    pub balance: bool,
    /// Target of a system create/allocate instruction somewhere in the call tree
    pub allocation: bool,
}

/// An account that came into existence during a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedAccountRecord {
    #[serde(with = "crate::utils::serde_pubkey")]
    pub account: Pubkey,
    pub class: AccountClass,
    /// Owner observed by the lookup, absent only for the subject itself
    #[serde(serialize_with = "crate::utils::serde_pubkey::option::serialize")]
    pub owner: Option<Pubkey>,
    pub signals: Signals,
}

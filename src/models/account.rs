//! Point-in-time account state returned by an account lookup

use solana_pubkey::Pubkey;

/// Size of an SPL token account; Token-2022 accounts are at least this long
const TOKEN_ACCOUNT_LEN: usize = 165;

/// Current state of an on-chain account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// Program that owns the account
    pub owner: Pubkey,
    /// An account with no lamports left is garbage-collected by the runtime
    pub lamports: u64,
    pub data: Vec<u8>,
}

impl AccountInfo {
    /// Create account info with empty data
    pub fn new(owner: Pubkey, lamports: u64) -> Self {
        Self {
            owner,
            lamports,
            data: Vec::new(),
        }
    }

    /// Attach account data
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Whether the account still exists
    pub fn is_live(&self) -> bool {
        self.lamports > 0
    }

    /// Mint stored in the first 32 bytes of a token account.
    ///
    /// Only meaningful when the account is owned by a token program; the
    /// caller checks the owner.
    pub fn token_account_mint(&self) -> Option<Pubkey> {
        if self.data.len() < TOKEN_ACCOUNT_LEN {
            return None;
        }
        Pubkey::try_from(&self.data[..32]).ok()
    }
}

impl From<solana_account::Account> for AccountInfo {
    fn from(account: solana_account::Account) -> Self {
        Self {
            owner: account.owner,
            lamports: account.lamports,
            data: account.data,
        }
    }
}

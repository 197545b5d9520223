//! Transaction model consumed by the tree builder and the detector
//!
//! Built from RPC responses by [`crate::monitor::transaction`], or directly in
//! tests. Nothing here is mutated once a transaction has been parsed.

use serde::{Serialize, Serializer};
use solana_pubkey::Pubkey;

/// A compiled instruction, top-level or inner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionRecord {
    /// Index of the invoked program in the transaction's account keys
    pub program_id_index: u8,
    /// Account-key indexes passed to the program, in order
    pub accounts: Vec<u8>,
    /// Raw instruction payload
    #[serde(serialize_with = "serialize_base58")]
    pub data: Vec<u8>,
    /// Declared invocation stack height, 1 for top-level instructions.
    /// Absent on data recorded before the runtime started reporting it.
    pub stack_height: Option<u32>,
}

impl InstructionRecord {
    /// Create a new instruction without a declared stack height
    pub fn new(program_id_index: u8, accounts: Vec<u8>, data: Vec<u8>) -> Self {
        Self {
            program_id_index,
            accounts,
            data,
            stack_height: None,
        }
    }

    /// Set the declared stack height
    pub fn with_stack_height(mut self, stack_height: u32) -> Self {
        self.stack_height = Some(stack_height);
        self
    }

    /// Resolve the invoked program against the transaction's account keys
    pub fn program_id<'k>(&self, account_keys: &'k [Pubkey]) -> Option<&'k Pubkey> {
        account_keys.get(self.program_id_index as usize)
    }

    /// Resolve the account passed at `position`
    pub fn account<'k>(&self, account_keys: &'k [Pubkey], position: usize) -> Option<&'k Pubkey> {
        self.accounts
            .get(position)
            .and_then(|index| account_keys.get(*index as usize))
    }
}

/// Inner instructions executed on behalf of one top-level instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerInstructionGroup {
    /// Index of the parent top-level instruction
    pub index: u8,
    /// Instructions in execution order
    pub instructions: Vec<InstructionRecord>,
}

impl InnerInstructionGroup {
    pub fn new(index: u8, instructions: Vec<InstructionRecord>) -> Self {
        Self { index, instructions }
    }

    /// Whether any instruction of the group carries a declared stack height
    pub fn declares_stack_height(&self) -> bool {
        self.instructions.iter().any(|ix| ix.stack_height.is_some())
    }
}

/// Execution results attached to a confirmed transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionMeta {
    /// Lamport balances before execution, indexed like the account keys
    pub pre_balances: Vec<u64>,
    /// Lamport balances after execution, indexed like the account keys
    pub post_balances: Vec<u64>,
    pub inner_instructions: Option<Vec<InnerInstructionGroup>>,
    pub log_messages: Option<Vec<String>>,
    /// The transaction executed but returned an error
    pub failed: bool,
}

/// A fetched transaction with resolved account keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTransaction {
    pub signature: Option<String>,
    pub slot: Option<u64>,
    /// Static keys, then lookup-table writable keys, then lookup-table readonly keys
    pub account_keys: Vec<Pubkey>,
    /// Top-level instructions in order
    pub instructions: Vec<InstructionRecord>,
    pub meta: Option<TransactionMeta>,
}

impl ParsedTransaction {
    /// Inner-instruction groups, empty when the metadata carries none
    pub fn inner_groups(&self) -> &[InnerInstructionGroup] {
        self.meta
            .as_ref()
            .and_then(|meta| meta.inner_instructions.as_deref())
            .unwrap_or(&[])
    }

    pub fn log_messages(&self) -> Option<&[String]> {
        self.meta.as_ref().and_then(|meta| meta.log_messages.as_deref())
    }

    /// Signature for log output
    pub fn label(&self) -> &str {
        self.signature.as_deref().unwrap_or("<unsigned>")
    }
}

fn serialize_base58<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&bs58::encode(data).into_string())
}

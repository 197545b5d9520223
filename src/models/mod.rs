//! Data models for transactions, call trees and detection results

pub mod transaction;
pub mod call_node;
pub mod account;
pub mod created_account;

#[cfg(test)]
mod tests;

pub use self::transaction::{InnerInstructionGroup, InstructionRecord, ParsedTransaction, TransactionMeta};
pub use self::call_node::{pre_order, CallNode, PreOrder};
pub use self::account::AccountInfo;
pub use self::created_account::{AccountClass, CreatedAccountRecord, Signals};

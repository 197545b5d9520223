/// System program instruction discriminants.
///
/// System instructions are bincode-encoded, so the tag is a little-endian
/// `u32` at the start of the instruction data.
pub mod system_instruction {
    pub const CREATE_ACCOUNT: u32 = 0;
    pub const CREATE_ACCOUNT_WITH_SEED: u32 = 3;
    pub const ALLOCATE: u32 = 8;
    pub const ALLOCATE_WITH_SEED: u32 = 9;
}

pub use system_instruction::*;

/// Length of the discriminant prefix
pub const DISCRIMINANT_LEN: usize = 4;

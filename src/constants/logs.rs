//! Markers printed by the runtime into transaction log messages

/// Every runtime log line about an invocation starts with this
pub const PROGRAM_PREFIX: &str = "Program ";

/// `Program <id> invoke [<stack height>]`
pub const INVOKE_PREFIX: &str = "invoke [";

/// `Program <id> success`
pub const SUCCESS: &str = "success";

/// `Program <id> failed: <reason>`
pub const FAILED_PREFIX: &str = "failed: ";

/// Emitted once the log byte limit is hit; nothing after it can be trusted
pub const LOG_TRUNCATED: &str = "Log truncated";

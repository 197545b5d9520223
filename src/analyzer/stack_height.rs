//! Stack heights reconstructed from log messages
//!
//! Transactions recorded before the runtime reported `stackHeight` still
//! carry their program logs. Each `Program <id> invoke [n]` line opens one
//! instruction and each `success` / `failed:` line closes the innermost open
//! one, so replaying the logs against the instructions in execution order
//! recovers every instruction's depth.

use std::str::FromStr;
use log::{debug, warn};
use solana_pubkey::Pubkey;

use crate::constants::logs::{FAILED_PREFIX, INVOKE_PREFIX, LOG_TRUNCATED, PROGRAM_PREFIX, SUCCESS};
use crate::models::{InnerInstructionGroup, InstructionRecord, ParsedTransaction};

/// Runtime log line relevant to depth tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    /// `Program <id> invoke [<height>]`
    Invoke { program_id: Pubkey, height: u32 },
    /// `Program <id> success` or `Program <id> failed: ...`
    Exit { program_id: Pubkey },
    /// Anything else, including program-emitted `Program log:` lines
    Other,
}

/// Classify one log line
pub fn parse_log_line(line: &str) -> LogEvent {
    let Some(rest) = line.strip_prefix(PROGRAM_PREFIX) else {
        return LogEvent::Other;
    };
    let Some((id, tail)) = rest.split_once(' ') else {
        return LogEvent::Other;
    };
    let Ok(program_id) = Pubkey::from_str(id) else {
        return LogEvent::Other;
    };

    if let Some(height) = tail
        .strip_prefix(INVOKE_PREFIX)
        .and_then(|h| h.strip_suffix(']'))
        .and_then(|h| h.parse::<u32>().ok())
    {
        return LogEvent::Invoke { program_id, height };
    }
    if tail == SUCCESS || tail.starts_with(FAILED_PREFIX) {
        return LogEvent::Exit { program_id };
    }
    LogEvent::Other
}

/// Position of an instruction in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    TopLevel(usize),
    Inner { group: usize, position: usize },
}

fn execution_order(instructions: &[InstructionRecord], groups: &[InnerInstructionGroup]) -> Vec<Slot> {
    let mut order = Vec::new();
    for top in 0..instructions.len() {
        order.push(Slot::TopLevel(top));
        for (group_index, group) in groups.iter().enumerate() {
            if group.index as usize == top {
                order.extend((0..group.instructions.len()).map(|position| Slot::Inner {
                    group: group_index,
                    position,
                }));
            }
        }
    }
    order
}

/// Position in `order` of the top-level instruction invoking `program_id`,
/// starting at `from`.
///
/// Precompiled programs (signature verification) run without an invoke line,
/// so top-level slots that do not match are stepped over. Inner slots are
/// never skipped; `from` is returned unchanged when no match is found.
fn next_invoked_top_level(
    order: &[Slot],
    account_keys: &[Pubkey],
    instructions: &[InstructionRecord],
    from: usize,
    program_id: &Pubkey,
) -> usize {
    for (offset, slot) in order[from.min(order.len())..].iter().enumerate() {
        let Slot::TopLevel(top) = slot else {
            break;
        };
        if instructions[*top].program_id(account_keys) == Some(program_id) {
            if offset > 0 {
                debug!("Skipping {} top-level instructions without invoke logs", offset);
            }
            return from + offset;
        }
    }
    from
}

/// Rebuild stack heights from `logs` for every group that declares none.
///
/// Groups that already declare heights are returned unchanged. Top-level
/// instructions that logged no invocation are skipped. Otherwise replay stops
/// at the first line that disagrees with the instruction list (wrong program,
/// unexpected height, more invocations than instructions) or at a truncation
/// marker; instructions after that point stay unannotated and fall back to
/// the tree builder's default depth.
pub fn annotate_stack_heights(
    account_keys: &[Pubkey],
    instructions: &[InstructionRecord],
    groups: &[InnerInstructionGroup],
    logs: &[String],
) -> Vec<InnerInstructionGroup> {
    let mut annotated = groups.to_vec();
    if groups.iter().all(InnerInstructionGroup::declares_stack_height) {
        return annotated;
    }

    let order = execution_order(instructions, groups);
    let mut heights: Vec<Option<u32>> = vec![None; order.len()];
    let mut depth: u32 = 0;
    let mut next = 0;

    for line in logs {
        if line.starts_with(LOG_TRUNCATED) {
            warn!("Log messages truncated after {} invocations", next);
            break;
        }
        match parse_log_line(line) {
            LogEvent::Invoke { program_id, height } => {
                depth += 1;
                if depth == 1 {
                    next = next_invoked_top_level(&order, account_keys, instructions, next, &program_id);
                }
                let Some(slot) = order.get(next).copied() else {
                    warn!("Log invokes {} beyond the last recorded instruction", program_id);
                    break;
                };
                let record = match slot {
                    Slot::TopLevel(top) => &instructions[top],
                    Slot::Inner { group, position } => &groups[group].instructions[position],
                };
                let is_top_level = matches!(slot, Slot::TopLevel(_));
                if height != depth
                    || is_top_level != (depth == 1)
                    || record.program_id(account_keys) != Some(&program_id)
                {
                    warn!(
                        "Log line '{}' does not match instruction {} at depth {}, ignoring remaining logs",
                        line, next, depth
                    );
                    break;
                }
                heights[next] = Some(depth);
                next += 1;
            }
            LogEvent::Exit { .. } => depth = depth.saturating_sub(1),
            LogEvent::Other => {}
        }
    }

    for (slot, height) in order.iter().zip(heights) {
        if let (Slot::Inner { group, position }, Some(height)) = (slot, height) {
            if !groups[*group].declares_stack_height() {
                annotated[*group].instructions[*position].stack_height = Some(height);
            }
        }
    }
    debug!("Reconstructed stack heights for {} of {} instructions from logs", next, order.len());
    annotated
}

/// Inner groups of `tx` with log-derived heights applied, or `None` when
/// every group declares heights or there are no logs to replay.
pub fn log_annotated_groups(tx: &ParsedTransaction) -> Option<Vec<InnerInstructionGroup>> {
    let groups = tx.inner_groups();
    if groups.iter().all(InnerInstructionGroup::declares_stack_height) {
        return None;
    }
    let logs = tx.log_messages()?;
    Some(annotate_stack_heights(&tx.account_keys, &tx.instructions, groups, logs))
}

/// Inject log-derived stack heights into `tx` in place.
///
/// Returns whether anything was annotated. Transactions without logs or
/// whose groups all declare heights are left untouched.
pub fn reconstruct_stack_heights(tx: &mut ParsedTransaction) -> bool {
    let Some(annotated) = log_annotated_groups(tx) else {
        return false;
    };
    let changed = annotated != tx.inner_groups();
    if let Some(meta) = tx.meta.as_mut() {
        meta.inner_instructions = Some(annotated);
    }
    changed
}

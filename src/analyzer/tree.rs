//! Call-tree reconstruction from flat inner-instruction groups
//!
//! Inner instructions arrive grouped by the top-level instruction that
//! triggered them, each group already in execution order. Nesting is
//! recovered from each instruction's stack height: an instruction at depth
//! `d` is a child of the most recent instruction at depth `d - 1`.

use log::debug;

use crate::analyzer::stack_height::reconstruct_stack_heights;
use crate::errors::{DetectorError, DetectorResult};
use crate::models::{CallNode, InnerInstructionGroup, InstructionRecord, ParsedTransaction};

/// Depth of a top-level instruction
pub const TOP_LEVEL_DEPTH: u32 = 1;

/// Depth assumed for an inner instruction with no height information.
/// This is a policy choice (direct child of the top-level instruction), not
/// a claim about what happened on chain.
pub const DEFAULT_INNER_DEPTH: u32 = 2;

/// Build the call forest of a transaction, one root per top-level instruction.
///
/// An inner instruction without a declared `stack_height` inherits the depth
/// of the previous instruction in its group, or [`DEFAULT_INNER_DEPTH`] when
/// it is the first one.
///
/// # Errors
///
/// [`DetectorError::MalformedInput`] when a group names a top-level
/// instruction that does not exist, when an inner instruction claims the top
/// level, or when depth increases by more than one step.
pub fn build_tree<'a>(
    instructions: &'a [InstructionRecord],
    inner_groups: &'a [InnerInstructionGroup],
) -> DetectorResult<Vec<CallNode<'a>>> {
    let mut roots: Vec<CallNode<'a>> = instructions
        .iter()
        .map(|ix| CallNode::new(ix, TOP_LEVEL_DEPTH))
        .collect();
    // Active path below each root, as child positions. The node at the end of
    // a path of length n sits at depth n + 1.
    let mut paths: Vec<Vec<usize>> = vec![Vec::new(); roots.len()];
    let root_count = roots.len();

    for group in inner_groups {
        let parent = group.index as usize;
        let root = roots.get_mut(parent).ok_or_else(|| {
            DetectorError::MalformedInput(format!(
                "inner instruction group references top-level instruction {} but only {} exist",
                parent, root_count
            ))
        })?;
        let path = &mut paths[parent];
        let mut previous_depth = DEFAULT_INNER_DEPTH;

        for (position, ix) in group.instructions.iter().enumerate() {
            let depth = ix.stack_height.unwrap_or(previous_depth);
            if depth <= TOP_LEVEL_DEPTH {
                return Err(DetectorError::MalformedInput(format!(
                    "inner instruction {} of group {} has stack height {}",
                    position, parent, depth
                )));
            }
            let active_depth = path.len() as u32 + TOP_LEVEL_DEPTH;
            if depth > active_depth + 1 {
                return Err(DetectorError::MalformedInput(format!(
                    "inner instruction {} of group {} jumps from depth {} to {}",
                    position, parent, active_depth, depth
                )));
            }

            // Pop back to the parent at depth - 1.
            path.truncate((depth - 1 - TOP_LEVEL_DEPTH) as usize);
            let siblings = &mut node_at_path(root, path).children;
            siblings.push(CallNode::new(ix, depth));
            let child = siblings.len() - 1;
            path.push(child);
            previous_depth = depth;
        }
    }

    debug!(
        "Built call tree with {} roots and {} inner instructions",
        roots.len(),
        roots.iter().map(CallNode::descendant_count).sum::<usize>()
    );
    Ok(roots)
}

/// Build the call forest of a parsed transaction.
///
/// Uses declared stack heights only. Use [`build_tree_with_logs`] for
/// transactions that predate them.
pub fn build_transaction_tree(tx: &ParsedTransaction) -> DetectorResult<Vec<CallNode<'_>>> {
    build_tree(&tx.instructions, tx.inner_groups())
}

/// Build the call forest of `tx`, first filling in stack heights from its
/// logs for groups that declare none.
///
/// The recovered heights are written into `tx`, so later calls see an
/// annotated transaction.
pub fn build_tree_with_logs(tx: &mut ParsedTransaction) -> DetectorResult<Vec<CallNode<'_>>> {
    if reconstruct_stack_heights(tx) {
        debug!("Stack heights of {} reconstructed from logs", tx.label());
    }
    build_transaction_tree(tx)
}

fn node_at_path<'n, 'a>(root: &'n mut CallNode<'a>, path: &[usize]) -> &'n mut CallNode<'a> {
    let mut node = root;
    for &child in path {
        node = &mut node.children[child];
    }
    node
}

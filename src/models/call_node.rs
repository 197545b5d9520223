//! Call-tree nodes produced by [`crate::analyzer::tree`]

use serde::Serialize;
use crate::models::transaction::InstructionRecord;

/// One executed instruction and the instructions it invoked.
///
/// Nodes borrow their instruction from the transaction they were built from.
/// `depth` is 1 for top-level instructions and every child sits exactly one
/// level below its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallNode<'a> {
    pub instruction: &'a InstructionRecord,
    pub depth: u32,
    pub children: Vec<CallNode<'a>>,
}

impl<'a> CallNode<'a> {
    pub fn new(instruction: &'a InstructionRecord, depth: u32) -> Self {
        Self {
            instruction,
            depth,
            children: Vec::new(),
        }
    }

    /// Walk this node and its descendants in execution order
    pub fn pre_order(&self) -> PreOrder<'_, 'a> {
        PreOrder { stack: vec![self] }
    }

    /// Number of nodes below this one
    pub fn descendant_count(&self) -> usize {
        self.pre_order().count() - 1
    }
}

/// Pre-order walk over a forest of call nodes.
///
/// Because inner instructions are recorded chronologically, pre-order is the
/// on-chain execution order.
pub fn pre_order<'n, 'a>(forest: &'n [CallNode<'a>]) -> PreOrder<'n, 'a> {
    PreOrder {
        stack: forest.iter().rev().collect(),
    }
}

/// Iterator returned by [`pre_order`] and [`CallNode::pre_order`]
pub struct PreOrder<'n, 'a> {
    stack: Vec<&'n CallNode<'a>>,
}

impl<'n, 'a> Iterator for PreOrder<'n, 'a> {
    type Item = &'n CallNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

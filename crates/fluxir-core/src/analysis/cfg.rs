use crate::{block::BlockId, function::Function};
use std::collections::HashMap;

/// Predecessor/successor edges derived from block terminators. Blocks keep
/// their function order; edge queries answer in that same order.
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    entry: BlockId,
    exits: Vec<BlockId>,
    predecessors: HashMap<BlockId, Vec<BlockId>>,
    successors: HashMap<BlockId, Vec<BlockId>>,
}

impl ControlFlowGraph {
    pub fn build(function: &Function) -> Self {
        let entry = function.entry_block();
        let mut predecessors = HashMap::new();
        let mut successors = HashMap::new();
        let mut exits = Vec::new();

        for (&block_id, block) in &function.body.blocks {
            let succs = block.successors();

            if succs.is_empty() {
                exits.push(block_id);
            }

            for &succ in &succs {
                predecessors
                    .entry(succ)
                    .or_insert_with(Vec::new)
                    .push(block_id);
            }

            successors.insert(block_id, succs);
        }

        Self {
            entry,
            exits,
            predecessors,
            successors,
        }
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn exits(&self) -> &[BlockId] {
        &self.exits
    }

    pub fn predecessors(&self, block: BlockId) -> &[BlockId] {
        self.predecessors
            .get(&block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn successors(&self, block: BlockId) -> &[BlockId] {
        self.successors
            .get(&block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

use crate::pass::FunctionPass;
use anyhow::Result;
use fluxir_core::analysis::{binary_expr, AvailableExpressions, ControlFlowGraph, Definitions};
use fluxir_core::{BlockId, Function, Instruction};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const LEVEL_UNSET: u32 = u32::MAX;

/// Common-subexpression elimination driven by available expressions.
///
/// An expression recomputed in two or more blocks gets one shared stack slot:
/// the shallowest occurrence keeps its computation and seeds the slot, deeper
/// occurrences drop theirs and reload the slot. Depth is the block level below,
/// not dominance, so the pass is meant for acyclic forward-branching CFGs.
pub struct CommonSubexprElimination;

struct PlannedRewrite {
    block: BlockId,
    binary_index: usize,
    slot: usize,
    seeds_slot: bool,
}

impl CommonSubexprElimination {
    pub fn new() -> Self {
        Self
    }

    /// Distance from the entry, assigned in one pass over the blocks in
    /// function order: entry is 1, every other block is one more than the
    /// smallest level among its direct predecessors. A predecessor not yet
    /// visited (a back edge) still carries the unset sentinel when read, so
    /// blocks inside cycles can end up with meaningless levels.
    fn block_levels(function: &Function, cfg: &ControlFlowGraph) -> HashMap<BlockId, u32> {
        let mut levels: HashMap<BlockId, u32> = HashMap::new();
        for &block in function.body.blocks.keys() {
            let level = if block == cfg.entry() { 1 } else { LEVEL_UNSET };
            levels.insert(block, level);
        }

        let blocks: Vec<BlockId> = function.body.blocks.keys().copied().collect();
        for block in blocks {
            if block == cfg.entry() {
                continue;
            }

            let mut min = LEVEL_UNSET - 1;
            for &pred in cfg.predecessors(block) {
                let pred_level = levels.get(&pred).copied().unwrap_or(LEVEL_UNSET);
                if pred_level <= min {
                    min = pred_level;
                }
            }
            levels.insert(block, min.saturating_add(1));
        }

        levels
    }
}

impl Default for CommonSubexprElimination {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionPass for CommonSubexprElimination {
    fn name(&self) -> &'static str {
        "common-subexpr-elimination"
    }

    fn description(&self) -> &'static str {
        "Shares expressions recomputed across blocks through a stack slot"
    }

    fn run(&mut self, function: &mut Function) -> Result<bool> {
        let avail = AvailableExpressions::compute(function)?;
        let cfg = ControlFlowGraph::build(function);
        let defs = Definitions::build(&function.body);
        let levels = Self::block_levels(function, &cfg);

        // Restrict each block's OUT to the expressions the block itself
        // recomputes; availability alone is not an occurrence.
        let mut occurrences: Vec<(BlockId, Vec<String>)> = Vec::new();
        for (&block_id, block) in &function.body.blocks {
            let out = match avail.outs.get(&block_id) {
                Some(out) => out,
                None => continue,
            };

            let computed: BTreeSet<String> = block
                .instructions
                .iter()
                .filter_map(|inst| binary_expr(inst, &defs).map(|e| e.key))
                .collect();

            let kept: Vec<String> = out
                .iter()
                .filter(|key| computed.contains(key.as_str()))
                .cloned()
                .collect();
            if !kept.is_empty() {
                occurrences.push((block_id, kept));
            }
        }

        // An expression earns a slot only when distinct blocks recompute it.
        let mut expr_levels: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        let mut expr_blocks: BTreeMap<String, Vec<BlockId>> = BTreeMap::new();
        for (block_id, keys) in &occurrences {
            let level = levels.get(block_id).copied().unwrap_or(LEVEL_UNSET);
            for key in keys {
                expr_levels.entry(key.clone()).or_default().push(level);
                expr_blocks.entry(key.clone()).or_default().push(*block_id);
            }
        }
        expr_levels.retain(|_, block_levels| block_levels.len() >= 2);

        if expr_levels.is_empty() {
            return Ok(false);
        }

        let slot_names: Vec<String> = if expr_levels.len() == 1 {
            vec!["temp".to_string()]
        } else {
            (0..expr_levels.len())
                .map(|i| format!("temp{}", i))
                .collect()
        };

        if let Some(entry) = function.body.get_block_mut(cfg.entry()) {
            for (i, name) in slot_names.iter().enumerate() {
                entry.insert_instruction(i, Instruction::Alloca { var: name.clone() });
            }
        }

        // Plan against the instruction stream as it stands, then splice; the
        // scan must finish before any instruction moves.
        let mut planned: Vec<PlannedRewrite> = Vec::new();
        for (slot, (key, candidate_levels)) in expr_levels.iter().enumerate() {
            let min_level = candidate_levels
                .iter()
                .copied()
                .min()
                .unwrap_or(LEVEL_UNSET);

            let blocks = expr_blocks
                .get(key)
                .map(|v| v.as_slice())
                .unwrap_or(&[]);
            for &block_id in blocks {
                let level = levels.get(&block_id).copied().unwrap_or(LEVEL_UNSET);
                let block = match function.body.get_block(block_id) {
                    Some(block) => block,
                    None => continue,
                };

                for (index, inst) in block.instructions.iter().enumerate() {
                    let matches_key = binary_expr(inst, &defs)
                        .map(|e| e.key == *key)
                        .unwrap_or(false);
                    if !matches_key {
                        continue;
                    }

                    // The rewrite runs through the store that consumes the
                    // computation; a computation without one is left alone.
                    if let Some(Instruction::Store { .. }) = block.instructions.get(index + 1) {
                        planned.push(PlannedRewrite {
                            block: block_id,
                            binary_index: index,
                            slot,
                            seeds_slot: level == min_level,
                        });
                    }
                }
            }
        }

        // Highest indices first, so pending plans keep pointing at the right
        // instructions.
        planned.sort_by_key(|plan| (plan.block, Reverse(plan.binary_index)));

        for plan in planned {
            let slot_var = slot_names[plan.slot].clone();
            let store_index = plan.binary_index + 1;

            let reload = function.body.new_temp();
            let block = match function.body.get_block_mut(plan.block) {
                Some(block) => block,
                None => continue,
            };

            let (dest, stored) = match block.remove_instruction(store_index) {
                Instruction::Store { var, value } => (var, value),
                other => {
                    block.insert_instruction(store_index, other);
                    continue;
                }
            };

            if plan.seeds_slot {
                // Defining site: keep the computation, route its result
                // through the slot on the way to the original destination.
                block.insert_instruction(
                    store_index,
                    Instruction::Store {
                        var: slot_var.clone(),
                        value: stored,
                    },
                );
                block.insert_instruction(
                    store_index + 1,
                    Instruction::Load {
                        result: reload,
                        var: slot_var,
                    },
                );
                block.insert_instruction(
                    store_index + 2,
                    Instruction::Store {
                        var: dest,
                        value: reload,
                    },
                );
            } else {
                // Consumer site: drop the recomputation and read the slot.
                block.insert_instruction(
                    store_index,
                    Instruction::Load {
                        result: reload,
                        var: slot_var,
                    },
                );
                block.insert_instruction(
                    store_index + 1,
                    Instruction::Store {
                        var: dest,
                        value: reload,
                    },
                );
                block.remove_instruction(plan.binary_index);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxir_core::FunctionBuilder;

    #[test]
    fn test_diamond_levels() {
        let mut func = FunctionBuilder::new("diamond");
        let left = func.create_block_id();
        let right = func.create_block_id();
        let merge = func.create_block_id();

        {
            let mut entry = func.entry_block();
            let cond = entry.load("c");
            entry.branch(cond, left, right);
        }
        {
            let mut block = func.switch_to_block(left).unwrap();
            block.jump(merge);
        }
        {
            let mut block = func.switch_to_block(right).unwrap();
            block.jump(merge);
        }
        {
            let mut block = func.switch_to_block(merge).unwrap();
            block.return_void();
        }

        let function = func.build().unwrap();
        let cfg = ControlFlowGraph::build(&function);
        let levels = CommonSubexprElimination::block_levels(&function, &cfg);

        assert_eq!(levels[&function.entry_block()], 1);
        assert_eq!(levels[&left], 2);
        assert_eq!(levels[&right], 2);
        assert_eq!(levels[&merge], 3);
    }

    #[test]
    fn test_back_edge_level_is_meaningless() {
        // The body precedes the header in function order, so the header's
        // level is unset when the body reads it.
        let mut func = FunctionBuilder::new("looped");
        let body = func.create_block_id();
        let header = func.create_block_id();
        let exit = func.create_block_id();

        {
            let mut entry = func.entry_block();
            entry.jump(header);
        }
        {
            let mut block = func.switch_to_block(body).unwrap();
            block.jump(header);
        }
        {
            let mut block = func.switch_to_block(header).unwrap();
            let cond = block.load("c");
            block.branch(cond, body, exit);
        }
        {
            let mut block = func.switch_to_block(exit).unwrap();
            block.return_void();
        }

        let function = func.build().unwrap();
        let cfg = ControlFlowGraph::build(&function);
        let levels = CommonSubexprElimination::block_levels(&function, &cfg);

        assert_eq!(levels[&body], u32::MAX);
        assert_eq!(levels[&header], 2);
        assert_eq!(levels[&exit], 3);
    }
}

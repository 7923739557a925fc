use super::cfg::ControlFlowGraph;
use super::expr::target_variable;
use super::solver::{DataflowResult, DataflowSolver, FactSet};
use crate::{block::BlockId, function::Function, Result};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Definitions keyed by instruction position. Positions are assigned by one
/// pass over the whole function in block order, so they are unique and
/// totally ordered across blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DefMap(pub BTreeMap<usize, String>);

impl DefMap {
    pub fn contains_position(&self, position: usize) -> bool {
        self.0.contains_key(&position)
    }

    pub fn position_of(&self, var: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(_, v)| v.as_str() == var)
            .map(|(&p, _)| p)
    }
}

impl FactSet for DefMap {
    fn empty() -> Self {
        Self(BTreeMap::new())
    }

    // May-analysis: facts from any predecessor survive the meet.
    fn meet(&self, other: &Self) -> Self {
        self.union(other)
    }

    fn union(&self, other: &Self) -> Self {
        let mut merged = self.0.clone();
        merged.extend(other.0.iter().map(|(&p, v)| (p, v.clone())));
        Self(merged)
    }

    fn difference(&self, other: &Self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(p, _)| !other.0.contains_key(p))
                .map(|(&p, v)| (p, v.clone()))
                .collect(),
        )
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for DefMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (position, var)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", position, var)?;
        }
        write!(f, "}}")
    }
}

/// May-analysis: which stores can still reach each block's boundary without
/// being overwritten on the way.
#[derive(Debug, Clone)]
pub struct ReachingDefinitions {
    pub gen: IndexMap<BlockId, DefMap>,
    pub kill: IndexMap<BlockId, DefMap>,
    pub ins: IndexMap<BlockId, DefMap>,
    pub outs: IndexMap<BlockId, DefMap>,
}

impl ReachingDefinitions {
    pub fn compute(function: &Function) -> Result<Self> {
        let cfg = ControlFlowGraph::build(function);

        let mut gen: IndexMap<BlockId, DefMap> = IndexMap::new();
        let mut kill: IndexMap<BlockId, DefMap> = IndexMap::new();

        // Positions count every instruction, 1-based, across the whole
        // function. Within a block only the last store to a variable stays in
        // GEN; the ones it shadows move to KILL.
        let mut position = 0usize;
        for (&block_id, block) in &function.body.blocks {
            let mut generated: BTreeMap<usize, String> = BTreeMap::new();
            let mut killed: BTreeMap<usize, String> = BTreeMap::new();

            for inst in &block.instructions {
                position += 1;

                if inst.is_store() {
                    if let Some(var) = target_variable(inst) {
                        let shadowed = generated
                            .iter()
                            .find(|(_, v)| v.as_str() == var)
                            .map(|(&p, _)| p);
                        if let Some(p) = shadowed {
                            killed.insert(p, var.to_string());
                            generated.remove(&p);
                        }
                        generated.insert(position, var.to_string());
                    }
                }
            }

            gen.insert(block_id, DefMap(generated));
            kill.insert(block_id, DefMap(killed));
        }

        // A definition of a variable also kills the definitions its direct
        // predecessors generate for that variable. One hop only; definitions
        // further up the graph are left to the iteration to wash out.
        let mut augmented: Vec<(BlockId, usize, String)> = Vec::new();
        for (&block_id, generated) in &gen {
            for var in generated.0.values() {
                for &pred in cfg.predecessors(block_id) {
                    if let Some(pred_gen) = gen.get(&pred) {
                        if let Some(p) = pred_gen.position_of(var) {
                            augmented.push((block_id, p, var.clone()));
                        }
                    }
                }
            }
        }
        for (block_id, p, var) in augmented {
            if let Some(killed) = kill.get_mut(&block_id) {
                killed.0.insert(p, var);
            }
        }

        let initial = gen.clone();
        let solver = DataflowSolver::new(gen.clone(), kill.clone(), initial);
        let DataflowResult { ins, outs } = solver.solve(&cfg)?;

        Ok(Self {
            gen,
            kill,
            ins,
            outs,
        })
    }

    pub fn dump(&self) -> String {
        let mut output = String::new();

        for (block_id, out) in &self.outs {
            writeln!(&mut output, "{}:", block_id).unwrap();
            writeln!(&mut output, "  gen:  {}", self.gen[block_id]).unwrap();
            writeln!(&mut output, "  kill: {}", self.kill[block_id]).unwrap();
            writeln!(&mut output, "  in:   {}", self.ins[block_id]).unwrap();
            writeln!(&mut output, "  out:  {}", out).unwrap();
        }

        output
    }
}

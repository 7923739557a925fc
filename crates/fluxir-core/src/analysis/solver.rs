use super::cfg::ControlFlowGraph;
use crate::{block::BlockId, IrError, Result};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Per-block fact container a forward analysis iterates over. Must-analyses
/// meet with intersection, may-analyses with union; everything else about the
/// fixpoint loop is shared.
pub trait FactSet: Clone + PartialEq {
    fn empty() -> Self;
    fn meet(&self, other: &Self) -> Self;
    fn union(&self, other: &Self) -> Self;
    fn difference(&self, other: &Self) -> Self;
    fn len(&self) -> usize;
}

#[derive(Debug, Clone)]
pub struct DataflowResult<F> {
    pub ins: IndexMap<BlockId, F>,
    pub outs: IndexMap<BlockId, F>,
}

/// Forward iterative solver for `OUT[B] = GEN[B] ∪ (meet over preds − KILL[B])`.
///
/// The entry block — and any other block without predecessors — is boundary
/// state: its OUT stays at the supplied initial value and is never updated.
#[derive(Debug, Clone)]
pub struct DataflowSolver<F> {
    gen: IndexMap<BlockId, F>,
    kill: IndexMap<BlockId, F>,
    initial: IndexMap<BlockId, F>,
}

impl<F: FactSet> DataflowSolver<F> {
    pub fn new(
        gen: IndexMap<BlockId, F>,
        kill: IndexMap<BlockId, F>,
        initial: IndexMap<BlockId, F>,
    ) -> Self {
        Self { gen, kill, initial }
    }

    pub fn solve(&self, cfg: &ControlFlowGraph) -> Result<DataflowResult<F>> {
        let mut outs = self.initial.clone();
        let mut ins: IndexMap<BlockId, F> =
            outs.keys().map(|&block| (block, F::empty())).collect();

        let block_ids: Vec<BlockId> = outs.keys().copied().collect();

        // The lattice has finite height, so the fixpoint arrives within
        // |blocks| × |universe| rounds on well-formed input; anything beyond
        // that bound is a modeling bug, not a state to return from.
        let universe = self
            .gen
            .values()
            .chain(self.initial.values())
            .map(F::len)
            .max()
            .unwrap_or(0);
        let max_rounds = (block_ids.len() * (universe + 2)).max(4);

        for _round in 0..max_rounds {
            let mut stable: HashMap<BlockId, bool> = HashMap::new();

            for &block in &block_ids {
                let preds = cfg.predecessors(block);
                if preds.is_empty() {
                    continue;
                }

                let mut combined: Option<F> = None;
                for &pred in preds {
                    if let Some(pred_out) = outs.get(&pred) {
                        combined = Some(match combined {
                            Some(acc) => acc.meet(pred_out),
                            None => pred_out.clone(),
                        });
                    }
                }
                let incoming = combined.unwrap_or_else(F::empty);

                let gen = self.gen.get(&block).cloned().unwrap_or_else(F::empty);
                let kill = self.kill.get(&block).cloned().unwrap_or_else(F::empty);
                let out = gen.union(&incoming.difference(&kill));

                stable.insert(block, outs.get(&block) == Some(&out));

                ins.insert(block, incoming);
                outs.insert(block, out);
            }

            if stable.values().all(|&unchanged| unchanged) {
                return Ok(DataflowResult { ins, outs });
            }
        }

        Err(IrError::FixpointDiverged {
            rounds: max_rounds,
            blocks: block_ids.len(),
        })
    }
}

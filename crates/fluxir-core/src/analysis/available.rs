use super::cfg::ControlFlowGraph;
use super::expr::{binary_expr, target_variable, BinaryExpr, Definitions};
use super::solver::{DataflowResult, DataflowSolver, FactSet};
use crate::{
    block::{BasicBlock, BlockId},
    function::Function,
    Result,
};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

/// Ordered set of expression keys, so reports and dumps are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExprSet(pub BTreeSet<String>);

impl ExprSet {
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FactSet for ExprSet {
    fn empty() -> Self {
        Self(BTreeSet::new())
    }

    fn meet(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }

    fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for ExprSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", key)?;
        }
        write!(f, "}}")
    }
}

/// Must-analysis: which expressions are guaranteed computed, with operands
/// unchanged since, on every path reaching each block's exit.
#[derive(Debug, Clone)]
pub struct AvailableExpressions {
    pub universe: ExprSet,
    pub gen: IndexMap<BlockId, ExprSet>,
    pub kill: IndexMap<BlockId, ExprSet>,
    pub ins: IndexMap<BlockId, ExprSet>,
    pub outs: IndexMap<BlockId, ExprSet>,
}

impl AvailableExpressions {
    pub fn compute(function: &Function) -> Result<Self> {
        let cfg = ControlFlowGraph::build(function);
        let defs = Definitions::build(&function.body);

        let mut all_exprs: BTreeSet<BinaryExpr> = BTreeSet::new();
        for block in function.body.blocks.values() {
            for inst in &block.instructions {
                if let Some(expr) = binary_expr(inst, &defs) {
                    all_exprs.insert(expr);
                }
            }
        }
        let universe = ExprSet(all_exprs.iter().map(|e| e.key.clone()).collect());

        let mut gen = IndexMap::new();
        let mut kill = IndexMap::new();
        let mut initial = IndexMap::new();

        for (&block_id, block) in &function.body.blocks {
            let generated = Self::generated(block, &defs);
            let killed = Self::killed(block, &defs, &all_exprs);

            // The meet is intersection, so every non-boundary block starts at
            // the full universe; boundary blocks are pinned to their GEN.
            let init = if cfg.predecessors(block_id).is_empty() {
                generated.clone()
            } else {
                universe.clone()
            };

            gen.insert(block_id, generated);
            kill.insert(block_id, killed);
            initial.insert(block_id, init);
        }

        let solver = DataflowSolver::new(gen.clone(), kill.clone(), initial);
        let DataflowResult { ins, outs } = solver.solve(&cfg)?;

        Ok(Self {
            universe,
            gen,
            kill,
            ins,
            outs,
        })
    }

    /// Expressions computed in the block and still valid at its exit. The
    /// scan is strictly sequential: a store to an operand drops the most
    /// recent expression built over it, and a later recomputation re-adds
    /// the key.
    fn generated(block: &BasicBlock, defs: &Definitions) -> ExprSet {
        let mut generated = BTreeSet::new();
        let mut operand_exprs: HashMap<String, String> = HashMap::new();

        for inst in &block.instructions {
            if let Some(expr) = binary_expr(inst, defs) {
                generated.insert(expr.key.clone());
                operand_exprs.insert(expr.lhs, expr.key.clone());
                operand_exprs.insert(expr.rhs, expr.key);
            }

            if inst.is_store() {
                if let Some(var) = target_variable(inst) {
                    if let Some(key) = operand_exprs.get(var) {
                        generated.remove(key);
                    }
                }
            }
        }

        ExprSet(generated)
    }

    /// Universe expressions invalidated by the block's stores. A key
    /// recomputed after the store that killed it moves back out of KILL.
    fn killed(block: &BasicBlock, defs: &Definitions, all_exprs: &BTreeSet<BinaryExpr>) -> ExprSet {
        let mut killed = BTreeSet::new();

        for inst in &block.instructions {
            if inst.is_store() {
                if let Some(var) = target_variable(inst) {
                    for expr in all_exprs {
                        if var == expr.lhs || var == expr.rhs {
                            killed.insert(expr.key.clone());
                        }
                    }
                }
            }

            if let Some(expr) = binary_expr(inst, defs) {
                killed.remove(&expr.key);
            }
        }

        ExprSet(killed)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;

    #[test]
    fn test_store_invalidates_generated_expression() {
        let mut func = FunctionBuilder::new("invalidate");

        {
            let mut entry = func.entry_block();
            let a = entry.load("a");
            let b = entry.load("b");
            let sum = entry.add(a, b);
            entry.store("d", sum);
            let one = entry.constant(1);
            entry.store("a", one);
            entry.return_void();
        }

        let function = func.build().unwrap();
        let avail = AvailableExpressions::compute(&function).unwrap();
        let entry = function.entry_block();

        assert!(avail.gen[&entry].is_empty());
        assert!(avail.kill[&entry].contains("a+b"));
    }

    #[test]
    fn test_store_invalidates_only_latest_expression_over_operand() {
        let mut func = FunctionBuilder::new("latest_only");

        {
            let mut entry = func.entry_block();
            let a = entry.load("a");
            let b = entry.load("b");
            let sum = entry.add(a, b);
            entry.store("d", sum);
            let a2 = entry.load("a");
            let c = entry.load("c");
            let sum2 = entry.add(a2, c);
            entry.store("e", sum2);
            let one = entry.constant(1);
            entry.store("a", one);
            entry.return_void();
        }

        let function = func.build().unwrap();
        let avail = AvailableExpressions::compute(&function).unwrap();
        let entry = function.entry_block();

        // The store to a drops only the most recently built expression over
        // a; the earlier a+b stays in GEN even though a changed. KILL has no
        // such blind spot and records both.
        assert!(avail.gen[&entry].contains("a+b"));
        assert!(!avail.gen[&entry].contains("a+c"));
        assert!(avail.kill[&entry].contains("a+b"));
        assert!(avail.kill[&entry].contains("a+c"));
    }

    #[test]
    fn test_recomputation_reinstates_expression() {
        let mut func = FunctionBuilder::new("reinstate");

        {
            let mut entry = func.entry_block();
            let a = entry.load("a");
            let b = entry.load("b");
            let sum = entry.add(a, b);
            entry.store("d", sum);
            let one = entry.constant(1);
            entry.store("a", one);
            let a2 = entry.load("a");
            let b2 = entry.load("b");
            let sum2 = entry.add(a2, b2);
            entry.store("e", sum2);
            entry.return_void();
        }

        let function = func.build().unwrap();
        let avail = AvailableExpressions::compute(&function).unwrap();
        let entry = function.entry_block();

        // The second a+b lands after the store to a, so it is generated and
        // the kill from that store is withdrawn.
        assert!(avail.gen[&entry].contains("a+b"));
        assert!(avail.kill[&entry].is_empty());
        assert_eq!(avail.outs[&entry], avail.gen[&entry]);
    }

    #[test]
    fn test_two_block_chain_propagates_availability() {
        let mut func = FunctionBuilder::new("chain");
        let l1 = func.create_block_id();

        {
            let mut entry = func.entry_block();
            let b = entry.load("b");
            let c = entry.load("c");
            let sum = entry.add(b, c);
            entry.store("a", sum);
            entry.jump(l1);
        }
        {
            let mut block = func.switch_to_block(l1).unwrap();
            let b = block.load("b");
            let c = block.load("c");
            let sum = block.add(b, c);
            block.store("d", sum);
            block.return_void();
        }

        let function = func.build().unwrap();
        let avail = AvailableExpressions::compute(&function).unwrap();
        let entry = function.entry_block();

        let expected: BTreeSet<String> = ["b+c".to_string()].into_iter().collect();
        assert_eq!(avail.outs[&entry].0, expected);
        assert_eq!(avail.outs[&l1].0, expected);
        assert_eq!(avail.outs[&entry], avail.gen[&entry]);
    }

    #[test]
    fn test_merge_block_keeps_intersection_of_predecessors() {
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
            let x = block.load("x");
            let y = block.load("y");
            let sum = block.add(x, y);
            block.store("u", sum);
            let p = block.load("p");
            let q = block.load("q");
            let prod = block.mul(p, q);
            block.store("v", prod);
            block.jump(merge);
        }
        {
            let mut block = func.switch_to_block(right).unwrap();
            let x = block.load("x");
            let y = block.load("y");
            let sum = block.add(x, y);
            block.store("u", sum);
            block.jump(merge);
        }
        {
            let mut block = func.switch_to_block(merge).unwrap();
            block.return_void();
        }

        let function = func.build().unwrap();
        let avail = AvailableExpressions::compute(&function).unwrap();

        // p*q reaches the merge only along one path; x+y along both.
        assert!(avail.outs[&merge].contains("x+y"));
        assert!(!avail.outs[&merge].contains("p*q"));

        // The merge's OUT is exactly GEN ∪ (intersection of preds − KILL).
        let incoming = avail.outs[&left].meet(&avail.outs[&right]);
        let recomputed = avail.gen[&merge].union(&incoming.difference(&avail.kill[&merge]));
        assert_eq!(avail.outs[&merge], recomputed);
        assert_eq!(avail.ins[&merge], incoming);
    }

    #[test]
    fn test_dump_lists_every_block() {
        let mut func = FunctionBuilder::new("dump");

        {
            let mut entry = func.entry_block();
            let a = entry.load("a");
            let b = entry.load("b");
            let sum = entry.add(a, b);
            entry.store("c", sum);
            entry.return_void();
        }

        let function = func.build().unwrap();
        let avail = AvailableExpressions::compute(&function).unwrap();
        let text = avail.dump();

        assert!(text.contains("block0:"));
        assert!(text.contains("gen:  {a+b}"));
        assert!(text.contains("out:  {a+b}"));
    }
}

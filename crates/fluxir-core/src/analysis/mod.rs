/*! Dataflow analyses over a function's control-flow graph.
 *
 * Everything here is function-scoped: the CFG, the expression tables, and the per-block fact maps
 * are rebuilt on every call and discarded afterwards, so repeated runs can never observe stale
 * state from an earlier function.
 */

pub mod available;
pub mod cfg;
pub mod expr;
pub mod reaching;
pub mod solver;

pub use available::{AvailableExpressions, ExprSet};
pub use cfg::ControlFlowGraph;
pub use expr::{binary_expr, operand_name, target_variable, BinaryExpr, Definitions};
pub use reaching::{DefMap, ReachingDefinitions};
pub use solver::{DataflowResult, DataflowSolver, FactSet};

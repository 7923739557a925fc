/*! Unified interface for FluxIR dataflow analysis and optimization.
 *
 * Single import for everything you need: building functions, running the available-expressions
 * and reaching-definitions analyses, and rewriting functions with the CSE pass.
 */

pub use fluxir_core as core;
pub use fluxir_opt as opt;

pub use fluxir_core::{
    analysis::{AvailableExpressions, ControlFlowGraph, DataflowSolver, ReachingDefinitions},
    block::{BasicBlock, BlockId, Terminator},
    builder::{BlockBuilder, FunctionBuilder},
    format::format_function,
    function::{Function, FunctionBody},
    instructions::{Instruction, Opcode},
    values::{TempId, Value},
};

pub use fluxir_opt::{CommonSubexprElimination, FunctionPass};

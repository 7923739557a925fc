/*! Core IR types and dataflow analyses for FluxIR.
 *
 * Optimizing a function starts from a representation where control flow and memory traffic are
 * explicit. This crate provides a small memory-form IR (named variables, load/store, binary
 * operations), a builder to construct it, and the classical intraprocedural analyses computed over
 * it: available expressions and reaching definitions, both driven by a generic fixpoint solver.
 */

pub mod analysis;
pub mod block;
pub mod builder;
pub mod format;
pub mod function;
pub mod instructions;
pub mod ir_persist;
pub mod values;

pub use block::{BasicBlock, BlockId, Terminator};
pub use builder::{BlockBuilder, FunctionBuilder};
pub use function::{Function, FunctionBody};
pub use instructions::{Instruction, Opcode};
pub use values::{TempId, Value};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Builder error: {0}")]
    BuilderError(String),
    #[error("dataflow solver failed to converge after {rounds} rounds over {blocks} blocks")]
    FixpointDiverged { rounds: usize, blocks: usize },
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;

use crate::{
    block::{BasicBlock, Terminator},
    function::Function,
    instructions::Instruction,
};
use std::fmt::Write;

pub fn format_function(function: &Function) -> String {
    let mut output = String::new();

    writeln!(&mut output, "function @{} {{", function.name).unwrap();

    for (_block_id, block) in &function.body.blocks {
        write!(&mut output, "{}", format_block(block)).unwrap();
    }

    writeln!(&mut output, "}}").unwrap();

    output
}

fn format_block(block: &BasicBlock) -> String {
    let mut output = String::new();

    writeln!(&mut output, "\n{}:", block.id).unwrap();

    for inst in &block.instructions {
        writeln!(&mut output, "    {}", format_instruction(inst)).unwrap();
    }

    writeln!(&mut output, "    {}", format_terminator(&block.terminator)).unwrap();

    output
}

pub fn format_instruction(inst: &Instruction) -> String {
    match inst {
        Instruction::Alloca { var } => format!("{} = alloca", var),
        Instruction::Load { result, var } => format!("{} = load {}", result, var),
        Instruction::Store { var, value } => format!("store {}, {}", value, var),
        Instruction::Binary {
            op,
            result,
            lhs,
            rhs,
        } => format!("{} = {} {}, {}", result, op.mnemonic(), lhs, rhs),
    }
}

fn format_terminator(term: &Terminator) -> String {
    match term {
        Terminator::Jump(target) => format!("jump {}", target),
        Terminator::Branch {
            condition,
            then_block,
            else_block,
        } => format!("branch {}, {}, {}", condition, then_block, else_block),
        Terminator::Return(Some(value)) => format!("return {}", value),
        Terminator::Return(None) => "return".to_string(),
        Terminator::Invalid => "<invalid terminator>".to_string(),
    }
}

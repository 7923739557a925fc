use crate::values::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Sdiv,
    Srem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl Opcode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Sdiv => "sdiv",
            Opcode::Srem => "srem",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Shl => "shl",
            Opcode::Shr => "shr",
        }
    }

    /// Infix symbol used inside expression keys. Opcodes without a mapping
    /// collapse to an empty symbol; the resulting keys are degenerate but
    /// still distinct per operand pair.
    pub fn symbol(&self) -> &'static str {
        match self {
            Opcode::Add => "+",
            Opcode::Sub => "-",
            Opcode::Mul => "*",
            Opcode::Sdiv => "/",
            _ => "",
        }
    }
}

/// Memory-form instruction set. Named variables live in memory; `Load` and
/// `Binary` mint temporaries that later instructions consume as operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Alloca {
        var: String,
    },
    Load {
        result: Value,
        var: String,
    },
    Store {
        var: String,
        value: Value,
    },
    Binary {
        op: Opcode,
        result: Value,
        lhs: Value,
        rhs: Value,
    },
}

impl Instruction {
    pub fn result(&self) -> Option<&Value> {
        match self {
            Instruction::Load { result, .. } | Instruction::Binary { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Instruction::Binary { .. })
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Instruction::Store { .. })
    }

    pub fn is_load(&self) -> bool {
        matches!(self, Instruction::Load { .. })
    }
}

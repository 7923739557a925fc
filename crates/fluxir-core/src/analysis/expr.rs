use crate::{
    function::FunctionBody,
    instructions::Instruction,
    values::{TempId, Value},
};
use std::collections::HashMap;

/// Defining instruction of every temporary in a function, for resolving
/// operands back to the variable they were loaded from.
#[derive(Debug, Clone)]
pub struct Definitions {
    defs: HashMap<TempId, Instruction>,
}

impl Definitions {
    pub fn build(body: &FunctionBody) -> Self {
        let mut defs = HashMap::new();

        for block in body.blocks.values() {
            for inst in &block.instructions {
                if let Some(id) = inst.result().and_then(Value::as_temp) {
                    defs.insert(id, inst.clone());
                }
            }
        }

        Self { defs }
    }

    pub fn get(&self, id: TempId) -> Option<&Instruction> {
        self.defs.get(&id)
    }
}

/// Canonical form of a binary operation: both operand names and the exact
/// string key. Keys are not commutativity-normalized, so `a+b` and `b+a`
/// stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BinaryExpr {
    pub lhs: String,
    pub rhs: String,
    pub key: String,
}

/// Extracts the expression computed by a binary instruction. Operands fed by
/// a `Load` resolve to the loaded variable's name; anything else keeps its
/// literal text. Non-binary instructions have no expression.
pub fn binary_expr(inst: &Instruction, defs: &Definitions) -> Option<BinaryExpr> {
    match inst {
        Instruction::Binary { op, lhs, rhs, .. } => {
            let lhs = operand_name(lhs, defs);
            let rhs = operand_name(rhs, defs);
            let key = format!("{}{}{}", lhs, op.symbol(), rhs);

            Some(BinaryExpr { lhs, rhs, key })
        }
        _ => None,
    }
}

pub fn operand_name(value: &Value, defs: &Definitions) -> String {
    if let Some(id) = value.as_temp() {
        if let Some(Instruction::Load { var, .. }) = defs.get(id) {
            return var.clone();
        }
    }

    value.to_string()
}

/// The variable an instruction reads (`Load`) or writes (`Store`). Other
/// instructions touch no named variable directly.
pub fn target_variable(inst: &Instruction) -> Option<&str> {
    match inst {
        Instruction::Load { var, .. } | Instruction::Store { var, .. } => Some(var),
        _ => None,
    }
}

use crate::{
    block::{BlockId, Terminator},
    function::FunctionBody,
    instructions::{Instruction, Opcode},
    values::Value,
};

pub struct BlockBuilder<'a> {
    block_id: BlockId,
    body: &'a mut FunctionBody,
}

impl<'a> BlockBuilder<'a> {
    pub(super) fn new(block_id: BlockId, body: &'a mut FunctionBody) -> Self {
        Self { block_id, body }
    }

    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    fn push(&mut self, inst: Instruction) {
        self.body.push_instruction(self.block_id, inst);
    }

    pub fn alloca(&mut self, var: &str) {
        self.push(Instruction::Alloca {
            var: var.to_string(),
        });
    }

    pub fn load(&mut self, var: &str) -> Value {
        let result = self.body.new_temp();
        self.push(Instruction::Load {
            result,
            var: var.to_string(),
        });
        result
    }

    pub fn store(&mut self, var: &str, value: Value) {
        self.push(Instruction::Store {
            var: var.to_string(),
            value,
        });
    }

    pub fn binary(&mut self, op: Opcode, lhs: Value, rhs: Value) -> Value {
        let result = self.body.new_temp();
        self.push(Instruction::Binary {
            op,
            result,
            lhs,
            rhs,
        });
        result
    }

    pub fn add(&mut self, lhs: Value, rhs: Value) -> Value {
        self.binary(Opcode::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: Value, rhs: Value) -> Value {
        self.binary(Opcode::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: Value, rhs: Value) -> Value {
        self.binary(Opcode::Mul, lhs, rhs)
    }

    pub fn sdiv(&mut self, lhs: Value, rhs: Value) -> Value {
        self.binary(Opcode::Sdiv, lhs, rhs)
    }

    pub fn constant(&self, value: i64) -> Value {
        Value::Const(value)
    }

    pub fn jump(&mut self, target: BlockId) {
        self.body
            .set_terminator(self.block_id, Terminator::Jump(target));
    }

    pub fn branch(&mut self, condition: Value, then_block: BlockId, else_block: BlockId) {
        self.body.set_terminator(
            self.block_id,
            Terminator::Branch {
                condition,
                then_block,
                else_block,
            },
        );
    }

    pub fn return_value(&mut self, value: Value) {
        self.body
            .set_terminator(self.block_id, Terminator::Return(Some(value)));
    }

    pub fn return_void(&mut self) {
        self.body
            .set_terminator(self.block_id, Terminator::Return(None));
    }
}

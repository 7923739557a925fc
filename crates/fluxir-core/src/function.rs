use crate::block::{BasicBlock, BlockId, Terminator};
use crate::instructions::Instruction;
use crate::values::{TempId, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub body: FunctionBody,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: FunctionBody::new(),
        }
    }

    pub fn entry_block(&self) -> BlockId {
        self.body.entry_block()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionBody {
    pub entry_block: BlockId,
    pub blocks: IndexMap<BlockId, BasicBlock>,
    next_block_id: u32,
    next_temp_id: u32,
}

impl FunctionBody {
    pub fn new() -> Self {
        let entry_block = BlockId(0);
        let mut blocks = IndexMap::new();
        blocks.insert(entry_block, BasicBlock::new(entry_block));

        Self {
            entry_block,
            blocks,
            next_block_id: 1,
            next_temp_id: 0,
        }
    }

    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.blocks.insert(id, BasicBlock::new(id));
        id
    }

    pub fn get_block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn get_block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(&id)
    }

    pub fn entry_block(&self) -> BlockId {
        self.entry_block
    }

    pub fn new_temp(&mut self) -> Value {
        let id = TempId(self.next_temp_id);
        self.next_temp_id += 1;
        Value::Temp(id)
    }

    pub fn push_instruction(&mut self, block: BlockId, inst: Instruction) {
        if let Some(b) = self.blocks.get_mut(&block) {
            b.add_instruction(inst);
        }
    }

    pub fn set_terminator(&mut self, block: BlockId, term: Terminator) {
        if let Some(b) = self.blocks.get_mut(&block) {
            b.set_terminator(term);
        }
    }
}

impl Default for FunctionBody {
    fn default() -> Self {
        Self::new()
    }
}

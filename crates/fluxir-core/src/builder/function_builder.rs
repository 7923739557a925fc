use super::BlockBuilder;
use crate::{block::BlockId, function::Function, IrError, Result};

pub struct FunctionBuilder {
    function: Function,
    current_block: Option<BlockId>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            function: Function::new(name),
            current_block: None,
        }
    }

    pub fn create_block_id(&mut self) -> BlockId {
        self.function.body.create_block()
    }

    pub fn entry_block(&mut self) -> BlockBuilder<'_> {
        let block_id = self.function.body.entry_block();
        self.current_block = Some(block_id);
        BlockBuilder::new(block_id, &mut self.function.body)
    }

    pub fn switch_to_block(&mut self, block_id: BlockId) -> Result<BlockBuilder<'_>> {
        if !self.function.body.blocks.contains_key(&block_id) {
            return Err(IrError::BuilderError(format!(
                "{} does not exist in function {}",
                block_id, self.function.name
            )));
        }

        self.current_block = Some(block_id);
        Ok(BlockBuilder::new(block_id, &mut self.function.body))
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    pub fn current_function(&self) -> &Function {
        &self.function
    }

    /// Finishes the function, refusing to hand out a body with unterminated
    /// blocks.
    pub fn build(self) -> Result<Function> {
        for (id, block) in &self.function.body.blocks {
            if !block.is_terminated() {
                return Err(IrError::BuilderError(format!(
                    "{} in function {} has no terminator",
                    id, self.function.name
                )));
            }
        }

        Ok(self.function)
    }
}

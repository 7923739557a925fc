use anyhow::Result;
use fluxir_core::Function;

/// A transform over a single function. Passes own no cross-function state;
/// every `run` starts from the function alone.
pub trait FunctionPass {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }

    /// Returns whether the function's IR was changed.
    fn run(&mut self, function: &mut Function) -> Result<bool>;
}

use crate::vm::error::ExecFault;
use crate::vm::instruction::{Action, Instruction};
use crate::vm::state::ExecutionContext;

/// What the interpreter does after a node has been processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Advance to the next index.
    Next,
    /// Continue at a 1-based program index.
    Jump(usize),
    /// Record the action and advance.
    Emit(Action),
    /// Record the action and end the walk.
    EmitAndStop(Action),
    /// End the walk without recording anything.
    Stop,
}

/// A processor handles one category of behavior node.
pub trait InstructionProcessor {
    fn can_process(&self, instruction: &Instruction) -> bool;

    fn process(
        &self,
        ctx: &mut ExecutionContext,
        instruction: &Instruction,
    ) -> Result<Flow, ExecFault>;
}

use super::processor::{Flow, InstructionProcessor};
use crate::vm::condition::{self, Verdict};
use crate::vm::error::ExecFault;
use crate::vm::instruction::Instruction;
use crate::vm::state::ExecutionContext;

/// Processor for action nodes: applies the trigger rule and records what fires
pub struct ActionOperations;

impl ActionOperations {
    pub fn new() -> Self {
        ActionOperations
    }
}

impl Default for ActionOperations {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionProcessor for ActionOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(instruction, Instruction::Action(_))
    }

    fn process(
        &self,
        ctx: &mut ExecutionContext,
        instruction: &Instruction,
    ) -> Result<Flow, ExecFault> {
        let Instruction::Action(action) = instruction else {
            return Err(ExecFault::InvalidInstruction);
        };

        let verdict = condition::evaluate(action.condition.as_ref(), ctx);
        crate::debug_interp!(
            "skill {} ({:?}) at hp {} -> {:?}",
            action.skill_id,
            action.kind,
            ctx.hp,
            verdict
        );

        Ok(match verdict {
            Verdict::FireAndStop => Flow::EmitAndStop(action.clone()),
            Verdict::Fire => Flow::Emit(action.clone()),
            Verdict::Skip => Flow::Next,
        })
    }
}

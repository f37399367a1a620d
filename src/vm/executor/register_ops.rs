use super::processor::{Flow, InstructionProcessor};
use crate::vm::error::ExecFault;
use crate::vm::instruction::Instruction;
use crate::vm::state::ExecutionContext;

/// Processor for flag register and counter register mutations
pub struct RegisterOperations;

impl RegisterOperations {
    pub fn new() -> Self {
        RegisterOperations
    }
}

impl Default for RegisterOperations {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionProcessor for RegisterOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction,
            Instruction::FlagOperation { .. }
                | Instruction::SetCounter { .. }
                | Instruction::SetCounterIf { .. }
        )
    }

    fn process(
        &self,
        ctx: &mut ExecutionContext,
        instruction: &Instruction,
    ) -> Result<Flow, ExecFault> {
        match instruction {
            Instruction::FlagOperation { op, mask } => {
                ctx.apply_flag_operation(*op, *mask);
                crate::debug_interp!("flags {:?} {:#b} -> {:#b}", op, mask, ctx.flags);
                Ok(Flow::Next)
            }
            Instruction::SetCounter { op, value } => {
                ctx.apply_counter_operation(*op, *value);
                crate::debug_interp!("counter {:?} {} -> {}", op, value, ctx.counter);
                Ok(Flow::Next)
            }
            Instruction::SetCounterIf { compare, value } => {
                if ctx.counter == *compare {
                    ctx.counter = *value;
                }
                Ok(Flow::Next)
            }
            _ => Err(ExecFault::InvalidInstruction),
        }
    }
}

use super::action_ops::ActionOperations;
use super::control_flow_ops::ControlFlowOperations;
use super::processor::{Flow, InstructionProcessor};
use super::register_ops::RegisterOperations;
use crate::vm::error::ExecFault;
use crate::vm::instruction::Instruction;
use crate::vm::state::ExecutionContext;

/// A struct that holds all instruction processors
pub struct InstructionExecutor {
    actions: ActionOperations,
    registers: RegisterOperations,
    control_flow: ControlFlowOperations,
}

impl InstructionExecutor {
    /// Create a new executor with all processors registered
    pub fn new() -> Self {
        InstructionExecutor {
            actions: ActionOperations::new(),
            registers: RegisterOperations::new(),
            control_flow: ControlFlowOperations::new(),
        }
    }

    /// Picks the processor for a node. Every node kind must be routed here.
    fn processor_for(&self, instr: &Instruction) -> &dyn InstructionProcessor {
        match instr {
            Instruction::Action(_) => &self.actions,
            Instruction::FlagOperation { .. }
            | Instruction::SetCounter { .. }
            | Instruction::SetCounterIf { .. } => &self.registers,
            Instruction::NoOp
            | Instruction::Preemptive { .. }
            | Instruction::BranchFlag { .. }
            | Instruction::BranchHp { .. }
            | Instruction::BranchLevel { .. }
            | Instruction::BranchCounter { .. }
            | Instruction::BranchCard { .. }
            | Instruction::BranchCombo { .. }
            | Instruction::BranchRemainingEnemies { .. }
            | Instruction::Countdown
            | Instruction::EndPath => &self.control_flow,
        }
    }

    /// Execute a single node, delegating to the appropriate processor
    pub fn execute_instruction(
        &self,
        ctx: &mut ExecutionContext,
        instr: &Instruction,
    ) -> Result<Flow, ExecFault> {
        let processor = self.processor_for(instr);
        if !processor.can_process(instr) {
            return Err(ExecFault::InvalidInstruction);
        }
        processor.process(ctx, instr)
    }
}

impl Default for InstructionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

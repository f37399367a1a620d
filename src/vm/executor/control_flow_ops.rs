use super::processor::{Flow, InstructionProcessor};
use crate::vm::error::ExecFault;
use crate::vm::instruction::{Action, ActionKind, Instruction};
use crate::vm::state::ExecutionContext;

/// Processor for branches, markers and path terminators
pub struct ControlFlowOperations;

impl ControlFlowOperations {
    pub fn new() -> Self {
        ControlFlowOperations
    }

    fn branch(ctx: &ExecutionContext, name: &str, taken: bool, target: usize) -> Flow {
        crate::debug_interp!(
            "{}: turn {} hp {}. Jumping to {}? {}",
            name,
            ctx.turn,
            ctx.hp,
            target,
            taken
        );
        if taken { Flow::Jump(target) } else { Flow::Next }
    }
}

impl Default for ControlFlowOperations {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionProcessor for ControlFlowOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction,
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
                | Instruction::EndPath
        )
    }

    fn process(
        &self,
        ctx: &mut ExecutionContext,
        instruction: &Instruction,
    ) -> Result<Flow, ExecFault> {
        match instruction {
            Instruction::NoOp => Ok(Flow::Next),
            Instruction::Preemptive { level } => {
                ctx.is_preemptive = true;
                ctx.do_preemptive = *level <= ctx.level;
                crate::debug_interp!(
                    "Preemptive marker: level {} vs enemy level {} -> {}",
                    level,
                    ctx.level,
                    ctx.do_preemptive
                );
                Ok(Flow::Next)
            }
            Instruction::BranchFlag { mask, target } => Ok(Self::branch(
                ctx,
                "BranchFlag",
                ctx.has_flags(*mask),
                *target,
            )),
            Instruction::BranchHp {
                compare,
                value,
                target,
            } => Ok(Self::branch(
                ctx,
                "BranchHp",
                compare.test(ctx.hp, *value),
                *target,
            )),
            Instruction::BranchLevel {
                compare,
                value,
                target,
            } => Ok(Self::branch(
                ctx,
                "BranchLevel",
                compare.test(ctx.level, *value),
                *target,
            )),
            Instruction::BranchCounter {
                compare,
                value,
                target,
            } => Ok(Self::branch(
                ctx,
                "BranchCounter",
                compare.test(ctx.counter, *value),
                *target,
            )),
            Instruction::BranchCard { card_ids, target } => Ok(Self::branch(
                ctx,
                "BranchCard",
                ctx.has_any_card(card_ids),
                *target,
            )),
            // Combos are not simulated, so the combo gate is never met
            Instruction::BranchCombo { target, .. } => {
                Ok(Self::branch(ctx, "BranchCombo", false, *target))
            }
            Instruction::BranchRemainingEnemies { count, target } => Ok(Self::branch(
                ctx,
                "BranchRemainingEnemies",
                ctx.enemies <= *count,
                *target,
            )),
            Instruction::Countdown => {
                ctx.countdown = true;
                if ctx.counter == 1 {
                    Ok(Flow::Next)
                } else {
                    let countdown = Action::new(
                        0,
                        ActionKind::Countdown {
                            remaining: ctx.counter,
                        },
                    );
                    Ok(Flow::EmitAndStop(countdown))
                }
            }
            Instruction::EndPath => Ok(Flow::Stop),
            _ => Err(ExecFault::InvalidInstruction),
        }
    }
}

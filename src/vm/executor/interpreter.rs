use super::instruction_executor::InstructionExecutor;
use super::processor::Flow;
use crate::config::MAX_INTERPRETER_STEPS;
use crate::vm::error::ExecFault;
use crate::vm::instruction::Action;
use crate::vm::program::Program;
use crate::vm::state::ExecutionContext;

/// Result of walking a program once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Walk {
    /// Actions that fired, in order.
    pub actions: Vec<Action>,
    /// Program nodes executed; the reserved entry slot is not counted.
    pub steps: usize,
    /// The walk was cut short by `MAX_INTERPRETER_STEPS`.
    pub hit_step_cap: bool,
    /// A node could not be executed.
    pub fault: Option<ExecFault>,
}

impl Walk {
    /// Ends a walk that ran off the program or looped back on itself.
    fn finish_path(&mut self) {
        if self.actions.is_empty() {
            self.actions.push(Action::default_attack());
        }
    }
}

/// Walks enemy behavior programs.
pub struct Interpreter {
    executor: InstructionExecutor,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            executor: InstructionExecutor::new(),
        }
    }

    /// Walks `program` from its entry, mutating `ctx`, until the enemy has used its turn.
    pub fn run(&self, program: &Program, ctx: &mut ExecutionContext) -> Walk {
        ctx.reset();
        let mut walk = Walk::default();
        let mut visited = vec![false; program.len() + 1];
        // Slot 0 is the reserved entry; it advances straight to index 1
        let mut ip = 0;

        loop {
            let Some(instr) = program.get(ip) else {
                crate::debug_interp!("ran off the end at index {}", ip);
                walk.finish_path();
                return walk;
            };
            if visited[ip] {
                crate::debug_interp!("index {} revisited, ending walk", ip);
                walk.finish_path();
                return walk;
            }
            visited[ip] = true;

            if ip != 0 {
                if walk.steps >= MAX_INTERPRETER_STEPS {
                    log::warn!(
                        "Interpreter stopped after {} steps at index {} (turn {}, hp {})",
                        walk.steps,
                        ip,
                        ctx.turn,
                        ctx.hp
                    );
                    walk.hit_step_cap = true;
                    return walk;
                }
                walk.steps += 1;
            }

            match self.executor.execute_instruction(ctx, instr) {
                Ok(Flow::Next) => ip += 1,
                Ok(Flow::Jump(target)) => ip = target,
                Ok(Flow::Emit(action)) => {
                    walk.actions.push(action);
                    ip += 1;
                }
                Ok(Flow::EmitAndStop(action)) => {
                    walk.actions.push(action);
                    return walk;
                }
                Ok(Flow::Stop) => return walk,
                Err(fault) => {
                    log::error!("Fault at index {}: {} ({:?})", ip, fault, instr);
                    walk.fault = Some(fault);
                    return walk;
                }
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks `program` once and returns the actions that fired.
pub fn run(program: &Program, ctx: &mut ExecutionContext) -> Vec<Action> {
    Interpreter::new().run(program, ctx).actions
}

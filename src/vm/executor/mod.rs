// Interpreter: walks a program under an execution context and collects the actions that fire

pub mod action_ops;
pub mod control_flow_ops;
pub mod instruction_executor;
pub mod interpreter;
pub mod processor;
pub mod register_ops;

pub use crate::vm::instruction::Instruction;
pub use action_ops::ActionOperations;
pub use control_flow_ops::ControlFlowOperations;
pub use instruction_executor::InstructionExecutor;
pub use interpreter::{Interpreter, Walk, run};
pub use processor::{Flow, InstructionProcessor};
pub use register_ops::RegisterOperations;

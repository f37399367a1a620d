// VM module entry point

pub mod condition;
pub mod decoder;
pub mod error;
pub mod executor;
pub mod instruction;
pub mod program;
pub mod state;

pub use program::Program;
pub use state::ExecutionContext;

// Error types: raw record decoding errors and program validation errors

use thiserror::Error;

/// Decode Errors
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum DecodeError {
    #[error("skill {skill_id} (type {skill_type}) is missing required field `{field}`")]
    MissingField {
        skill_id: u32,
        skill_type: u32,
        field: &'static str,
    },
    #[error("skill {skill_id} (type {skill_type}) has invalid value {value} for `{field}`")]
    InvalidValue {
        skill_id: u32,
        skill_type: u32,
        field: &'static str,
        value: i64,
    },
}

/// Program Errors
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProgramError {
    #[error("branch at index {index} targets {target}, outside 1..={len}")]
    BranchOutOfBounds {
        index: usize,
        target: usize,
        len: usize,
    },
}

/// Execution Faults
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ExecFault {
    #[error("Instruction routed to a processor that cannot handle it")]
    InvalidInstruction,
}

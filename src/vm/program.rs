// Program: validated, 1-indexed sequence of behavior nodes

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::error::ProgramError;
use super::instruction::Instruction;
use crate::config;

/// An enemy behavior program. Slot 0 is reserved so that jump targets are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Instruction>", into = "Vec<Instruction>")]
pub struct Program {
    slots: Vec<Instruction>,
}

impl Program {
    /// Builds a program, rejecting branches that jump outside `1..=len`.
    pub fn new(instructions: Vec<Instruction>) -> Result<Self, ProgramError> {
        let len = instructions.len();
        for (offset, instr) in instructions.iter().enumerate() {
            if let Some(target) = instr.branch_target() {
                if target == 0 || target > len {
                    return Err(ProgramError::BranchOutOfBounds {
                        index: offset + 1,
                        target,
                        len,
                    });
                }
            }
        }

        let mut slots = Vec::with_capacity(len + 1);
        slots.push(Instruction::NoOp);
        slots.extend(instructions);
        Ok(Program { slots })
    }

    /// Number of real instructions (the reserved slot is not counted).
    pub fn len(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node at `index`, including the reserved slot 0.
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.slots.get(index)
    }

    /// Iterates real instructions with their 1-based index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Instruction)> {
        self.slots.iter().enumerate().skip(1)
    }

    /// Replaces the node at `index` with a no-op, returning what was there.
    pub(crate) fn take(&mut self, index: usize) -> Option<Instruction> {
        if index == 0 {
            return None;
        }
        self.slots
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, Instruction::NoOp))
    }

    /// HP values worth sampling: 100, plus every HP decision boundary and its neighbours.
    pub fn hp_checkpoints(&self) -> BTreeSet<u32> {
        let mut checkpoints = BTreeSet::new();
        checkpoints.insert(config::FULL_HP);

        let mut add_boundary = |value: u32| {
            let value = value.min(config::FULL_HP);
            checkpoints.insert(value);
            checkpoints.insert(value.saturating_sub(1));
            checkpoints.insert((value + 1).min(config::FULL_HP));
        };

        for (_, instr) in self.iter() {
            match instr {
                Instruction::BranchHp { value, .. } => add_boundary(*value),
                Instruction::Action(action) => {
                    if let Some(threshold) = action.hp_threshold() {
                        add_boundary(threshold);
                    }
                }
                _ => {}
            }
        }
        checkpoints
    }

    /// Ally card ids the program branches on.
    pub fn card_checkpoints(&self) -> BTreeSet<u32> {
        self.iter()
            .filter_map(|(_, instr)| match instr {
                Instruction::BranchCard { card_ids, .. } => Some(card_ids.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Levels whose behavior may differ: always the default level, plus every level gate.
    pub fn levels(&self) -> BTreeSet<u32> {
        let mut levels = BTreeSet::new();
        levels.insert(config::DEFAULT_LEVEL);
        for (_, instr) in self.iter() {
            match instr {
                Instruction::BranchLevel { value, .. } => {
                    levels.insert(*value);
                }
                Instruction::Preemptive { level } => {
                    levels.insert(*level);
                }
                _ => {}
            }
        }
        levels
    }

    pub fn has_enemy_count_branch(&self) -> bool {
        self.iter()
            .any(|(_, instr)| matches!(instr, Instruction::BranchRemainingEnemies { .. }))
    }
}

impl TryFrom<Vec<Instruction>> for Program {
    type Error = ProgramError;

    fn try_from(instructions: Vec<Instruction>) -> Result<Self, Self::Error> {
        Program::new(instructions)
    }
}

impl From<Program> for Vec<Instruction> {
    fn from(mut program: Program) -> Self {
        program.slots.remove(0);
        program.slots
    }
}

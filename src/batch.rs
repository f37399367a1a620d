// Batch summarization: many enemies in parallel, failures isolated per unit

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{DEFAULT_LEVEL, DIAGNOSTIC_EXAMPLES};
use crate::debug_batch;
use crate::summary::{ProcessedSkillset, Summarizer, Summary, UnitDiagnostics};
use crate::vm::decoder::{RawSkill, decode_behavior};
use crate::vm::error::{DecodeError, ProgramError};
use crate::vm::program::Program;

/// One enemy's raw behavior, as exported by the ingestion layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyBehavior {
    pub enemy_id: u32,
    #[serde(default)]
    pub level: Option<u32>,
    pub skills: Vec<RawSkill>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Summarize every enemy at this level instead of its own.
    pub level_override: Option<u32>,
    /// Summarize every level the enemy's behavior branches on.
    pub all_levels: bool,
}

/// Reasons a single enemy could not be summarized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("invalid program: {0}")]
    Program(#[from] ProgramError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnemySummary {
    pub enemy_id: u32,
    #[serde(flatten)]
    pub skillset: ProcessedSkillset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub enemy_id: u32,
    pub error: UnitError,
}

/// Batch-wide data-quality counters, with a few example enemy ids for each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub unknown_instruction_units: usize,
    pub unknown_instruction_examples: Vec<u32>,
    pub step_cap_units: usize,
    pub step_cap_examples: Vec<u32>,
    pub fault_units: usize,
    pub fault_examples: Vec<u32>,
    pub card_branch_units: usize,
    pub card_branch_examples: Vec<u32>,
}

impl Diagnostics {
    fn note(count: &mut usize, examples: &mut Vec<u32>, enemy_id: u32) {
        *count += 1;
        if examples.len() < DIAGNOSTIC_EXAMPLES && !examples.contains(&enemy_id) {
            examples.push(enemy_id);
        }
    }

    pub fn record(&mut self, enemy_id: u32, unit: &UnitDiagnostics) {
        if !unit.unknown_types.is_empty() {
            Self::note(
                &mut self.unknown_instruction_units,
                &mut self.unknown_instruction_examples,
                enemy_id,
            );
        }
        if unit.step_cap_hits > 0 {
            Self::note(&mut self.step_cap_units, &mut self.step_cap_examples, enemy_id);
        }
        if unit.faults > 0 {
            Self::note(&mut self.fault_units, &mut self.fault_examples, enemy_id);
        }
        if !unit.unsimulated_cards.is_empty() {
            Self::note(
                &mut self.card_branch_units,
                &mut self.card_branch_examples,
                enemy_id,
            );
        }
    }

    pub fn is_clean(&self) -> bool {
        self.unknown_instruction_units == 0
            && self.step_cap_units == 0
            && self.fault_units == 0
            && self.card_branch_units == 0
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub summaries: Vec<EnemySummary>,
    pub failures: Vec<UnitFailure>,
    pub diagnostics: Diagnostics,
}

impl BatchReport {
    /// Logs one line for the batch and one per non-empty diagnostic kind.
    pub fn log_summary(&self) {
        log::info!(
            "Summarized {} skillsets, {} enemies failed",
            self.summaries.len(),
            self.failures.len()
        );
        for failure in self.failures.iter().take(DIAGNOSTIC_EXAMPLES) {
            log::error!("Enemy {} failed: {}", failure.enemy_id, failure.error);
        }

        let d = &self.diagnostics;
        if d.unknown_instruction_units > 0 {
            log::warn!(
                "{} units contain unknown skill types, e.g. enemies {:?}",
                d.unknown_instruction_units,
                d.unknown_instruction_examples
            );
        }
        if d.step_cap_units > 0 {
            log::warn!(
                "{} units hit the interpreter step cap, e.g. enemies {:?}",
                d.step_cap_units,
                d.step_cap_examples
            );
        }
        if d.fault_units > 0 {
            log::warn!(
                "{} units hit execution faults, e.g. enemies {:?}",
                d.fault_units,
                d.fault_examples
            );
        }
        if d.card_branch_units > 0 {
            log::warn!(
                "{} units branch on ally cards that are never simulated, e.g. enemies {:?}",
                d.card_branch_units,
                d.card_branch_examples
            );
        }
    }
}

/// Decodes and summarizes one enemy at every level `options` asks for.
pub fn summarize_enemy(
    enemy: &EnemyBehavior,
    options: &BatchOptions,
) -> Result<Vec<Summary>, UnitError> {
    let program = Program::new(decode_behavior(&enemy.skills)?)?;
    let summarizer = Summarizer::for_enemy(enemy.enemy_id);

    if options.all_levels {
        return Ok(summarizer.summarize_levels(&program));
    }
    let level = options
        .level_override
        .or(enemy.level)
        .unwrap_or(DEFAULT_LEVEL);
    Ok(vec![summarizer.summarize(&program, level)])
}

/// Summarizes every enemy independently in parallel. A failing enemy is recorded and
/// skipped; results keep the input order.
pub fn summarize_batch(enemies: &[EnemyBehavior], options: &BatchOptions) -> BatchReport {
    debug_batch!("Summarizing {} enemies", enemies.len());

    let results: Vec<(u32, Result<Vec<Summary>, UnitError>)> = enemies
        .par_iter()
        .map(|enemy| (enemy.enemy_id, summarize_enemy(enemy, options)))
        .collect();

    let mut report = BatchReport::default();
    for (enemy_id, result) in results {
        match result {
            Ok(summaries) => {
                for summary in summaries {
                    report.diagnostics.record(enemy_id, &summary.diagnostics);
                    report.summaries.push(EnemySummary {
                        enemy_id,
                        skillset: summary.skillset,
                    });
                }
            }
            Err(error) => {
                debug_batch!("Enemy {} skipped: {}", enemy_id, error);
                report.failures.push(UnitFailure { enemy_id, error });
            }
        }
    }
    report
}

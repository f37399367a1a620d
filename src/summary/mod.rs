// Summary module entry point: turns behavior programs into ProcessedSkillsets

pub mod cleanup;
pub mod skillset;
pub mod summarizer;

pub use cleanup::clean_skillset;
pub use skillset::{EnemyCountSkillGroup, HpSkillGroup, ProcessedSkillset, TimedSkillGroup};
pub use summarizer::{Summarizer, Summary, UnitDiagnostics, summarize};

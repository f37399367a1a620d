// Output model: the flattened, deduplicated description of how an enemy behaves

use serde::{Deserialize, Serialize};

use crate::vm::instruction::{Action, ActionKind};

/// Actions used on a specific turn before the enemy settles into its cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedSkillGroup {
    pub turn: u32,
    /// HP checkpoint the actions were observed at, always present even at 100.
    pub hp: u32,
    pub actions: Vec<Action>,
}

/// Actions triggered by the number of enemies left on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyCountSkillGroup {
    pub count: u32,
    pub actions: Vec<Action>,
    /// What the enemy does on the following turn, when it differs.
    pub follow_up_actions: Option<Vec<Action>>,
}

/// Actions available at or below an HP ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpSkillGroup {
    pub hp_ceiling: u32,
    pub actions: Vec<Action>,
}

/// Everything the summarizer learned about one enemy at one level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessedSkillset {
    pub level: u32,
    /// Passive traits such as resists and resolve.
    pub base_abilities: Vec<Action>,
    pub preemptives: Vec<Action>,
    pub timed_skill_groups: Vec<TimedSkillGroup>,
    /// Turns of a multi-turn steady-state cycle.
    pub repeating_skill_groups: Vec<TimedSkillGroup>,
    pub enemycount_skill_groups: Vec<EnemyCountSkillGroup>,
    pub hp_skill_groups: Vec<HpSkillGroup>,
}

impl ProcessedSkillset {
    pub fn new(level: u32) -> Self {
        ProcessedSkillset {
            level,
            ..Default::default()
        }
    }

    /// True when no group holds anything beyond the plain default attack.
    pub fn is_functionally_empty(&self) -> bool {
        fn has_action(actions: &[Action]) -> bool {
            actions
                .iter()
                .any(|a| !matches!(a.kind, ActionKind::DefaultAttack))
        }

        !(self.timed_skill_groups.iter().any(|g| has_action(&g.actions))
            || self
                .repeating_skill_groups
                .iter()
                .any(|g| has_action(&g.actions))
            || self.enemycount_skill_groups.iter().any(|g| {
                has_action(&g.actions)
                    || g.follow_up_actions.as_deref().is_some_and(has_action)
            })
            || self.hp_skill_groups.iter().any(|g| has_action(&g.actions)))
    }

    pub fn group_count(&self) -> usize {
        self.timed_skill_groups.len()
            + self.repeating_skill_groups.len()
            + self.enemycount_skill_groups.len()
            + self.hp_skill_groups.len()
    }
}

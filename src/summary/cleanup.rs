// Cleanup pass: files every HP-gated action under its own threshold and drops noise

use super::skillset::{HpSkillGroup, ProcessedSkillset};
use crate::vm::instruction::Action;

/// Moves actions gated on an HP threshold other than `key` out of `actions`.
fn extract_misplaced(actions: &mut Vec<Action>, key: u32, extracted: &mut Vec<Action>) {
    actions.retain(|action| match action.hp_threshold() {
        Some(threshold) if threshold != key => {
            if !extracted.contains(action) {
                extracted.push(action.clone());
            }
            false
        }
        _ => true,
    });
}

/// Actions that make up an enemy's standing moveset: no HP gate and no one-time use.
fn moveset(group: &HpSkillGroup) -> Vec<Action> {
    group
        .actions
        .iter()
        .filter(|a| {
            a.condition
                .as_ref()
                .is_none_or(|c| c.hp_threshold.is_none() && c.one_time.is_none())
        })
        .cloned()
        .collect()
}

/// Normalizes a freshly summarized skillset.
///
/// Skillsets holding nothing but default attacks lose their groups. Otherwise HP-gated
/// actions are relocated into the HP group for their own threshold, a standing moveset
/// repeated by lower HP groups is reported only once, empty groups are dropped and HP
/// groups are ordered by descending ceiling.
pub fn clean_skillset(mut skillset: ProcessedSkillset) -> ProcessedSkillset {
    if skillset.is_functionally_empty() {
        skillset.timed_skill_groups.clear();
        skillset.repeating_skill_groups.clear();
        skillset.enemycount_skill_groups.clear();
        skillset.hp_skill_groups.clear();
        return skillset;
    }

    let mut extracted = Vec::new();
    for group in skillset
        .timed_skill_groups
        .iter_mut()
        .chain(skillset.repeating_skill_groups.iter_mut())
    {
        extract_misplaced(&mut group.actions, group.hp, &mut extracted);
    }
    for group in skillset.hp_skill_groups.iter_mut() {
        extract_misplaced(&mut group.actions, group.hp_ceiling, &mut extracted);
    }

    for action in extracted {
        let Some(threshold) = action.hp_threshold() else {
            continue;
        };
        match skillset
            .hp_skill_groups
            .iter_mut()
            .find(|g| g.hp_ceiling == threshold)
        {
            Some(group) => {
                if !group.actions.contains(&action) {
                    group.actions.push(action);
                }
            }
            None => skillset.hp_skill_groups.push(HpSkillGroup {
                hp_ceiling: threshold,
                actions: vec![action],
            }),
        }
    }

    // Stable sort keeps discovery order among equal ceilings
    skillset
        .hp_skill_groups
        .sort_by(|a, b| b.hp_ceiling.cmp(&a.hp_ceiling));

    if let Some((first, rest)) = skillset.hp_skill_groups.split_first_mut() {
        let mut current = moveset(first);
        for group in rest {
            let candidate = moveset(group);
            if candidate == current {
                group.actions.retain(|a| !current.contains(a));
            } else if !candidate.is_empty() {
                current = candidate;
            }
        }
    }

    skillset.timed_skill_groups.retain(|g| !g.actions.is_empty());
    skillset.repeating_skill_groups.retain(|g| !g.actions.is_empty());
    skillset
        .enemycount_skill_groups
        .retain(|g| !g.actions.is_empty() || g.follow_up_actions.is_some());
    skillset.hp_skill_groups.retain(|g| !g.actions.is_empty());
    skillset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::skillset::TimedSkillGroup;
    use crate::vm::instruction::{ActionKind, Condition};

    fn plain(skill_id: u32) -> Action {
        Action::new(skill_id, ActionKind::Gravity { percent: 20 })
    }

    fn gated(skill_id: u32, threshold: u32) -> Action {
        Action::new(skill_id, ActionKind::Dispel)
            .with_condition(Condition::new(100, 0).with_hp_threshold(threshold))
    }

    #[test]
    fn test_default_only_skillset_is_emptied() {
        let mut skillset = ProcessedSkillset::new(1);
        skillset.base_abilities.push(Action::new(
            50,
            ActionKind::Resolve { hp_threshold: 50 },
        ));
        skillset.hp_skill_groups.push(HpSkillGroup {
            hp_ceiling: 100,
            actions: vec![Action::default_attack()],
        });
        let cleaned = clean_skillset(skillset);
        assert_eq!(cleaned.group_count(), 0);
        assert_eq!(cleaned.base_abilities.len(), 1);
    }

    #[test]
    fn test_gated_action_moves_out_of_timed_group() {
        let mut skillset = ProcessedSkillset::new(1);
        skillset.timed_skill_groups.push(TimedSkillGroup {
            turn: 3,
            hp: 29,
            actions: vec![gated(7, 30), plain(1)],
        });
        skillset.hp_skill_groups.push(HpSkillGroup {
            hp_ceiling: 100,
            actions: vec![plain(2)],
        });

        let cleaned = clean_skillset(skillset);
        assert_eq!(cleaned.timed_skill_groups[0].actions, vec![plain(1)]);
        assert_eq!(
            cleaned.hp_skill_groups,
            vec![
                HpSkillGroup {
                    hp_ceiling: 100,
                    actions: vec![plain(2)],
                },
                HpSkillGroup {
                    hp_ceiling: 30,
                    actions: vec![gated(7, 30)],
                },
            ]
        );
    }

    #[test]
    fn test_relocation_merges_without_duplicates() {
        let mut skillset = ProcessedSkillset::new(1);
        skillset.hp_skill_groups.push(HpSkillGroup {
            hp_ceiling: 30,
            actions: vec![gated(7, 30)],
        });
        skillset.hp_skill_groups.push(HpSkillGroup {
            hp_ceiling: 29,
            actions: vec![gated(7, 30), plain(3)],
        });
        skillset.repeating_skill_groups.push(TimedSkillGroup {
            turn: 2,
            hp: 29,
            actions: vec![gated(7, 30)],
        });

        let cleaned = clean_skillset(skillset);
        assert!(cleaned.repeating_skill_groups.is_empty());
        assert_eq!(cleaned.hp_skill_groups[0].hp_ceiling, 30);
        assert_eq!(cleaned.hp_skill_groups[0].actions, vec![gated(7, 30)]);
        assert_eq!(cleaned.hp_skill_groups[1].actions, vec![plain(3)]);
    }

    #[test]
    fn test_repeated_moveset_reported_once() {
        let mut skillset = ProcessedSkillset::new(1);
        skillset.hp_skill_groups.push(HpSkillGroup {
            hp_ceiling: 100,
            actions: vec![plain(1)],
        });
        skillset.hp_skill_groups.push(HpSkillGroup {
            hp_ceiling: 49,
            actions: vec![plain(1)],
        });
        skillset.hp_skill_groups.push(HpSkillGroup {
            hp_ceiling: 19,
            actions: vec![plain(2)],
        });

        let cleaned = clean_skillset(skillset);
        let ceilings: Vec<u32> = cleaned.hp_skill_groups.iter().map(|g| g.hp_ceiling).collect();
        assert_eq!(ceilings, vec![100, 19]);
    }

    #[test]
    fn test_hp_groups_sorted_descending() {
        let mut skillset = ProcessedSkillset::new(1);
        for (ceiling, id) in [(10, 1), (100, 2), (50, 3)] {
            skillset.hp_skill_groups.push(HpSkillGroup {
                hp_ceiling: ceiling,
                actions: vec![plain(id)],
            });
        }
        let cleaned = clean_skillset(skillset);
        let ceilings: Vec<u32> = cleaned.hp_skill_groups.iter().map(|g| g.hp_ceiling).collect();
        assert_eq!(ceilings, vec![100, 50, 10]);
    }
}

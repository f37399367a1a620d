// Behavior summarizer: walks a program under many simulated battle states and
// folds what it sees into a ProcessedSkillset

use std::collections::{BTreeMap, BTreeSet};

use super::cleanup::clean_skillset;
use super::skillset::{EnemyCountSkillGroup, HpSkillGroup, ProcessedSkillset, TimedSkillGroup};
use crate::config::{ENEMY_COUNT_START, MAX_HP_WALKS, SWEEP_TURNS};
use crate::debug_summary;
use crate::vm::executor::Interpreter;
use crate::vm::instruction::{Action, Instruction};
use crate::vm::program::Program;
use crate::vm::state::ExecutionContext;

/// Distinct behaviors seen during one turn, keyed by the highest HP checkpoint that produced them.
type TurnData = BTreeMap<u32, Vec<Action>>;

/// Data-quality findings for one summarized unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitDiagnostics {
    /// Skill types the decoder could not classify.
    pub unknown_types: BTreeSet<u32>,
    /// Walks cut short by the interpreter step cap.
    pub step_cap_hits: usize,
    /// Walks that stopped on a node the executor could not handle.
    pub faults: usize,
    /// Ally card ids the program branches on that no simulated team contains.
    pub unsimulated_cards: BTreeSet<u32>,
}

impl UnitDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.unknown_types.is_empty()
            && self.step_cap_hits == 0
            && self.faults == 0
            && self.unsimulated_cards.is_empty()
    }
}

/// A summarized skillset together with what went wrong while producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub skillset: ProcessedSkillset,
    pub diagnostics: UnitDiagnostics,
}

pub struct Summarizer {
    interpreter: Interpreter,
    enemy_id: u32,
}

impl Summarizer {
    pub fn new() -> Self {
        Self::for_enemy(0)
    }

    /// Summarizer whose log lines are tagged with `enemy_id`.
    pub fn for_enemy(enemy_id: u32) -> Self {
        Summarizer {
            interpreter: Interpreter::new(),
            enemy_id,
        }
    }

    /// Summarizes `program` for an enemy at `level`. The program itself is left untouched.
    pub fn summarize(&self, program: &Program, level: u32) -> Summary {
        let mut simulation = Simulation {
            interpreter: &self.interpreter,
            enemy_id: self.enemy_id,
            program: program.clone(),
            diagnostics: UnitDiagnostics::default(),
        };
        let skillset = simulation.run(level);
        Summary {
            skillset,
            diagnostics: simulation.diagnostics,
        }
    }

    /// Summarizes `program` once for every level its behavior may depend on.
    pub fn summarize_levels(&self, program: &Program) -> Vec<Summary> {
        program
            .levels()
            .into_iter()
            .map(|level| self.summarize(program, level))
            .collect()
    }
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Summarizes `program` at `level`, discarding diagnostics.
pub fn summarize(program: &Program, level: u32) -> ProcessedSkillset {
    Summarizer::new().summarize(program, level).skillset
}

/// State for summarizing one (program, level) unit. Owns a working copy of the program
/// because passives and preemptive markers are cleared out of it.
struct Simulation<'a> {
    interpreter: &'a Interpreter,
    enemy_id: u32,
    program: Program,
    diagnostics: UnitDiagnostics,
}

impl Simulation<'_> {
    fn run(&mut self, level: u32) -> ProcessedSkillset {
        let mut skillset = ProcessedSkillset::new(level);

        self.record_unknown_types();
        skillset.base_abilities = self.harvest_passives();

        let checkpoints: Vec<u32> = self.program.hp_checkpoints().into_iter().rev().collect();
        debug_summary!(
            self.enemy_id,
            "level {}: hp checkpoints {:?}",
            level,
            checkpoints
        );

        let fresh = ExecutionContext::new(level);
        self.record_card_coverage(&fresh);
        let (ctx, preemptives) = self.extract_preemptives(fresh);
        skillset.preemptives = preemptives;
        self.clear_preemptive_markers();

        let (turns, ctx) = self.sweep_turns(ctx, &checkpoints);
        let looped = match find_cycle(&turns) {
            Some((start, end)) => {
                debug_summary!(
                    self.enemy_id,
                    "turns {}..{} repeat",
                    start + 1,
                    end + 1
                );
                emit_cycle(&turns, start, end, &mut skillset)
            }
            None => {
                debug_summary!(
                    self.enemy_id,
                    "no repeating cycle within {} turns",
                    SWEEP_TURNS
                );
                Vec::new()
            }
        };

        if self.program.has_enemy_count_branch() {
            self.sweep_enemy_counts(&ctx, &mut skillset);
        }
        self.sweep_hp(&ctx, &checkpoints, &looped, &mut skillset);

        clean_skillset(skillset)
    }

    fn walk(&mut self, ctx: &mut ExecutionContext) -> Vec<Action> {
        let walk = self.interpreter.run(&self.program, ctx);
        if walk.hit_step_cap {
            self.diagnostics.step_cap_hits += 1;
        }
        if walk.fault.is_some() {
            self.diagnostics.faults += 1;
        }
        walk.actions
    }

    fn record_unknown_types(&mut self) {
        for (_, instr) in self.program.iter() {
            if let Some(action) = instr.as_action() {
                self.diagnostics.unknown_types.extend(action.unknown_types());
            }
        }
        if !self.diagnostics.unknown_types.is_empty() {
            log::info!(
                "Enemy {} uses unknown skill types {:?}",
                self.enemy_id,
                self.diagnostics.unknown_types
            );
        }
    }

    /// Card branches can only be taken for cards on the simulated team; any others stay
    /// unexplored.
    fn record_card_coverage(&mut self, ctx: &ExecutionContext) {
        self.diagnostics.unsimulated_cards = self
            .program
            .card_checkpoints()
            .difference(&ctx.cards)
            .copied()
            .collect();
        if !self.diagnostics.unsimulated_cards.is_empty() {
            log::info!(
                "Enemy {} branches on ally cards {:?} that are never simulated",
                self.enemy_id,
                self.diagnostics.unsimulated_cards
            );
        }
    }

    /// Pulls passive traits out of the program; they are not part of the turn logic.
    fn harvest_passives(&mut self) -> Vec<Action> {
        let indices: Vec<usize> = self
            .program
            .iter()
            .filter(|(_, instr)| instr.as_action().is_some_and(Action::is_passive))
            .map(|(index, _)| index)
            .collect();

        indices
            .into_iter()
            .filter_map(|index| match self.program.take(index) {
                Some(Instruction::Action(action)) => Some(action),
                _ => None,
            })
            .collect()
    }

    fn clear_preemptive_markers(&mut self) {
        let indices: Vec<usize> = self
            .program
            .iter()
            .filter(|(_, instr)| matches!(instr, Instruction::Preemptive { .. }))
            .map(|(index, _)| index)
            .collect();
        for index in indices {
            self.program.take(index);
        }
    }

    /// Runs the opening walk. A satisfied preemptive marker keeps its actions and
    /// carries the resulting state forward; otherwise the walk is discarded.
    fn extract_preemptives(
        &mut self,
        fresh: ExecutionContext,
    ) -> (ExecutionContext, Vec<Action>) {
        let mut ctx = fresh.clone();
        let actions = self.walk(&mut ctx);
        if ctx.is_preemptive && ctx.do_preemptive {
            debug_summary!(self.enemy_id, "preemptive: {:?}", actions);
            ctx.reset();
            (ctx, actions)
        } else {
            if ctx.is_preemptive {
                debug_summary!(
                    self.enemy_id,
                    "preemptive marker not reached at level {}",
                    ctx.level
                );
            }
            (fresh, Vec::new())
        }
    }

    /// Simulates `SWEEP_TURNS` turns, sampling every HP checkpoint each turn. The state
    /// left by the full HP walk carries over into the next turn.
    fn sweep_turns(
        &mut self,
        mut ctx: ExecutionContext,
        checkpoints: &[u32],
    ) -> (Vec<TurnData>, ExecutionContext) {
        let mut turns = Vec::with_capacity(SWEEP_TURNS);
        for _ in 0..SWEEP_TURNS {
            let mut turn = TurnData::new();
            let mut seen: Vec<Vec<Action>> = Vec::new();
            let mut next = None;

            for &hp in checkpoints {
                let mut hp_ctx = ctx.clone();
                hp_ctx.hp = hp;
                let actions = self.walk(&mut hp_ctx);
                if !seen.contains(&actions) {
                    seen.push(actions.clone());
                    turn.insert(hp, actions);
                }
                if next.is_none() {
                    next = Some(hp_ctx);
                }
            }

            debug_summary!(self.enemy_id, "Turn {}: {:?}", ctx.turn, turn);
            turns.push(turn);
            if let Some(next) = next {
                ctx = next;
            }
            ctx.turn_event();
        }
        (turns, ctx)
    }

    /// Walks enemy counts from `ENEMY_COUNT_START` down to 1, each on its own copy of `ctx`.
    fn sweep_enemy_counts(&mut self, ctx: &ExecutionContext, skillset: &mut ProcessedSkillset) {
        let mut seen = vec![self.walk(&mut ctx.clone())];

        for count in (1..=ENEMY_COUNT_START).rev() {
            let mut count_ctx = ctx.clone();
            count_ctx.enemies = count;
            let actions = self.walk(&mut count_ctx);
            if seen.contains(&actions) {
                continue;
            }
            seen.push(actions.clone());

            // One-time actions give way to something else on the next turn
            let follow_up = self.walk(&mut count_ctx);
            let follow_up_actions = if follow_up == actions {
                None
            } else {
                seen.push(follow_up.clone());
                Some(follow_up)
            };

            debug_summary!(self.enemy_id, "{} enemies left: {:?}", count, actions);
            skillset.enemycount_skill_groups.push(EnemyCountSkillGroup {
                count,
                actions,
                follow_up_actions,
            });
        }
    }

    /// Walks repeatedly at each HP checkpoint, from full HP down, on one shared state until
    /// nothing new turns up. Behaviors already reported by the turn sweep are not repeated.
    fn sweep_hp(
        &mut self,
        ctx: &ExecutionContext,
        checkpoints: &[u32],
        looped: &[(u32, Vec<Action>)],
        skillset: &mut ProcessedSkillset,
    ) {
        let mut seen: Vec<Vec<Action>> = Vec::new();
        let mut hp_ctx = ctx.clone();

        for &hp in checkpoints {
            hp_ctx.hp = hp;
            let mut actions = self.walk(&mut hp_ctx);
            let mut walks = 1;

            while !seen.contains(&actions) {
                if !looped.iter().any(|(h, a)| *h == hp && *a == actions) {
                    skillset.hp_skill_groups.push(HpSkillGroup {
                        hp_ceiling: hp,
                        actions: actions.clone(),
                    });
                }
                seen.push(actions);

                if walks >= MAX_HP_WALKS {
                    log::warn!(
                        "Enemy {} still changing behavior at hp {} after {} walks",
                        self.enemy_id,
                        hp,
                        walks
                    );
                    break;
                }
                actions = self.walk(&mut hp_ctx);
                walks += 1;
            }
        }
    }
}

/// Finds the first turn range `start..end` that repeats back to back through the rest of
/// the sweep. At least one full repetition must fit after `end`.
fn find_cycle(turns: &[TurnData]) -> Option<(usize, usize)> {
    (0..turns.len())
        .flat_map(|start| (start + 1..turns.len()).map(move |end| (start, end)))
        .find(|&(start, end)| turns[start] == turns[end] && cycle_repeats(turns, start, end))
}

fn cycle_repeats(turns: &[TurnData], start: usize, end: usize) -> bool {
    let pattern = &turns[start..end];
    let size = pattern.len();
    let mut verified = false;
    let mut offset = end;
    while offset + size <= turns.len() {
        if turns[offset..offset + size] != *pattern {
            return false;
        }
        verified = true;
        offset += size;
    }
    verified
}

/// Emits timed groups for the intro turns of a single-turn cycle, or repeating groups for
/// each turn of a longer cycle. Returns every (hp, actions) pair emitted.
fn emit_cycle(
    turns: &[TurnData],
    start: usize,
    end: usize,
    skillset: &mut ProcessedSkillset,
) -> Vec<(u32, Vec<Action>)> {
    let mut emitted = Vec::new();

    if end - start == 1 {
        let steady = &turns[start];
        for (index, turn) in turns[..start].iter().enumerate() {
            for (&hp, actions) in turn.iter().rev() {
                if steady.get(&hp) == Some(actions) {
                    continue;
                }
                skillset.timed_skill_groups.push(TimedSkillGroup {
                    turn: index as u32 + 1,
                    hp,
                    actions: actions.clone(),
                });
                emitted.push((hp, actions.clone()));
            }
        }
        return emitted;
    }

    // Behavior present on every turn of the cycle is left for the HP sweep
    let cycle = &turns[start..end];
    let common: Vec<(u32, &Vec<Action>)> = cycle[0]
        .iter()
        .filter(|&(hp, actions)| cycle[1..].iter().all(|t| t.get(hp) == Some(actions)))
        .map(|(&hp, actions)| (hp, actions))
        .collect();

    for (offset, turn) in cycle.iter().enumerate() {
        for (&hp, actions) in turn.iter().rev() {
            if common.contains(&(hp, actions)) {
                continue;
            }
            skillset.repeating_skill_groups.push(TimedSkillGroup {
                turn: (start + offset) as u32 + 1,
                hp,
                actions: actions.clone(),
            });
            emitted.push((hp, actions.clone()));
        }
    }
    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_INTERPRETER_STEPS;
    use crate::vm::instruction::{ActionKind, Compare, Condition, CounterOp, FlagOp};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn act(skill_id: u32) -> Action {
        Action::new(
            skill_id,
            ActionKind::Attack {
                multiplier: 100,
                min_hits: 1,
                max_hits: 1,
            },
        )
    }

    fn program(instructions: Vec<Instruction>) -> Program {
        Program::new(instructions).unwrap()
    }

    fn all_actions(skillset: &ProcessedSkillset) -> Vec<&Action> {
        skillset
            .timed_skill_groups
            .iter()
            .chain(skillset.repeating_skill_groups.iter())
            .flat_map(|g| g.actions.iter())
            .chain(skillset.hp_skill_groups.iter().flat_map(|g| g.actions.iter()))
            .collect()
    }

    /// Opens with A on turn 1, then uses B forever.
    fn opener_program() -> Program {
        program(vec![
            Instruction::BranchFlag { mask: 1, target: 4 },
            Instruction::FlagOperation {
                op: FlagOp::Set,
                mask: 1,
            },
            Instruction::Action(act(1)),
            Instruction::Action(act(2)),
        ])
    }

    #[test]
    fn test_summary_is_deterministic() {
        let gated = act(9).with_condition(Condition::new(100, 0).with_hp_threshold(50));
        let p = program(vec![
            Instruction::Preemptive { level: 1 },
            Instruction::BranchFlag { mask: 1, target: 5 },
            Instruction::FlagOperation {
                op: FlagOp::Set,
                mask: 1,
            },
            Instruction::Action(act(1)),
            Instruction::Action(gated),
            Instruction::BranchRemainingEnemies { count: 1, target: 8 },
            Instruction::Action(act(2)),
            Instruction::Action(act(3)),
        ]);
        let first = serde_json::to_string(&summarize(&p, 1)).unwrap();
        let second = serde_json::to_string(&summarize(&p, 1)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_preemptive_gated_by_level() {
        let p = program(vec![
            Instruction::Preemptive { level: 1 },
            Instruction::Action(act(7)),
        ]);

        let at_level = summarize(&p, 1);
        assert_eq!(at_level.preemptives, vec![act(7)]);

        let below = summarize(&p, 0);
        assert!(below.preemptives.is_empty());
        assert_eq!(below.hp_skill_groups[0].actions, vec![act(7)]);
    }

    #[test]
    fn test_opening_turn_becomes_timed_group() {
        let skillset = summarize(&opener_program(), 1);
        assert_eq!(
            skillset.timed_skill_groups,
            vec![TimedSkillGroup {
                turn: 1,
                hp: 100,
                actions: vec![act(1)],
            }]
        );
        assert!(skillset.repeating_skill_groups.is_empty());
        assert_eq!(
            skillset.hp_skill_groups,
            vec![HpSkillGroup {
                hp_ceiling: 100,
                actions: vec![act(2)],
            }]
        );
    }

    #[test]
    fn test_one_time_opener_reported_once() {
        let once = act(5).with_condition(Condition::new(100, 0).with_one_time(1));
        let p = program(vec![Instruction::Action(once.clone()), Instruction::Action(act(1))]);
        let skillset = summarize(&p, 1);
        assert_eq!(skillset.timed_skill_groups.len(), 1);
        assert_eq!(skillset.timed_skill_groups[0].actions, vec![once]);
        assert_eq!(skillset.hp_skill_groups[0].actions, vec![act(1)]);
    }

    #[test]
    fn test_hp_gated_action_filed_under_threshold() {
        // Turn 3 only: a chance action below 30% HP, then B. Every other turn: A.
        let gated = act(9).with_condition(Condition::new(50, 0).with_hp_threshold(30));
        let p = program(vec![
            Instruction::SetCounter {
                op: CounterOp::Add,
                value: 1,
            },
            Instruction::BranchCounter {
                compare: Compare::Equal,
                value: 3,
                target: 4,
            },
            Instruction::Action(act(1)),
            Instruction::Action(gated.clone()),
            Instruction::Action(act(2)),
        ]);
        let skillset = summarize(&p, 1);

        assert!(skillset.timed_skill_groups.iter().all(|g| g.turn == 3));
        assert!(
            skillset
                .timed_skill_groups
                .iter()
                .all(|g| !g.actions.contains(&gated))
        );
        assert!(
            skillset
                .timed_skill_groups
                .iter()
                .any(|g| g.hp == 100 && g.actions == vec![act(2)])
        );
        let thirty: Vec<&HpSkillGroup> = skillset
            .hp_skill_groups
            .iter()
            .filter(|g| g.hp_ceiling == 30)
            .collect();
        assert_eq!(thirty.len(), 1);
        assert_eq!(thirty[0].actions, vec![gated.clone()]);
        assert_eq!(all_actions(&skillset).iter().filter(|a| ***a == gated).count(), 1);
    }

    #[test]
    fn test_alternating_cycle_reported_as_repeating() {
        let p = program(vec![
            Instruction::BranchFlag { mask: 1, target: 4 },
            Instruction::FlagOperation {
                op: FlagOp::Set,
                mask: 1,
            },
            Instruction::Action(act(1)),
            Instruction::FlagOperation {
                op: FlagOp::Unset,
                mask: 1,
            },
            Instruction::Action(act(2)),
        ]);
        let skillset = summarize(&p, 1);
        assert!(skillset.timed_skill_groups.is_empty());
        let turns: Vec<(u32, Vec<Action>)> = skillset
            .repeating_skill_groups
            .iter()
            .map(|g| (g.turn, g.actions.clone()))
            .collect();
        assert_eq!(turns, vec![(1, vec![act(1)]), (2, vec![act(2)])]);
        assert!(skillset.hp_skill_groups.is_empty());
    }

    #[test]
    fn test_enemy_count_only_records_distinct_behavior() {
        let never = program(vec![
            Instruction::BranchRemainingEnemies { count: 0, target: 3 },
            Instruction::Action(act(1)),
            Instruction::Action(act(2)),
        ]);
        assert!(summarize(&never, 1).enemycount_skill_groups.is_empty());

        let last_one = program(vec![
            Instruction::BranchRemainingEnemies { count: 1, target: 3 },
            Instruction::Action(act(1)),
            Instruction::Action(act(2)),
        ]);
        assert_eq!(
            summarize(&last_one, 1).enemycount_skill_groups,
            vec![EnemyCountSkillGroup {
                count: 1,
                actions: vec![act(2)],
                follow_up_actions: None,
            }]
        );
    }

    #[test]
    fn test_enemy_count_follow_up() {
        let once = act(8).with_condition(Condition::new(100, 0).with_one_time(2));
        let p = program(vec![
            Instruction::BranchRemainingEnemies { count: 2, target: 3 },
            Instruction::Action(act(1)),
            Instruction::Action(once.clone()),
            Instruction::Action(act(2)),
        ]);
        let groups = summarize(&p, 1).enemycount_skill_groups;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].actions, vec![once]);
        assert_eq!(groups[0].follow_up_actions, Some(vec![act(2)]));
    }

    #[test]
    fn test_passives_become_base_abilities() {
        let resolve = Action::new(40, ActionKind::Resolve { hp_threshold: 50 });
        let p = program(vec![
            Instruction::Action(resolve.clone()),
            Instruction::Action(act(1)),
        ]);
        let skillset = summarize(&p, 1);
        assert_eq!(skillset.base_abilities, vec![resolve]);
        assert_eq!(skillset.hp_skill_groups[0].actions, vec![act(1)]);
    }

    #[test]
    fn test_unknown_types_reported() {
        let unknown = Action::new(77, ActionKind::Unknown { skill_type: 250 })
            .with_condition(Condition::new(50, 0));
        let p = program(vec![Instruction::Action(unknown.clone()), Instruction::Action(act(1))]);
        let summary = Summarizer::for_enemy(1234).summarize(&p, 1);
        assert_eq!(summary.diagnostics.unknown_types, BTreeSet::from([250]));
        assert_eq!(summary.skillset.hp_skill_groups[0].actions, vec![unknown, act(1)]);
    }

    #[test]
    fn test_step_cap_reported_not_fatal() {
        let p = program(vec![Instruction::NoOp; MAX_INTERPRETER_STEPS + 10]);
        let summary = Summarizer::new().summarize(&p, 1);
        assert!(summary.diagnostics.step_cap_hits > 0);
        assert!(!summary.diagnostics.is_clean());
        assert_eq!(summary.skillset.group_count(), 0);
    }

    #[test]
    fn test_enemy_count_sweep_skipped_without_branch() {
        // One turn walk, ten sweep turns and two HP walks; the seven enemy-count walks
        // only run when the program branches on remaining enemies
        let capped = program(vec![Instruction::NoOp; MAX_INTERPRETER_STEPS + 10]);
        let summary = Summarizer::new().summarize(&capped, 1);
        assert_eq!(summary.diagnostics.step_cap_hits, 13);

        let mut instructions = vec![Instruction::BranchRemainingEnemies { count: 0, target: 1 }];
        instructions.extend(vec![Instruction::NoOp; MAX_INTERPRETER_STEPS + 10]);
        let summary = Summarizer::new().summarize(&program(instructions), 1);
        assert_eq!(summary.diagnostics.step_cap_hits, 20);
        assert!(summary.skillset.enemycount_skill_groups.is_empty());
    }

    #[test]
    fn test_card_branches_reported_as_unsimulated() {
        let p = program(vec![
            Instruction::BranchCard {
                card_ids: vec![1234, 5678],
                target: 3,
            },
            Instruction::Action(act(1)),
            Instruction::Action(act(2)),
        ]);
        let summary = Summarizer::for_enemy(42).summarize(&p, 1);
        assert_eq!(
            summary.diagnostics.unsimulated_cards,
            BTreeSet::from([1234, 5678])
        );
        assert!(!summary.diagnostics.is_clean());
        assert_eq!(summary.skillset.hp_skill_groups[0].actions, vec![act(1)]);

        let plain = Summarizer::new().summarize(&opener_program(), 1);
        assert!(plain.diagnostics.unsimulated_cards.is_empty());
        assert!(plain.diagnostics.is_clean());
    }

    #[test]
    fn test_summarize_levels() {
        let p = program(vec![
            Instruction::BranchLevel {
                compare: Compare::GreaterOrEqual,
                value: 5,
                target: 3,
            },
            Instruction::Action(act(1)),
            Instruction::Action(act(2)),
        ]);
        let summaries = Summarizer::new().summarize_levels(&p);
        let levels: Vec<u32> = summaries.iter().map(|s| s.skillset.level).collect();
        assert_eq!(levels, vec![1, 5]);
        assert_eq!(summaries[0].skillset.hp_skill_groups[0].actions, vec![act(1)]);
        assert_eq!(summaries[1].skillset.hp_skill_groups[0].actions, vec![act(2)]);
    }

    #[test]
    fn test_summarize_leaves_program_untouched() {
        let p = program(vec![
            Instruction::Preemptive { level: 1 },
            Instruction::Action(Action::new(3, ActionKind::Resolve { hp_threshold: 20 })),
            Instruction::Action(act(1)),
        ]);
        let before = p.clone();
        summarize(&p, 1);
        assert_eq!(p, before);
    }

    #[test]
    fn test_find_cycle_requires_repetition() {
        let a = TurnData::from([(100, vec![act(1)])]);
        let b = TurnData::from([(100, vec![act(2)])]);
        // A A B A A A: the first A A pair does not keep repeating
        let turns = vec![a.clone(), a.clone(), b, a.clone(), a.clone(), a];
        assert_eq!(find_cycle(&turns), Some((3, 4)));
        assert_eq!(find_cycle(&turns[..4]), None);
    }

    fn random_program(rng: &mut StdRng) -> Program {
        let len = rng.gen_range(1..25);
        let instructions = (0..len)
            .map(|_| match rng.gen_range(0..9) {
                0 => Instruction::BranchFlag {
                    mask: rng.gen_range(0..4),
                    target: rng.gen_range(1..=len),
                },
                1 => Instruction::FlagOperation {
                    op: FlagOp::Xor,
                    mask: rng.gen_range(1..4),
                },
                2 => Instruction::BranchHp {
                    compare: Compare::Less,
                    value: rng.gen_range(0..=100),
                    target: rng.gen_range(1..=len),
                },
                3 => Instruction::SetCounter {
                    op: CounterOp::Add,
                    value: 1,
                },
                4 => Instruction::BranchCounter {
                    compare: Compare::GreaterOrEqual,
                    value: rng.gen_range(0..5),
                    target: rng.gen_range(1..=len),
                },
                5 => Instruction::BranchRemainingEnemies {
                    count: rng.gen_range(1..4),
                    target: rng.gen_range(1..=len),
                },
                6 => {
                    let mut condition = Condition::new(rng.gen_range(1..=100), 0);
                    if rng.gen_bool(0.3) {
                        condition = condition.with_hp_threshold(rng.gen_range(1..=100));
                    }
                    if rng.gen_bool(0.2) {
                        condition = condition.with_one_time(1u64 << rng.gen_range(0..3u32));
                    }
                    Instruction::Action(act(rng.gen_range(1..50)).with_condition(condition))
                }
                7 => Instruction::Action(act(rng.gen_range(1..50))),
                _ => Instruction::EndPath,
            })
            .collect();
        program(instructions)
    }

    #[test]
    fn test_random_programs_summarize_consistently() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let p = random_program(&mut rng);
            let first = Summarizer::new().summarize(&p, 1);
            let second = Summarizer::new().summarize(&p, 1);
            assert_eq!(first, second);

            let skillset = &first.skillset;
            for group in &skillset.hp_skill_groups {
                assert!(!group.actions.is_empty());
                for action in &group.actions {
                    if let Some(threshold) = action.hp_threshold() {
                        assert_eq!(threshold, group.hp_ceiling);
                    }
                }
            }
            for group in skillset
                .timed_skill_groups
                .iter()
                .chain(skillset.repeating_skill_groups.iter())
            {
                assert!(group.actions.iter().all(|a| a.hp_threshold().is_none()));
            }
            let ceilings: Vec<u32> = skillset.hp_skill_groups.iter().map(|g| g.hp_ceiling).collect();
            assert!(ceilings.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}

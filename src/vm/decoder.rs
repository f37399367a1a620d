// Decoder: turns raw enemy skill records into typed behavior nodes

use serde::{Deserialize, Serialize};

use super::error::DecodeError;
use super::instruction::{
    AbsorbSource, Action, ActionKind, BindTarget, Compare, Condition, CounterOp, DebuffStat,
    FlagOp, Instruction, RecoverTarget, SealLayout, SpawnLayout,
};

/// Raw enemy skill record as exported by the game data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawSkill {
    pub enemy_skill_id: u32,
    pub skill_type: u32,
    #[serde(default)]
    pub ai: Option<i64>,
    #[serde(default)]
    pub rnd: Option<i64>,
    #[serde(default)]
    pub params: Vec<Option<i64>>,
    /// Skills referenced by skill-set types, already resolved by the exporter.
    #[serde(default)]
    pub sub_skills: Vec<RawSkill>,
}

// Param slots carrying the condition gates
const HP_THRESHOLD_PARAM: usize = 11;
const ONE_TIME_PARAM: usize = 13;

impl RawSkill {
    pub fn new(enemy_skill_id: u32, skill_type: u32) -> Self {
        RawSkill {
            enemy_skill_id,
            skill_type,
            ..Default::default()
        }
    }

    pub fn with_ai_rnd(mut self, ai: i64, rnd: i64) -> Self {
        self.ai = Some(ai);
        self.rnd = Some(rnd);
        self
    }

    /// Sets a single param slot, growing the param list as needed.
    pub fn with_param(mut self, index: usize, value: i64) -> Self {
        if self.params.len() <= index {
            self.params.resize(index + 1, None);
        }
        self.params[index] = Some(value);
        self
    }

    fn param_opt(&self, index: usize) -> Option<i64> {
        self.params.get(index).copied().flatten()
    }

    fn param(&self, index: usize) -> i64 {
        self.param_opt(index).unwrap_or(0)
    }

    /// Non-zero param values in `range`, in order.
    fn param_list(&self, range: std::ops::Range<usize>) -> Vec<i64> {
        range
            .filter_map(|i| self.param_opt(i))
            .filter(|v| *v != 0)
            .collect()
    }

    fn required(&self, field: &'static str, value: Option<i64>) -> Result<i64, DecodeError> {
        value.ok_or(DecodeError::MissingField {
            skill_id: self.enemy_skill_id,
            skill_type: self.skill_type,
            field,
        })
    }

    fn non_negative(&self, field: &'static str, value: i64) -> Result<u64, DecodeError> {
        u64::try_from(value).map_err(|_| DecodeError::InvalidValue {
            skill_id: self.enemy_skill_id,
            skill_type: self.skill_type,
            field,
            value,
        })
    }

    fn ai(&self) -> Result<i64, DecodeError> {
        self.required("ai", self.ai)
    }

    fn rnd(&self) -> Result<i64, DecodeError> {
        self.required("rnd", self.rnd)
    }

    fn mask(&self) -> Result<u64, DecodeError> {
        let ai = self.ai()?;
        self.non_negative("ai", ai)
    }

    fn target(&self) -> Result<usize, DecodeError> {
        let rnd = self.rnd()?;
        Ok(self.non_negative("rnd", rnd)? as usize)
    }

    fn condition(&self) -> Option<Condition> {
        let (ai, rnd) = (self.ai?, self.rnd?);
        Some(Condition {
            trigger_chance: ai.clamp(0, 100) as u32,
            random_chance: rnd.clamp(0, 100) as u32,
            hp_threshold: self
                .param_opt(HP_THRESHOLD_PARAM)
                .filter(|v| *v > 0)
                .map(|v| v.min(i64::from(u32::MAX)) as u32),
            one_time: self
                .param_opt(ONE_TIME_PARAM)
                .filter(|v| *v > 0)
                .map(|v| v as u64),
        })
    }
}

fn some_nonzero(value: i64) -> Option<i64> {
    (value != 0).then_some(value)
}

// Orb attribute ids used by the fixed-target orb changes
const JAMMER: i64 = 6;
const POISON: i64 = 7;
const MORTAL_POISON: i64 = 8;

/// Maps an action skill type to its typed kind; `None` when the type is not an action.
fn decode_action_kind(raw: &RawSkill) -> Result<Option<ActionKind>, DecodeError> {
    let p = |i: usize| raw.param(i);
    let kind = match raw.skill_type {
        // Attacks
        15 => ActionKind::Attack {
            multiplier: p(3),
            min_hits: p(1),
            max_hits: p(2),
        },
        82 => ActionKind::Attack {
            multiplier: 100,
            min_hits: 1,
            max_hits: 1,
        },
        47 => ActionKind::PreemptiveAttack { multiplier: p(2) },

        // Binds
        1 | 2 | 3 | 14 | 54 | 63 | 65 => {
            let target = match raw.skill_type {
                1 | 63 => BindTarget::RandomCards,
                2 => BindTarget::Attribute,
                3 => BindTarget::Typing,
                14 => BindTarget::ActiveSkills,
                54 => BindTarget::Leaders,
                _ => BindTarget::RandomSubs,
            };
            let (selector, min_turns, max_turns, attack_multiplier) = if raw.skill_type == 63 {
                (p(4), p(2), p(3), some_nonzero(p(1)))
            } else {
                (p(1), p(2), p(3), None)
            };
            ActionKind::Bind {
                target,
                selector,
                min_turns,
                max_turns,
                attack_multiplier,
            }
        }
        88 => ActionKind::BindAwoken { turns: p(1) },

        // Orb changes
        4 => ActionKind::OrbChange {
            from: p(1),
            to: p(2),
            random_count: None,
            attack_multiplier: None,
        },
        12 | 56 => ActionKind::OrbChange {
            from: p(1),
            to: if raw.skill_type == 12 { JAMMER } else { POISON },
            random_count: None,
            attack_multiplier: None,
        },
        13 | 60 | 61 => ActionKind::OrbChange {
            from: -1,
            to: match raw.skill_type {
                13 => JAMMER,
                60 => POISON,
                _ => MORTAL_POISON,
            },
            random_count: Some(p(1)),
            attack_multiplier: None,
        },
        48 | 108 => ActionKind::OrbChange {
            from: p(2),
            to: p(3),
            random_count: None,
            attack_multiplier: some_nonzero(p(1)),
        },
        64 => ActionKind::OrbChange {
            from: -1,
            to: POISON,
            random_count: Some(p(2)),
            attack_multiplier: some_nonzero(p(1)),
        },

        // Blinds
        5 => ActionKind::Blind {
            attack_multiplier: None,
        },
        62 => ActionKind::Blind {
            attack_multiplier: some_nonzero(p(1)),
        },
        97 => ActionKind::StickyBlind {
            turns: p(1),
            min_count: p(2),
            max_count: p(3),
            positions: Vec::new(),
        },
        98 => ActionKind::StickyBlind {
            turns: p(1),
            min_count: 0,
            max_count: 0,
            positions: (2..7).map(|i| raw.param(i)).collect(),
        },

        // Buffs, heals and debuffs
        6 => ActionKind::Dispel,
        20 => ActionKind::StatusShield { turns: p(1) },
        7 | 86 => ActionKind::Recover {
            target: RecoverTarget::Enemy,
            amount: p(1),
        },
        52 => ActionKind::Recover {
            target: RecoverTarget::EnemyAlly,
            amount: p(1),
        },
        55 => ActionKind::Recover {
            target: RecoverTarget::Player,
            amount: p(1),
        },
        8 => ActionKind::Enrage {
            multiplier: 100 + p(1),
            turns: 0,
        },
        17..=19 => match raw.param_opt(3) {
            None => ActionKind::Enrage {
                multiplier: p(2),
                turns: p(1),
            },
            Some(multiplier) => ActionKind::Enrage {
                multiplier,
                turns: p(2),
            },
        },
        39 => match raw.param_opt(2) {
            Some(tenths) => ActionKind::Debuff {
                stat: DebuffStat::MoveTimeFlat,
                amount: -tenths,
                turns: p(1),
            },
            None => ActionKind::Debuff {
                stat: DebuffStat::MoveTimePercent,
                amount: p(3),
                turns: p(1),
            },
        },
        105 => ActionKind::Debuff {
            stat: DebuffStat::Rcv,
            amount: p(2),
            turns: p(1),
        },
        16 | 66 => ActionKind::Inactivity,
        40 => ActionKind::EndBattle,
        69 => ActionKind::DeathCry { message: p(0) },
        46 => {
            let mut attributes = Vec::new();
            for i in 1..6 {
                if let Some(attr) = raw.param_opt(i) {
                    if !attributes.contains(&attr) {
                        attributes.push(attr);
                    }
                }
            }
            ActionKind::ChangeAttribute { attributes }
        }
        50 => ActionKind::Gravity { percent: p(1) },

        // Shields and absorbs
        53 => ActionKind::Absorb {
            source: AbsorbSource::Attribute,
            value: p(3),
            turns: p(1),
        },
        67 => ActionKind::Absorb {
            source: AbsorbSource::Combo,
            value: p(3),
            turns: p(1),
        },
        87 => ActionKind::Absorb {
            source: AbsorbSource::Damage,
            value: p(2),
            turns: p(1),
        },
        71 => ActionKind::VoidShield {
            threshold: p(3),
            turns: p(1),
        },
        74 => ActionKind::DamageShield {
            percent: p(2),
            turns: p(1),
        },
        119 | 123 => ActionKind::Invulnerable {
            enabled: true,
            turns: p(1),
        },
        121 => ActionKind::Invulnerable {
            enabled: false,
            turns: 0,
        },

        // Board manipulation
        68 | 96 => ActionKind::Skyfall {
            attributes: p(1),
            chance: p(4),
            turns: p(2),
            locked: raw.skill_type == 96,
        },
        75 => ActionKind::LeaderSwap { turns: p(1) },
        76 | 78 => ActionKind::OrbSpawn {
            layout: if raw.skill_type == 76 {
                SpawnLayout::Column
            } else {
                SpawnLayout::Row
            },
            positions: vec![p(1)],
            attributes: p(2),
            count: 0,
            attack_multiplier: None,
        },
        77 | 79 => {
            let mut positions = Vec::new();
            let mut attributes = 0;
            for i in (1..6).step_by(2) {
                if p(i) != 0 && p(i + 1) != 0 {
                    positions.push(p(i));
                    attributes |= p(i + 1);
                }
            }
            ActionKind::OrbSpawn {
                layout: if raw.skill_type == 77 {
                    SpawnLayout::Column
                } else {
                    SpawnLayout::Row
                },
                positions,
                attributes,
                count: 0,
                attack_multiplier: some_nonzero(p(7)),
            }
        }
        92 => ActionKind::OrbSpawn {
            layout: SpawnLayout::Random,
            positions: Vec::new(),
            attributes: p(2),
            count: p(1),
            attack_multiplier: None,
        },
        84 => ActionKind::OrbSpawn {
            layout: SpawnLayout::Board,
            positions: Vec::new(),
            attributes: p(1),
            count: 0,
            attack_multiplier: None,
        },
        81 => {
            // Flat attribute list terminated by -1
            let attributes = (2..raw.params.len())
                .map_while(|i| raw.param_opt(i).filter(|v| *v >= 0))
                .fold(0, |bits, attr| bits | (1 << attr.min(62)));
            ActionKind::OrbSpawn {
                layout: SpawnLayout::Board,
                positions: Vec::new(),
                attributes,
                count: 0,
                attack_multiplier: some_nonzero(p(1)),
            }
        }
        85 => ActionKind::OrbSpawn {
            layout: SpawnLayout::Board,
            positions: Vec::new(),
            attributes: p(2),
            count: 0,
            attack_multiplier: some_nonzero(p(1)),
        },
        102 => ActionKind::OrbSpawn {
            layout: SpawnLayout::BombRandom,
            positions: Vec::new(),
            attributes: 0,
            count: p(2),
            attack_multiplier: raw.param_opt(14),
        },
        103 => ActionKind::OrbSpawn {
            layout: SpawnLayout::BombFixed,
            positions: (2..7).map(|i| raw.param(i)).collect(),
            attributes: 0,
            count: 0,
            attack_multiplier: raw.param_opt(14),
        },
        94 => ActionKind::OrbLock {
            attributes: p(1),
            count: p(2),
        },
        99 | 100 => ActionKind::OrbSeal {
            layout: if raw.skill_type == 99 {
                SealLayout::Column
            } else {
                SealLayout::Row
            },
            positions: p(1),
            turns: p(2),
        },
        104 => ActionKind::Cloud {
            width: p(2),
            height: p(3),
            turns: p(1),
            attack_multiplier: raw.param_opt(14),
        },
        89 => ActionKind::SkillDelay { turns: p(2) },
        101 => ActionKind::FixedStart,
        107 => ActionKind::AttributeBlock {
            attributes: p(2),
            turns: p(1),
        },
        109 | 110 => ActionKind::Spinners {
            speed: p(2),
            turns: p(1),
            fixed: raw.skill_type == 110,
        },
        111 => match raw.param_opt(2) {
            Some(value) => ActionKind::MaxHpChange {
                value,
                percent: true,
                turns: p(3),
            },
            None => ActionKind::MaxHpChange {
                value: p(3),
                percent: false,
                turns: p(3),
            },
        },
        112 => ActionKind::FixedTarget,
        122 => ActionKind::TurnChange {
            turn_counter: p(2),
        },
        83 | 95 => {
            let skills = raw
                .sub_skills
                .iter()
                .map(decode_sub_skill)
                .collect::<Result<Vec<_>, _>>()?;
            ActionKind::SkillSet {
                skills,
                on_death: raw.skill_type == 95,
            }
        }

        // Passives
        72 => ActionKind::AttributeResist {
            attributes: p(1),
            percent: p(2),
        },
        73 => ActionKind::Resolve { hp_threshold: p(1) },
        106 => ActionKind::TurnChangePassive {
            hp_threshold: p(1),
            turn_counter: p(2),
        },
        118 => ActionKind::TypeResist {
            types: p(1),
            percent: p(2),
        },
        _ => return Ok(None),
    };
    Ok(Some(kind))
}

/// Sub-skills of a skill set never carry their own trigger rule.
fn decode_sub_skill(raw: &RawSkill) -> Result<Action, DecodeError> {
    let kind = decode_action_kind(raw)?.unwrap_or(ActionKind::Unknown {
        skill_type: raw.skill_type,
    });
    Ok(Action::new(raw.enemy_skill_id, kind))
}

fn decode_logic(raw: &RawSkill) -> Result<Option<Instruction>, DecodeError> {
    let instr = match raw.skill_type {
        0 => Instruction::NoOp,
        22 | 24 | 44 | 45 => Instruction::FlagOperation {
            op: match raw.skill_type {
                22 => FlagOp::Set,
                24 => FlagOp::Unset,
                44 => FlagOp::Or,
                _ => FlagOp::Xor,
            },
            mask: raw.mask()?,
        },
        23 | 43 => Instruction::BranchFlag {
            mask: raw.mask()?,
            target: raw.target()?,
        },
        25 => Instruction::SetCounter {
            op: CounterOp::Assign,
            value: raw.ai()?,
        },
        26 => Instruction::SetCounter {
            op: CounterOp::Add,
            value: 1,
        },
        27 => Instruction::SetCounter {
            op: CounterOp::Subtract,
            value: 1,
        },
        38 => Instruction::SetCounterIf {
            compare: raw.ai()?,
            value: raw.rnd()?,
        },
        28 | 29 => Instruction::BranchHp {
            compare: if raw.skill_type == 28 {
                Compare::Less
            } else {
                Compare::GreaterOrEqual
            },
            value: raw.mask()?.min(u64::from(u32::MAX)) as u32,
            target: raw.target()?,
        },
        30..=32 => Instruction::BranchCounter {
            compare: match raw.skill_type {
                30 => Compare::Less,
                31 => Compare::Equal,
                _ => Compare::GreaterOrEqual,
            },
            value: raw.ai()?,
            target: raw.target()?,
        },
        33..=35 => Instruction::BranchLevel {
            compare: match raw.skill_type {
                33 => Compare::Less,
                34 => Compare::Equal,
                _ => Compare::GreaterOrEqual,
            },
            value: raw.mask()?.min(u64::from(u32::MAX)) as u32,
            target: raw.target()?,
        },
        36 => Instruction::EndPath,
        37 => Instruction::Countdown,
        49 => Instruction::Preemptive {
            level: raw.param(1).clamp(0, i64::from(u32::MAX)) as u32,
        },
        90 => Instruction::BranchCard {
            card_ids: raw
                .params
                .iter()
                .flatten()
                .filter_map(|id| u32::try_from(*id).ok())
                .collect(),
            target: raw.target()?,
        },
        113 => Instruction::BranchCombo {
            combo: raw.mask()?.min(u64::from(u32::MAX)) as u32,
            target: raw.target()?,
        },
        120 => Instruction::BranchRemainingEnemies {
            count: raw.mask()?.min(u64::from(u32::MAX)) as u32,
            target: raw.target()?,
        },
        _ => return Ok(None),
    };
    Ok(Some(instr))
}

/// Decodes one raw record. Unrecognized types become `Unknown` actions, never errors.
pub fn decode_skill(raw: &RawSkill) -> Result<Instruction, DecodeError> {
    if let Some(instr) = decode_logic(raw)? {
        crate::debug_decode!("skill {} type {} -> {:?}", raw.enemy_skill_id, raw.skill_type, instr);
        return Ok(instr);
    }

    let kind = match decode_action_kind(raw)? {
        Some(kind) => kind,
        None => {
            crate::debug_decode!(
                "skill {} has unrecognized type {}",
                raw.enemy_skill_id,
                raw.skill_type
            );
            ActionKind::Unknown {
                skill_type: raw.skill_type,
            }
        }
    };

    let mut action = Action::new(raw.enemy_skill_id, kind);
    // Passives are unconditional traits
    if !action.is_passive() {
        action.condition = raw.condition();
    }
    Ok(Instruction::Action(action))
}

/// Decodes an enemy's full behavior list, preserving order.
pub fn decode_behavior(raws: &[RawSkill]) -> Result<Vec<Instruction>, DecodeError> {
    raws.iter().map(decode_skill).collect()
}

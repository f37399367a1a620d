use serde::{Deserialize, Serialize};

/// Trigger rule attached to an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    /// Chance (0-100) that the action is picked when reached; 100 means it always fires and ends the turn.
    pub trigger_chance: u32,
    /// Secondary chance governing whether the action is merely available.
    pub random_chance: u32,
    /// The action only applies while HP is below this percentage.
    pub hp_threshold: Option<u32>,
    /// Bitmask in the one-time register; the action fires at most once per simulation.
    pub one_time: Option<u64>,
}

impl Condition {
    pub fn new(trigger_chance: u32, random_chance: u32) -> Self {
        Condition {
            trigger_chance,
            random_chance,
            hp_threshold: None,
            one_time: None,
        }
    }

    pub fn with_hp_threshold(mut self, hp_threshold: u32) -> Self {
        self.hp_threshold = Some(hp_threshold);
        self
    }

    pub fn with_one_time(mut self, mask: u64) -> Self {
        self.one_time = Some(mask);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindTarget {
    RandomCards,
    Attribute,
    Typing,
    ActiveSkills,
    Leaders,
    RandomSubs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoverTarget {
    Enemy,
    EnemyAlly,
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebuffStat {
    /// Move time reduced by a flat amount, in tenths of a second.
    MoveTimeFlat,
    /// Move time scaled to a percentage.
    MoveTimePercent,
    Rcv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsorbSource {
    Attribute,
    Combo,
    Damage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnLayout {
    Row,
    Column,
    Random,
    Board,
    BombRandom,
    BombFixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SealLayout {
    Row,
    Column,
}

/// Everything an enemy can do on its turn. Passives are unconditional traits and are
/// pulled out of the program before it is walked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    DefaultAttack,
    Attack {
        multiplier: i64,
        min_hits: i64,
        max_hits: i64,
    },
    PreemptiveAttack {
        multiplier: i64,
    },
    Bind {
        target: BindTarget,
        selector: i64,
        min_turns: i64,
        max_turns: i64,
        attack_multiplier: Option<i64>,
    },
    BindAwoken {
        turns: i64,
    },
    OrbChange {
        from: i64,
        to: i64,
        random_count: Option<i64>,
        attack_multiplier: Option<i64>,
    },
    Blind {
        attack_multiplier: Option<i64>,
    },
    StickyBlind {
        turns: i64,
        min_count: i64,
        max_count: i64,
        positions: Vec<i64>,
    },
    Dispel,
    StatusShield {
        turns: i64,
    },
    Recover {
        target: RecoverTarget,
        amount: i64,
    },
    Enrage {
        multiplier: i64,
        turns: i64,
    },
    Debuff {
        stat: DebuffStat,
        amount: i64,
        turns: i64,
    },
    Inactivity,
    EndBattle,
    DeathCry {
        message: i64,
    },
    ChangeAttribute {
        attributes: Vec<i64>,
    },
    Gravity {
        percent: i64,
    },
    Absorb {
        source: AbsorbSource,
        value: i64,
        turns: i64,
    },
    VoidShield {
        threshold: i64,
        turns: i64,
    },
    DamageShield {
        percent: i64,
        turns: i64,
    },
    Invulnerable {
        enabled: bool,
        turns: i64,
    },
    Skyfall {
        attributes: i64,
        chance: i64,
        turns: i64,
        locked: bool,
    },
    LeaderSwap {
        turns: i64,
    },
    OrbSpawn {
        layout: SpawnLayout,
        positions: Vec<i64>,
        attributes: i64,
        count: i64,
        attack_multiplier: Option<i64>,
    },
    OrbLock {
        attributes: i64,
        count: i64,
    },
    OrbSeal {
        layout: SealLayout,
        positions: i64,
        turns: i64,
    },
    Cloud {
        width: i64,
        height: i64,
        turns: i64,
        attack_multiplier: Option<i64>,
    },
    SkillDelay {
        turns: i64,
    },
    FixedStart,
    AttributeBlock {
        attributes: i64,
        turns: i64,
    },
    Spinners {
        speed: i64,
        turns: i64,
        fixed: bool,
    },
    MaxHpChange {
        value: i64,
        percent: bool,
        turns: i64,
    },
    FixedTarget,
    TurnChange {
        turn_counter: i64,
    },
    SkillSet {
        skills: Vec<Action>,
        on_death: bool,
    },
    /// Reported when a countdown node keeps the enemy from acting.
    Countdown {
        remaining: i64,
    },
    // Passives
    AttributeResist {
        attributes: i64,
        percent: i64,
    },
    Resolve {
        hp_threshold: i64,
    },
    TurnChangePassive {
        hp_threshold: i64,
        turn_counter: i64,
    },
    TypeResist {
        types: i64,
        percent: i64,
    },
    /// A skill type the decoder does not know yet.
    Unknown {
        skill_type: u32,
    },
}

impl ActionKind {
    pub fn is_passive(&self) -> bool {
        matches!(
            self,
            ActionKind::AttributeResist { .. }
                | ActionKind::Resolve { .. }
                | ActionKind::TurnChangePassive { .. }
                | ActionKind::TypeResist { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub skill_id: u32,
    #[serde(flatten)]
    pub kind: ActionKind,
    pub condition: Option<Condition>,
}

impl Action {
    pub fn new(skill_id: u32, kind: ActionKind) -> Self {
        Action {
            skill_id,
            kind,
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// The enemy's plain attack, reported when a walk records nothing else.
    pub fn default_attack() -> Self {
        Action::new(0, ActionKind::DefaultAttack)
    }

    pub fn hp_threshold(&self) -> Option<u32> {
        self.condition.as_ref().and_then(|c| c.hp_threshold)
    }

    pub fn is_passive(&self) -> bool {
        self.kind.is_passive()
    }

    /// Skill types of every unknown action, including ones nested in skill sets.
    pub fn unknown_types(&self) -> Vec<u32> {
        match &self.kind {
            ActionKind::Unknown { skill_type } => vec![*skill_type],
            ActionKind::SkillSet { skills, .. } => {
                skills.iter().flat_map(|s| s.unknown_types()).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compare {
    Less,
    Equal,
    GreaterOrEqual,
}

impl Compare {
    pub fn test<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            Compare::Less => lhs < rhs,
            Compare::Equal => lhs == rhs,
            Compare::GreaterOrEqual => lhs >= rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagOp {
    Set,
    Or,
    Unset,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterOp {
    Assign,
    Add,
    Subtract,
}

/// A single node of an enemy behavior program. Jump targets are 1-based program indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Instruction {
    NoOp,
    Action(Action),
    Preemptive {
        level: u32,
    },
    FlagOperation {
        op: FlagOp,
        mask: u64,
    },
    SetCounter {
        op: CounterOp,
        value: i64,
    },
    SetCounterIf {
        compare: i64,
        value: i64,
    },
    BranchFlag {
        mask: u64,
        target: usize,
    },
    BranchHp {
        compare: Compare,
        value: u32,
        target: usize,
    },
    BranchLevel {
        compare: Compare,
        value: u32,
        target: usize,
    },
    BranchCounter {
        compare: Compare,
        value: i64,
        target: usize,
    },
    BranchCard {
        card_ids: Vec<u32>,
        target: usize,
    },
    BranchCombo {
        combo: u32,
        target: usize,
    },
    BranchRemainingEnemies {
        count: u32,
        target: usize,
    },
    Countdown,
    EndPath,
}

impl Instruction {
    /// Jump target of a branch node, `None` for everything else.
    pub fn branch_target(&self) -> Option<usize> {
        use Instruction::*;
        match self {
            BranchFlag { target, .. }
            | BranchHp { target, .. }
            | BranchLevel { target, .. }
            | BranchCounter { target, .. }
            | BranchCard { target, .. }
            | BranchCombo { target, .. }
            | BranchRemainingEnemies { target, .. } => Some(*target),
            NoOp
            | Action(_)
            | Preemptive { .. }
            | FlagOperation { .. }
            | SetCounter { .. }
            | SetCounterIf { .. }
            | Countdown
            | EndPath => None,
        }
    }

    pub fn as_action(&self) -> Option<&Action> {
        match self {
            Instruction::Action(action) => Some(action),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare() {
        assert!(Compare::Less.test(49, 50));
        assert!(!Compare::Less.test(50, 50));
        assert!(Compare::GreaterOrEqual.test(50, 50));
        assert!(!Compare::GreaterOrEqual.test(-1, 0));
        assert!(Compare::Equal.test(3, 3));
    }

    #[test]
    fn test_branch_target() {
        let branch = Instruction::BranchHp {
            compare: Compare::Less,
            value: 50,
            target: 4,
        };
        assert_eq!(branch.branch_target(), Some(4));
        assert_eq!(Instruction::EndPath.branch_target(), None);
    }

    #[test]
    fn test_passive_kinds() {
        let resolve = Action::new(7, ActionKind::Resolve { hp_threshold: 50 });
        assert!(resolve.is_passive());
        assert!(!Action::default_attack().is_passive());
    }

    #[test]
    fn test_unknown_types_nested() {
        let set = Action::new(
            1,
            ActionKind::SkillSet {
                skills: vec![
                    Action::new(2, ActionKind::Unknown { skill_type: 140 }),
                    Action::new(3, ActionKind::Dispel),
                ],
                on_death: false,
            },
        );
        assert_eq!(set.unknown_types(), vec![140]);
    }

    #[test]
    fn test_instruction_json_shape() {
        let instr = Instruction::Action(
            Action::new(12, ActionKind::Gravity { percent: 30 })
                .with_condition(Condition::new(50, 0).with_hp_threshold(20)),
        );
        let json = serde_json::to_value(&instr).unwrap();
        assert_eq!(json["node"], "action");
        assert_eq!(json["kind"], "gravity");
        assert_eq!(json["percent"], 30);
        assert_eq!(json["condition"]["hp_threshold"], 20);
        let back: Instruction = serde_json::from_value(json).unwrap();
        assert_eq!(back, instr);
    }

    #[test]
    fn test_register_nodes_keep_op_field() {
        let flag = Instruction::FlagOperation {
            op: FlagOp::Xor,
            mask: 6,
        };
        let json = serde_json::to_value(&flag).unwrap();
        assert_eq!(json["node"], "flag_operation");
        assert_eq!(json["op"], "xor");
        assert_eq!(serde_json::from_value::<Instruction>(json).unwrap(), flag);

        let counter: Instruction = serde_json::from_str(
            r#"{"node": "set_counter", "op": "subtract", "value": 1}"#,
        )
        .unwrap();
        assert_eq!(
            counter,
            Instruction::SetCounter {
                op: CounterOp::Subtract,
                value: 1
            }
        );
    }
}

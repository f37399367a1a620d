// Execution context: simulated battle state threaded through every walk of a program

use std::collections::BTreeSet;

use super::instruction::{CounterOp, FlagOp};
use crate::config;

/// Mutable simulation state for one enemy. Cloning is deep; sweeps fork it freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub turn: u32,                // Current turn, starting at 1
    pub is_preemptive: bool,      // The last walk passed a preemptive marker
    pub do_preemptive: bool,      // The marker's level gate was satisfied
    pub flags: u64,               // General purpose flag register
    pub one_time_flags: u64,      // Flags consumed by one-time actions
    pub counter: i64,             // Counter register
    pub countdown: bool,          // Counter ticks down at the end of each turn
    pub hp: u32,                  // Enemy HP percentage
    pub level: u32,               // Enemy level
    pub enemies: u32,             // Enemies remaining on screen
    pub cards: BTreeSet<u32>,     // Ally card ids on the player's team
}

impl ExecutionContext {
    pub fn new(level: u32) -> Self {
        ExecutionContext {
            turn: 1,
            is_preemptive: false,
            do_preemptive: false,
            flags: 0,
            one_time_flags: 0,
            counter: 0,
            countdown: false,
            hp: config::FULL_HP,
            level,
            enemies: config::DEFAULT_ENEMY_COUNT,
            cards: BTreeSet::new(),
        }
    }

    /// Clears the per-walk preemptive markers.
    pub fn reset(&mut self) {
        self.is_preemptive = false;
        self.do_preemptive = false;
    }

    /// Advances to the next turn, ticking an active countdown.
    pub fn turn_event(&mut self) {
        self.turn += 1;
        if self.countdown {
            if self.counter > 0 {
                self.counter -= 1;
            } else {
                self.countdown = false;
            }
        }
    }

    pub fn apply_flag_operation(&mut self, op: FlagOp, mask: u64) {
        match op {
            FlagOp::Set | FlagOp::Or => self.flags |= mask,
            FlagOp::Unset => self.flags &= !mask,
            FlagOp::Xor => self.flags ^= mask,
        }
    }

    pub fn apply_counter_operation(&mut self, op: CounterOp, value: i64) {
        match op {
            CounterOp::Assign => self.counter = value,
            CounterOp::Add => self.counter = self.counter.saturating_add(value),
            CounterOp::Subtract => self.counter = self.counter.saturating_sub(value),
        }
    }

    /// Returns true when every bit of `mask` is set in the flag register.
    pub fn has_flags(&self, mask: u64) -> bool {
        self.flags & mask == mask
    }

    /// Returns true if any of `card_ids` is on the team.
    pub fn has_any_card(&self, card_ids: &[u32]) -> bool {
        card_ids.iter().any(|id| self.cards.contains(id))
    }
}

// Condition evaluation: decides whether an action fires when the walk reaches it

use super::instruction::Condition;
use super::state::ExecutionContext;

/// Outcome of evaluating an action's trigger rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Record the action and keep scanning.
    Fire,
    /// The action does not apply; move on without recording it.
    Skip,
    /// Record the action and end the walk; the enemy used its turn.
    FireAndStop,
}

impl Condition {
    /// Evaluates this condition, consuming the one-time flag when it fires.
    pub fn evaluate(&self, ctx: &mut ExecutionContext) -> Verdict {
        if let Some(threshold) = self.hp_threshold {
            if ctx.hp >= threshold {
                return Verdict::Skip;
            }
        }

        if let Some(mask) = self.one_time {
            if ctx.one_time_flags & mask == 0 {
                ctx.one_time_flags |= mask;
                return Verdict::FireAndStop;
            }
            return Verdict::Skip;
        }

        if self.trigger_chance >= 100 {
            Verdict::FireAndStop
        } else {
            Verdict::Fire
        }
    }
}

/// Evaluates an optional condition; actions without one always fire and stop.
pub fn evaluate(condition: Option<&Condition>, ctx: &mut ExecutionContext) -> Verdict {
    match condition {
        Some(condition) => condition.evaluate(ctx),
        None => Verdict::FireAndStop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_condition_fires_and_stops() {
        let mut ctx = ExecutionContext::new(1);
        assert_eq!(evaluate(None, &mut ctx), Verdict::FireAndStop);
    }

    #[test]
    fn test_hp_threshold_skips_at_or_above() {
        let cond = Condition::new(100, 0).with_hp_threshold(50);
        let mut ctx = ExecutionContext::new(1);
        ctx.hp = 50;
        assert_eq!(cond.evaluate(&mut ctx), Verdict::Skip);
        ctx.hp = 49;
        assert_eq!(cond.evaluate(&mut ctx), Verdict::FireAndStop);
    }

    #[test]
    fn test_partial_chance_fires_and_continues() {
        let cond = Condition::new(30, 0);
        let mut ctx = ExecutionContext::new(1);
        assert_eq!(cond.evaluate(&mut ctx), Verdict::Fire);
    }

    #[test]
    fn test_one_time_consumed() {
        let cond = Condition::new(100, 0).with_one_time(0b10);
        let mut ctx = ExecutionContext::new(1);
        let fresh = ctx.clone();

        assert_eq!(cond.evaluate(&mut ctx), Verdict::FireAndStop);
        assert_eq!(ctx.one_time_flags, 0b10);
        assert_eq!(cond.evaluate(&mut ctx), Verdict::Skip);

        let mut forked = fresh.clone();
        assert_eq!(cond.evaluate(&mut forked), Verdict::FireAndStop);
    }

    #[test]
    fn test_one_time_checked_after_hp() {
        let cond = Condition::new(100, 0).with_hp_threshold(30).with_one_time(1);
        let mut ctx = ExecutionContext::new(1);
        assert_eq!(cond.evaluate(&mut ctx), Verdict::Skip);
        assert_eq!(ctx.one_time_flags, 0);
        ctx.hp = 10;
        assert_eq!(cond.evaluate(&mut ctx), Verdict::FireAndStop);
        assert_eq!(ctx.one_time_flags, 1);
    }
}

// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::obj::ObjValue;

/// Global scale factor on every penalty weight.
///
/// Must be divisible by every planning-horizon length, so the
/// `x * total_week_num / total_week_num` rounding in the total-assignment
/// terms never loses a unit. 2520 = lcm(1..=9) covers the 4- and 8-week
/// competition horizons with room to spare.
pub const AMP: i64 = 2520;

/// Sentinel delta returned by `try_*` evaluators when a hard constraint or
/// an internal precondition fails. Any candidate with a delta at or above
/// this value is rejected by every strategy. Large enough to dominate any
/// real objective, small enough that a handful of additions cannot wrap.
pub const FORBIDDEN_MOVE: ObjValue = ObjValue::new(i64::MAX / 8);

const UNDERSTAFF_REPAIR: ObjValue = ObjValue::new(8000 * AMP);
const SUCCESSION_REPAIR: ObjValue = ObjValue::new(5000 * AMP);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyMode {
    /// Understaffing and illegal successions are hard: their weights are the
    /// `FORBIDDEN_MOVE` sentinel.
    Default,
    /// Understaffing and illegal successions carry large finite weights so
    /// the repair loop can walk through temporarily infeasible states.
    Repair,
}

/// Soft-constraint weights plus the two mode-dependent hard weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyTable {
    mode: PenaltyMode,
    insufficient_staff: ObjValue,
    consecutive_shift: ObjValue,
    consecutive_day: ObjValue,
    consecutive_day_off: ObjValue,
    preference: ObjValue,
    complete_weekend: ObjValue,
    total_assign: ObjValue,
    total_working_weekend: ObjValue,
    understaff: ObjValue,
    succession: ObjValue,
}

impl Default for PenaltyTable {
    fn default() -> Self {
        Self {
            mode: PenaltyMode::Default,
            insufficient_staff: ObjValue::new(30 * AMP),
            consecutive_shift: ObjValue::new(15 * AMP),
            consecutive_day: ObjValue::new(30 * AMP),
            consecutive_day_off: ObjValue::new(30 * AMP),
            preference: ObjValue::new(10 * AMP),
            complete_weekend: ObjValue::new(30 * AMP),
            total_assign: ObjValue::new(20 * AMP),
            total_working_weekend: ObjValue::new(30 * AMP),
            understaff: FORBIDDEN_MOVE,
            succession: FORBIDDEN_MOVE,
        }
    }
}

impl PenaltyTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn mode(&self) -> PenaltyMode {
        self.mode
    }

    pub fn set_default_mode(&mut self) {
        self.mode = PenaltyMode::Default;
        self.understaff = FORBIDDEN_MOVE;
        self.succession = FORBIDDEN_MOVE;
    }

    pub fn set_repair_mode(&mut self) {
        self.mode = PenaltyMode::Repair;
        self.understaff = UNDERSTAFF_REPAIR;
        self.succession = SUCCESSION_REPAIR;
    }

    #[inline]
    pub fn insufficient_staff(&self) -> ObjValue {
        self.insufficient_staff
    }

    #[inline]
    pub fn consecutive_shift(&self) -> ObjValue {
        self.consecutive_shift
    }

    #[inline]
    pub fn consecutive_day(&self) -> ObjValue {
        self.consecutive_day
    }

    #[inline]
    pub fn consecutive_day_off(&self) -> ObjValue {
        self.consecutive_day_off
    }

    #[inline]
    pub fn preference(&self) -> ObjValue {
        self.preference
    }

    #[inline]
    pub fn complete_weekend(&self) -> ObjValue {
        self.complete_weekend
    }

    #[inline]
    pub fn total_assign(&self) -> ObjValue {
        self.total_assign
    }

    #[inline]
    pub fn total_working_weekend(&self) -> ObjValue {
        self.total_working_weekend
    }

    #[inline]
    pub fn understaff(&self) -> ObjValue {
        self.understaff
    }

    #[inline]
    pub fn succession(&self) -> ObjValue {
        self.succession
    }
}

/// True if a `try_*` delta means the move must be rejected.
///
/// The threshold is half the sentinel: an evaluator may accumulate the
/// sentinel plus ordinary negative terms, which can land slightly below
/// `FORBIDDEN_MOVE` but never anywhere near half of it.
#[inline]
pub fn is_forbidden(delta: ObjValue) -> bool {
    delta.value() >= FORBIDDEN_MOVE.value() / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amp_divides_week_counts() {
        for weeks in 1..=9 {
            assert_eq!(AMP % weeks, 0, "AMP must divide a {weeks}-week horizon");
        }
    }

    #[test]
    fn mode_switch_round_trips() {
        let mut pen = PenaltyTable::new();
        assert_eq!(pen.understaff(), FORBIDDEN_MOVE);
        pen.set_repair_mode();
        assert_eq!(pen.mode(), PenaltyMode::Repair);
        assert!(pen.understaff() < FORBIDDEN_MOVE);
        assert!(pen.succession() < FORBIDDEN_MOVE);
        pen.set_default_mode();
        assert_eq!(pen, PenaltyTable::new());
    }

    #[test]
    fn forbidden_dominates() {
        assert!(is_forbidden(FORBIDDEN_MOVE));
        assert!(is_forbidden(
            FORBIDDEN_MOVE + ObjValue::new(-(1000 * AMP))
        ));
        assert!(!is_forbidden(ObjValue::new(10_000 * AMP)));
    }
}

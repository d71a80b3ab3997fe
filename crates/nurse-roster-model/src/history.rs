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

use crate::common::{NurseId, ShiftId};
use serde::{Deserialize, Serialize};

/// What the previous weeks left behind, per nurse. Immutable during one
/// solve; the next week's history is generated from the accepted roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    /// Weeks already rostered before this one; 0 for the first week.
    pub past_week_count: i64,
    /// Objective accumulated over the past weeks, in AMP-scaled units.
    pub acc_obj_value: i64,
    pub total_assign: Vec<i64>,
    pub total_working_weekend: Vec<i64>,
    pub last_shift: Vec<Option<ShiftId>>,
    pub consecutive_shift: Vec<i64>,
    pub consecutive_work: Vec<i64>,
    pub consecutive_off: Vec<i64>,
}

impl History {
    /// A blank first-week history: no assignments, everyone rested for one
    /// day so the consecutive counters are well formed.
    pub fn initial(nurse_num: usize) -> Self {
        Self {
            past_week_count: 0,
            acc_obj_value: 0,
            total_assign: vec![0; nurse_num],
            total_working_weekend: vec![0; nurse_num],
            last_shift: vec![None; nurse_num],
            consecutive_shift: vec![0; nurse_num],
            consecutive_work: vec![0; nurse_num],
            consecutive_off: vec![1; nurse_num],
        }
    }

    /// The 1-based index of the week being solved.
    #[inline]
    pub fn current_week(&self) -> i64 {
        self.past_week_count + 1
    }

    #[inline]
    pub fn nurse_num(&self) -> usize {
        self.total_assign.len()
    }

    #[inline]
    pub fn total_assign(&self, nurse: NurseId) -> i64 {
        self.total_assign[nurse.get()]
    }

    #[inline]
    pub fn total_working_weekend(&self, nurse: NurseId) -> i64 {
        self.total_working_weekend[nurse.get()]
    }

    #[inline]
    pub fn last_shift(&self, nurse: NurseId) -> Option<ShiftId> {
        self.last_shift[nurse.get()]
    }

    #[inline]
    pub fn consecutive_shift(&self, nurse: NurseId) -> i64 {
        self.consecutive_shift[nurse.get()]
    }

    #[inline]
    pub fn consecutive_work(&self, nurse: NurseId) -> i64 {
        self.consecutive_work[nurse.get()]
    }

    #[inline]
    pub fn consecutive_off(&self, nurse: NurseId) -> i64 {
        self.consecutive_off[nurse.get()]
    }

    #[inline]
    pub fn is_working_last(&self, nurse: NurseId) -> bool {
        self.last_shift(nurse).is_some()
    }

    /// The consecutive counters must agree with the last shift: a resting
    /// nurse carries an off run of at least one day and no work runs, a
    /// working nurse the opposite. The solver's run index is built on
    /// this.
    pub fn is_consistent(&self, nurse: NurseId) -> bool {
        let n = nurse.get();
        if self.past_week_count < 0 || self.total_assign[n] < 0 || self.total_working_weekend[n] < 0
        {
            return false;
        }
        match self.last_shift[n] {
            Some(_) => {
                self.consecutive_shift[n] >= 1
                    && self.consecutive_work[n] >= self.consecutive_shift[n]
                    && self.consecutive_off[n] == 0
            }
            None => {
                self.consecutive_shift[n] == 0
                    && self.consecutive_work[n] == 0
                    && self.consecutive_off[n] >= 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_is_rested() {
        let h = History::initial(3);
        assert_eq!(h.nurse_num(), 3);
        assert_eq!(h.current_week(), 1);
        let n = NurseId::new(1);
        assert_eq!(h.last_shift(n), None);
        assert_eq!(h.consecutive_off(n), 1);
        assert_eq!(h.consecutive_work(n), 0);
        assert!(!h.is_working_last(n));
    }

    #[test]
    fn snapshot_round_trip() {
        let mut h = History::initial(2);
        h.past_week_count = 2;
        h.total_assign[0] = 9;
        h.last_shift[1] = Some(ShiftId::new(1));
        h.consecutive_shift[1] = 3;
        let json = serde_json::to_string(&h).unwrap();
        let back: History = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
        assert_eq!(back.current_week(), 3);
    }
}

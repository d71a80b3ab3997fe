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

use nurse_roster_core::prelude::Weekday;
use nurse_roster_model::prelude::{History, NurseId, Roster, ShiftId, ShiftSlot, SkillId};

/// The nurse × day grid of assignment cells. Column 0 mirrors the
/// history's last shift (its skill slot is meaningless), so succession and
/// block logic at Monday reads it like any other neighbor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignTable {
    nurse_num: usize,
    cells: Vec<Option<ShiftSlot>>,
}

impl AssignTable {
    pub fn from_history(history: &History) -> Self {
        let nurse_num = history.nurse_num();
        let mut table = Self {
            nurse_num,
            cells: vec![None; nurse_num * Weekday::SIZE],
        };
        for n in 0..nurse_num {
            let nurse = NurseId::new(n);
            let idx = table.idx(nurse, Weekday::HIS);
            table.cells[idx] = history
                .last_shift(nurse)
                .map(|shift| ShiftSlot::new(shift, SkillId::new(0)));
        }
        table
    }

    #[inline]
    pub fn nurse_num(&self) -> usize {
        self.nurse_num
    }

    #[inline]
    fn idx(&self, nurse: NurseId, day: Weekday) -> usize {
        nurse.get() * Weekday::SIZE + day.index()
    }

    #[inline]
    pub fn cell(&self, nurse: NurseId, day: Weekday) -> Option<ShiftSlot> {
        self.cells[self.idx(nurse, day)]
    }

    #[inline]
    pub fn shift_at(&self, nurse: NurseId, day: Weekday) -> Option<ShiftId> {
        self.cell(nurse, day).map(|slot| slot.shift)
    }

    #[inline]
    pub fn is_working(&self, nurse: NurseId, day: Weekday) -> bool {
        self.cell(nurse, day).is_some()
    }

    #[inline]
    pub fn set(&mut self, nurse: NurseId, day: Weekday, slot: Option<ShiftSlot>) {
        debug_assert!(day != Weekday::HIS, "the history column is read-only");
        let i = self.idx(nurse, day);
        self.cells[i] = slot;
    }

    pub fn to_roster(&self) -> Roster {
        let mut roster = Roster::empty(self.nurse_num);
        for n in 0..self.nurse_num {
            let nurse = NurseId::new(n);
            for day in Weekday::week() {
                roster.set(nurse, day, self.cell(nurse, day));
            }
        }
        roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_column_mirrors_last_shift() {
        let mut history = History::initial(2);
        history.last_shift[1] = Some(ShiftId::new(3));
        let table = AssignTable::from_history(&history);
        assert_eq!(table.shift_at(NurseId::new(0), Weekday::HIS), None);
        assert_eq!(
            table.shift_at(NurseId::new(1), Weekday::HIS),
            Some(ShiftId::new(3))
        );
        assert!(!table.is_working(NurseId::new(1), Weekday::MON));
    }

    #[test]
    fn set_and_export() {
        let history = History::initial(1);
        let mut table = AssignTable::from_history(&history);
        let slot = ShiftSlot::new(ShiftId::new(0), SkillId::new(0));
        table.set(NurseId::new(0), Weekday::WED, Some(slot));
        let roster = table.to_roster();
        assert_eq!(roster.get(NurseId::new(0), Weekday::WED), Some(slot));
        assert_eq!(roster.assigned_count(), 1);
    }
}

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

use crate::common::{NurseId, ShiftId, SkillId};
use crate::scenario::Scenario;
use nurse_roster_core::prelude::Weekday;
use serde::{Deserialize, Serialize};

/// A working assignment: which shift, covering which skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftSlot {
    pub shift: ShiftId,
    pub skill: SkillId,
}

impl ShiftSlot {
    #[inline]
    pub const fn new(shift: ShiftId, skill: SkillId) -> Self {
        Self { shift, skill }
    }
}

/// One week's assignment grid, Mon..Sun per nurse; `None` is a day off.
/// This is the exported solution form; the solver keeps its own table with
/// the history sentinel column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    nurse_num: usize,
    cells: Vec<Option<ShiftSlot>>,
}

impl Roster {
    pub fn empty(nurse_num: usize) -> Self {
        Self {
            nurse_num,
            cells: vec![None; nurse_num * Weekday::NUM],
        }
    }

    #[inline]
    pub fn nurse_num(&self) -> usize {
        self.nurse_num
    }

    #[inline]
    fn idx(&self, nurse: NurseId, day: Weekday) -> usize {
        debug_assert!(day != Weekday::HIS);
        nurse.get() * Weekday::NUM + (day.index() - 1)
    }

    #[inline]
    pub fn get(&self, nurse: NurseId, day: Weekday) -> Option<ShiftSlot> {
        self.cells[self.idx(nurse, day)]
    }

    #[inline]
    pub fn set(&mut self, nurse: NurseId, day: Weekday, slot: Option<ShiftSlot>) {
        let i = self.idx(nurse, day);
        self.cells[i] = slot;
    }

    #[inline]
    pub fn is_working(&self, nurse: NurseId, day: Weekday) -> bool {
        self.get(nurse, day).is_some()
    }

    pub fn assigned_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Solution-file listing: one line per nurse and day, shift and skill
    /// by name, or an absent marker for a day off.
    pub fn write_solution<W: std::io::Write>(
        &self,
        scenario: &Scenario,
        out: &mut W,
    ) -> std::io::Result<()> {
        writeln!(out, "SOLUTION {}", scenario.name())?;
        for nurse in scenario.nurse_ids() {
            for day in Weekday::week() {
                match self.get(nurse, day) {
                    Some(slot) => writeln!(
                        out,
                        "{} {} {} {}",
                        scenario.nurse(nurse).name(),
                        day,
                        scenario.shift(slot.shift).name(),
                        scenario.skill_name(slot.skill),
                    )?,
                    None => writeln!(out, "{} {} -", scenario.nurse(nurse).name(), day)?,
                }
            }
        }
        Ok(())
    }

    /// Compact `shift skill` id pairs for the CSV result sheet, day-major
    /// per nurse, `-1 -1` for a day off.
    pub fn serialize_compact(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() * 4);
        for cell in &self.cells {
            match cell {
                Some(slot) => {
                    out.push_str(&slot.shift.get().to_string());
                    out.push(' ');
                    out.push_str(&slot.skill.get().to_string());
                    out.push(' ');
                }
                None => out.push_str("-1 -1 "),
            }
        }
        out.pop();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{ContractTerms, ScenarioBuilder};

    fn slot(shift: usize, skill: usize) -> ShiftSlot {
        ShiftSlot::new(ShiftId::new(shift), SkillId::new(skill))
    }

    #[test]
    fn get_set() {
        let mut r = Roster::empty(2);
        assert!(!r.is_working(NurseId::new(0), Weekday::MON));
        r.set(NurseId::new(0), Weekday::MON, Some(slot(1, 0)));
        r.set(NurseId::new(1), Weekday::SUN, Some(slot(0, 0)));
        assert_eq!(r.get(NurseId::new(0), Weekday::MON), Some(slot(1, 0)));
        assert_eq!(r.get(NurseId::new(0), Weekday::TUE), None);
        assert_eq!(r.assigned_count(), 2);
    }

    #[test]
    fn compact_serialization() {
        let mut r = Roster::empty(1);
        r.set(NurseId::new(0), Weekday::MON, Some(slot(2, 1)));
        let s = r.serialize_compact();
        assert!(s.starts_with("2 1 -1 -1"));
        assert_eq!(s.split_whitespace().count(), 14);
    }

    #[test]
    fn solution_listing_names_shifts() {
        let sc = ScenarioBuilder::new("tiny", 1)
            .skill("Nurse")
            .shift("Late", 1, 7)
            .contract(
                "FT",
                ContractTerms {
                    min_assignments: 0,
                    max_assignments: 7,
                    min_consecutive_work: 1,
                    max_consecutive_work: 7,
                    min_consecutive_off: 1,
                    max_consecutive_off: 7,
                    max_working_weekends: 1,
                    complete_weekend: false,
                },
            )
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap();
        let mut r = Roster::empty(1);
        r.set(NurseId::new(0), Weekday::TUE, Some(slot(0, 0)));
        let mut buf = Vec::new();
        r.write_solution(&sc, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Amy Tue Late Nurse"));
        assert!(text.contains("Amy Mon -"));
    }
}

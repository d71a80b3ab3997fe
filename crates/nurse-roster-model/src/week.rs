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
use fixedbitset::FixedBitSet;
use nurse_roster_core::prelude::Weekday;

/// Dense `day × shift × skill` table of nurse counts. Row 0 (the history
/// sentinel day) exists but stays zero, so day indexing never branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NurseNumTable {
    shift_num: usize,
    skill_num: usize,
    data: Vec<i64>,
}

impl NurseNumTable {
    pub fn new(shift_num: usize, skill_num: usize) -> Self {
        Self {
            shift_num,
            skill_num,
            data: vec![0; Weekday::SIZE * shift_num * skill_num],
        }
    }

    #[inline]
    fn idx(&self, day: Weekday, shift: ShiftId, skill: SkillId) -> usize {
        (day.index() * self.shift_num + shift.get()) * self.skill_num + skill.get()
    }

    #[inline]
    pub fn get(&self, day: Weekday, shift: ShiftId, skill: SkillId) -> i64 {
        self.data[self.idx(day, shift, skill)]
    }

    #[inline]
    pub fn set(&mut self, day: Weekday, shift: ShiftId, skill: SkillId, value: i64) {
        let i = self.idx(day, shift, skill);
        self.data[i] = value;
    }

    #[inline]
    pub fn add(&mut self, day: Weekday, shift: ShiftId, skill: SkillId, delta: i64) {
        let i = self.idx(day, shift, skill);
        self.data[i] += delta;
    }

    #[inline]
    pub fn shift_num(&self) -> usize {
        self.shift_num
    }

    #[inline]
    pub fn skill_num(&self) -> usize {
        self.skill_num
    }
}

/// The demand and preference data of a single planning week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekData {
    nurse_num: usize,
    /// `shift_off[day * shift_num + shift]` holds one bit per nurse.
    shift_off: Vec<FixedBitSet>,
    opt_nurse_nums: NurseNumTable,
    min_nurse_nums: NurseNumTable,
}

impl WeekData {
    pub fn new(shift_num: usize, skill_num: usize, nurse_num: usize) -> Self {
        Self {
            nurse_num,
            shift_off: vec![FixedBitSet::with_capacity(nurse_num); Weekday::SIZE * shift_num],
            opt_nurse_nums: NurseNumTable::new(shift_num, skill_num),
            min_nurse_nums: NurseNumTable::new(shift_num, skill_num),
        }
    }

    #[inline]
    pub fn nurse_num(&self) -> usize {
        self.nurse_num
    }

    #[inline]
    pub fn opt_nurse_nums(&self) -> &NurseNumTable {
        &self.opt_nurse_nums
    }

    #[inline]
    pub fn min_nurse_nums(&self) -> &NurseNumTable {
        &self.min_nurse_nums
    }

    pub fn set_requirement(
        &mut self,
        day: Weekday,
        shift: ShiftId,
        skill: SkillId,
        min: i64,
        opt: i64,
    ) {
        self.min_nurse_nums.set(day, shift, skill, min);
        self.opt_nurse_nums.set(day, shift, skill, opt);
    }

    pub fn set_shift_off(&mut self, day: Weekday, shift: ShiftId, nurse: NurseId) {
        let i = day.index() * self.opt_nurse_nums.shift_num() + shift.get();
        self.shift_off[i].insert(nurse.get());
    }

    /// 1 when the nurse asked not to work `shift` on `day`, else 0; kept
    /// numeric because it multiplies the preference weight directly.
    #[inline]
    pub fn shift_off(&self, day: Weekday, shift: ShiftId, nurse: NurseId) -> i64 {
        let i = day.index() * self.opt_nurse_nums.shift_num() + shift.get();
        i64::from(self.shift_off[i].contains(nurse.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_round_trip() {
        let mut t = NurseNumTable::new(3, 2);
        let d = Weekday::WED;
        t.set(d, ShiftId::new(2), SkillId::new(1), 4);
        t.add(d, ShiftId::new(2), SkillId::new(1), -1);
        assert_eq!(t.get(d, ShiftId::new(2), SkillId::new(1)), 3);
        assert_eq!(t.get(d, ShiftId::new(0), SkillId::new(0)), 0);
    }

    #[test]
    fn shift_off_flags() {
        let mut wd = WeekData::new(2, 1, 3);
        wd.set_shift_off(Weekday::FRI, ShiftId::new(1), NurseId::new(2));
        assert_eq!(wd.shift_off(Weekday::FRI, ShiftId::new(1), NurseId::new(2)), 1);
        assert_eq!(wd.shift_off(Weekday::FRI, ShiftId::new(0), NurseId::new(2)), 0);
        assert_eq!(wd.shift_off(Weekday::THU, ShiftId::new(1), NurseId::new(2)), 0);
    }

    #[test]
    fn requirements() {
        let mut wd = WeekData::new(1, 1, 2);
        wd.set_requirement(Weekday::MON, ShiftId::new(0), SkillId::new(0), 1, 2);
        assert_eq!(wd.min_nurse_nums().get(Weekday::MON, ShiftId::new(0), SkillId::new(0)), 1);
        assert_eq!(wd.opt_nurse_nums().get(Weekday::MON, ShiftId::new(0), SkillId::new(0)), 2);
    }
}

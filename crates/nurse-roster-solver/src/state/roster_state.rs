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

//! The live solution: the assignment grid plus every mirror the O(1) move
//! evaluation needs. `try_*` computes the exact objective delta of a move
//! without mutating anything (transactional evaluators restore state
//! before returning); `apply_*` mutates the grid and all mirrors, and the
//! caller folds the evaluated delta into the running objective through
//! [`RosterState::apply_move`].

use crate::search::moves::{ArStep, Move};
use crate::state::assign::AssignTable;
use crate::state::consec::Consecutive;
use nurse_roster_core::prelude::*;
use nurse_roster_model::prelude::*;
use smallvec::SmallVec;

#[inline]
fn wd(position: i64) -> Weekday {
    Weekday::new(position as usize)
}

#[derive(Debug, Clone)]
pub struct RosterState<'p> {
    problem: &'p RosterProblem,
    pen: PenaltyTable,
    assign: AssignTable,
    consec: Vec<Consecutive>,
    missing: NurseNumTable,
    total_assign: Vec<i64>,
    obj: ObjValue,
}

impl<'p> RosterState<'p> {
    pub fn new(problem: &'p RosterProblem) -> Self {
        let scenario = problem.scenario();
        let history = problem.history();
        let consec = scenario
            .nurse_ids()
            .map(|n| Consecutive::from_history(history, n))
            .collect();
        let mut state = Self {
            problem,
            pen: PenaltyTable::new(),
            assign: AssignTable::from_history(history),
            consec,
            missing: problem.week_data().opt_nurse_nums().clone(),
            total_assign: history.total_assign.clone(),
            obj: ObjValue::zero(),
        };
        state.evaluate_obj_value();
        state
    }

    /// Back to the all-off week; the penalty mode is kept.
    pub fn reset(&mut self) {
        let history = self.problem.history();
        self.assign = AssignTable::from_history(history);
        self.consec = self
            .problem
            .scenario()
            .nurse_ids()
            .map(|n| Consecutive::from_history(history, n))
            .collect();
        self.missing = self.problem.week_data().opt_nurse_nums().clone();
        self.total_assign = history.total_assign.clone();
        self.evaluate_obj_value();
    }

    #[inline]
    pub fn problem(&self) -> &'p RosterProblem {
        self.problem
    }

    #[inline]
    pub fn obj_value(&self) -> ObjValue {
        self.obj
    }

    #[inline]
    pub fn penalty_mode(&self) -> PenaltyMode {
        self.pen.mode()
    }

    pub fn set_repair_mode(&mut self) {
        self.pen.set_repair_mode();
        self.evaluate_obj_value();
    }

    pub fn set_default_mode(&mut self) {
        self.pen.set_default_mode();
        self.evaluate_obj_value();
    }

    #[inline]
    pub fn cell(&self, nurse: NurseId, day: Weekday) -> Option<ShiftSlot> {
        self.assign.cell(nurse, day)
    }

    #[inline]
    pub fn is_working(&self, nurse: NurseId, day: Weekday) -> bool {
        self.assign.is_working(nurse, day)
    }

    /// `opt - actual` for the slot; negative when over-covered.
    #[inline]
    pub fn missing_at(&self, day: Weekday, shift: ShiftId, skill: SkillId) -> i64 {
        self.missing.get(day, shift, skill)
    }

    #[inline]
    pub fn total_assign_of(&self, nurse: NurseId) -> i64 {
        self.total_assign[nurse.get()]
    }

    pub fn to_roster(&self) -> Roster {
        self.assign.to_roster()
    }

    pub fn load_roster(&mut self, roster: &Roster) {
        self.reset();
        for nurse in self.problem.scenario().nurse_ids() {
            for day in Weekday::week() {
                if let Some(slot) = roster.get(nurse, day) {
                    self.apply_add(day, nurse, slot);
                }
            }
        }
        self.evaluate_obj_value();
    }

    /// Recompute the objective from scratch; in repair mode the relaxed
    /// hard constraints contribute their finite weights.
    pub fn evaluate_obj_value(&mut self) {
        let roster = self.assign.to_roster();
        let mut obj = check_obj_value(self.problem, &roster);
        if self.pen.mode() == PenaltyMode::Repair {
            obj += self.pen.understaff().saturating_mul(self.below_min_total());
            obj += self
                .pen
                .succession()
                .saturating_mul(self.succession_pair_total());
        }
        self.obj = obj;
    }

    /// Units still missing below the hard staffing floor.
    fn below_min_total(&self) -> i64 {
        let scenario = self.problem.scenario();
        let week = self.problem.week_data();
        let mut total = 0;
        for day in Weekday::week() {
            for shift in scenario.shift_ids() {
                for skill in scenario.skill_ids() {
                    let actual =
                        week.opt_nurse_nums().get(day, shift, skill) - self.missing.get(day, shift, skill);
                    total += (week.min_nurse_nums().get(day, shift, skill) - actual).max(0);
                }
            }
        }
        total
    }

    /// Illegal working-day successions, counted once per adjacent pair.
    fn succession_pair_total(&self) -> i64 {
        let scenario = self.problem.scenario();
        let mut total = 0;
        for nurse in scenario.nurse_ids() {
            for day in Weekday::week() {
                if let Some(shift) = self.assign.shift_at(nurse, day) {
                    let prev = self.assign.shift_at(nurse, day.prev());
                    if !scenario.legal_succession(prev, shift) {
                        total += 1;
                    }
                }
            }
        }
        total
    }

    /// Hard defects the repair loop still has to clear.
    pub fn count_hard_defects(&self) -> i64 {
        self.below_min_total() + self.succession_pair_total()
    }

    /// Illegal pairs the cell (nurse, day) would take part in if it held
    /// `shift`.
    fn succession_violations(&self, nurse: NurseId, day: Weekday, shift: Option<ShiftId>) -> i64 {
        let Some(s) = shift else { return 0 };
        let scenario = self.problem.scenario();
        let mut violations = 0;
        if !scenario.legal_succession(self.assign.shift_at(nurse, day.prev()), s) {
            violations += 1;
        }
        if day != Weekday::SUN
            && let Some(next) = self.assign.shift_at(nurse, day.next())
            && !scenario.shift(s).can_precede(next)
        {
            violations += 1;
        }
        violations
    }

    /* ------------------------- try evaluators ------------------------- */

    pub fn try_add(&self, day: Weekday, nurse: NurseId, slot: ShiftSlot) -> ObjValue {
        self.try_add_impl(day, nurse, slot, false)
    }

    fn try_add_impl(
        &self,
        day: Weekday,
        nurse: NurseId,
        slot: ShiftSlot,
        relax_staffing: bool,
    ) -> ObjValue {
        debug_assert!(day != Weekday::HIS);
        let scenario = self.problem.scenario();
        let week = self.problem.week_data();
        if self.assign.is_working(nurse, day) {
            return FORBIDDEN_MOVE;
        }
        if !scenario.nurse(nurse).has_skill(slot.skill) {
            return FORBIDDEN_MOVE;
        }

        let mut delta = ObjValue::zero();

        let violations = self.succession_violations(nurse, day, Some(slot.shift));
        if violations > 0 {
            if self.pen.mode() == PenaltyMode::Default {
                return FORBIDDEN_MOVE;
            }
            delta += self.pen.succession().saturating_mul(violations);
        }

        let missing = self.missing.get(day, slot.shift, slot.skill);
        if missing > 0 {
            delta -= self.pen.insufficient_staff();
        }
        if self.pen.mode() == PenaltyMode::Repair && !relax_staffing {
            let actual = week.opt_nurse_nums().get(day, slot.shift, slot.skill) - missing;
            if actual < week.min_nurse_nums().get(day, slot.shift, slot.skill) {
                delta -= self.pen.understaff();
            }
        }

        delta += self.add_shift_run_delta(day, nurse, slot.shift);
        delta += self.add_day_run_delta(day, nurse);

        delta += self
            .pen
            .preference()
            .saturating_mul(week.shift_off(day, slot.shift, nurse));

        if day.is_weekend() {
            delta += self.weekend_delta(day, nurse, true);
        }
        delta += self.total_assign_delta(nurse, 1);

        delta
    }

    pub fn try_change(&self, day: Weekday, nurse: NurseId, slot: ShiftSlot) -> ObjValue {
        debug_assert!(day != Weekday::HIS);
        let scenario = self.problem.scenario();
        let week = self.problem.week_data();
        let Some(old) = self.assign.cell(nurse, day) else {
            return FORBIDDEN_MOVE;
        };
        if old == slot {
            return FORBIDDEN_MOVE;
        }
        if !scenario.nurse(nurse).has_skill(slot.skill) {
            return FORBIDDEN_MOVE;
        }

        let mut delta = ObjValue::zero();

        if slot.shift != old.shift {
            let new_violations = self.succession_violations(nurse, day, Some(slot.shift));
            if new_violations > 0 && self.pen.mode() == PenaltyMode::Default {
                return FORBIDDEN_MOVE;
            }
            if self.pen.mode() == PenaltyMode::Repair {
                let old_violations = self.succession_violations(nurse, day, Some(old.shift));
                delta += self
                    .pen
                    .succession()
                    .saturating_mul(new_violations - old_violations);
            }
        }

        // Vacating the old slot must not break its hard floor.
        let old_missing = self.missing.get(day, old.shift, old.skill);
        let old_actual = week.opt_nurse_nums().get(day, old.shift, old.skill) - old_missing;
        if old_actual <= week.min_nurse_nums().get(day, old.shift, old.skill) {
            if self.pen.mode() == PenaltyMode::Default {
                return FORBIDDEN_MOVE;
            }
            delta += self.pen.understaff();
        }

        let new_missing = self.missing.get(day, slot.shift, slot.skill);
        delta += self
            .pen
            .insufficient_staff()
            .saturating_mul(i64::from(old_missing >= 0));
        if new_missing > 0 {
            delta -= self.pen.insufficient_staff();
        }
        if self.pen.mode() == PenaltyMode::Repair {
            let new_actual = week.opt_nurse_nums().get(day, slot.shift, slot.skill) - new_missing;
            if new_actual < week.min_nurse_nums().get(day, slot.shift, slot.skill) {
                delta -= self.pen.understaff();
            }
        }

        if slot.shift != old.shift {
            delta += self.change_shift_run_delta(day, nurse, old.shift, slot.shift);
            delta += self
                .pen
                .preference()
                .saturating_mul(week.shift_off(day, slot.shift, nurse));
            delta -= self
                .pen
                .preference()
                .saturating_mul(week.shift_off(day, old.shift, nurse));
        }

        delta
    }

    pub fn try_remove(&self, day: Weekday, nurse: NurseId) -> ObjValue {
        self.try_remove_impl(day, nurse, false)
    }

    fn try_remove_impl(&self, day: Weekday, nurse: NurseId, relax_staffing: bool) -> ObjValue {
        debug_assert!(day != Weekday::HIS);
        let week = self.problem.week_data();
        let Some(old) = self.assign.cell(nurse, day) else {
            return FORBIDDEN_MOVE;
        };

        let mut delta = ObjValue::zero();

        let missing = self.missing.get(day, old.shift, old.skill);
        if !relax_staffing {
            let actual = week.opt_nurse_nums().get(day, old.shift, old.skill) - missing;
            if actual <= week.min_nurse_nums().get(day, old.shift, old.skill) {
                if self.pen.mode() == PenaltyMode::Default {
                    return FORBIDDEN_MOVE;
                }
                delta += self.pen.understaff();
            }
        }
        if self.pen.mode() == PenaltyMode::Repair {
            let violations = self.succession_violations(nurse, day, Some(old.shift));
            delta -= self.pen.succession().saturating_mul(violations);
        }

        delta += self
            .pen
            .insufficient_staff()
            .saturating_mul(i64::from(missing >= 0));

        delta += self.remove_shift_run_delta(day, nurse, old.shift);
        delta += self.remove_day_run_delta(day, nurse);

        delta -= self
            .pen
            .preference()
            .saturating_mul(week.shift_off(day, old.shift, nurse));

        if day.is_weekend() {
            delta += self.weekend_delta(day, nurse, false);
        }
        delta += self.total_assign_delta(nurse, -1);

        delta
    }

    /// Exchange the two cells on `day`. Evaluated transactionally: the
    /// state is bitwise restored before returning. Per-slot coverage is
    /// unchanged by a swap, so the staffing floor is bypassed on the
    /// component steps.
    pub fn try_swap(&mut self, day: Weekday, nurse: NurseId, nurse2: NurseId) -> ObjValue {
        if nurse == nurse2 {
            return FORBIDDEN_MOVE;
        }
        let scenario = self.problem.scenario();
        let c1 = self.assign.cell(nurse, day);
        let c2 = self.assign.cell(nurse2, day);
        if c1 == c2 {
            return FORBIDDEN_MOVE;
        }
        if let Some(slot) = c2
            && !scenario.nurse(nurse).has_skill(slot.skill)
        {
            return FORBIDDEN_MOVE;
        }
        if let Some(slot) = c1
            && !scenario.nurse(nurse2).has_skill(slot.skill)
        {
            return FORBIDDEN_MOVE;
        }

        let mut total = ObjValue::zero();
        let mut undo: SmallVec<[ArStep; 4]> = SmallVec::new();

        for (n, cell) in [(nurse, c1), (nurse2, c2)] {
            if let Some(slot) = cell {
                total += self.try_remove_impl(day, n, true);
                self.apply_remove(day, n);
                undo.push(ArStep::Add { day, nurse: n, slot });
            }
        }
        for (n, cell) in [(nurse, c2), (nurse2, c1)] {
            if let Some(slot) = cell {
                let d = self.try_add_impl(day, n, slot, true);
                if is_forbidden(d) {
                    self.undo_steps(&undo);
                    return FORBIDDEN_MOVE;
                }
                total += d;
                self.apply_add(day, n, slot);
                undo.push(ArStep::Remove { day, nurse: n });
            }
        }
        self.undo_steps(&undo);
        total
    }

    /* ------------------------- apply mutators ------------------------- */

    pub fn apply_add(&mut self, day: Weekday, nurse: NurseId, slot: ShiftSlot) {
        debug_assert!(!self.assign.is_working(nurse, day));
        self.update_consecutive(day, nurse, Some(slot.shift));
        self.missing.add(day, slot.shift, slot.skill, -1);
        self.total_assign[nurse.get()] += 1;
        self.assign.set(nurse, day, Some(slot));
    }

    pub fn apply_change(&mut self, day: Weekday, nurse: NurseId, slot: ShiftSlot) {
        let old = self.assign.cell(nurse, day);
        debug_assert!(old.is_some() && old != Some(slot));
        let old = old.expect("change needs a working cell");
        if slot.shift != old.shift {
            self.update_consecutive(day, nurse, Some(slot.shift));
        }
        self.missing.add(day, slot.shift, slot.skill, -1);
        self.missing.add(day, old.shift, old.skill, 1);
        self.assign.set(nurse, day, Some(slot));
    }

    pub fn apply_remove(&mut self, day: Weekday, nurse: NurseId) {
        let old = self.assign.cell(nurse, day);
        debug_assert!(old.is_some());
        let old = old.expect("remove needs a working cell");
        self.update_consecutive(day, nurse, None);
        self.missing.add(day, old.shift, old.skill, 1);
        self.total_assign[nurse.get()] -= 1;
        self.assign.set(nurse, day, None);
    }

    pub fn apply_swap(&mut self, day: Weekday, nurse: NurseId, nurse2: NurseId) {
        let c1 = self.assign.cell(nurse, day);
        let c2 = self.assign.cell(nurse2, day);
        debug_assert!(c1 != c2);
        if c1.is_some() {
            self.apply_remove(day, nurse);
        }
        if c2.is_some() {
            self.apply_remove(day, nurse2);
        }
        if let Some(slot) = c2 {
            self.apply_add(day, nurse, slot);
        }
        if let Some(slot) = c1 {
            self.apply_add(day, nurse2, slot);
        }
    }

    pub(crate) fn apply_step(&mut self, step: &ArStep) {
        match *step {
            ArStep::Add { day, nurse, slot } => self.apply_add(day, nurse, slot),
            ArStep::Remove { day, nurse } => self.apply_remove(day, nurse),
        }
    }

    /// Apply the recorded inverse operations in reverse order.
    pub(crate) fn undo_steps(&mut self, undo: &[ArStep]) {
        for step in undo.iter().rev() {
            self.apply_step(step);
        }
    }

    /// Apply an evaluated move and fold its delta into the objective.
    pub fn apply_move(&mut self, mv: &Move) {
        match *mv {
            Move::Add { day, nurse, slot, .. } => self.apply_add(day, nurse, slot),
            Move::Change { day, nurse, slot, .. } => self.apply_change(day, nurse, slot),
            Move::Remove { day, nurse, .. } => self.apply_remove(day, nurse),
            Move::Swap { day, nurse, nurse2, .. } => self.apply_swap(day, nurse, nurse2),
            Move::BlockSwap {
                nurse, nurse2, lo, hi, ..
            } => {
                for d in lo.index()..=hi.index() {
                    let day = Weekday::new(d);
                    if self.assign.cell(nurse, day) != self.assign.cell(nurse2, day) {
                        self.apply_swap(day, nurse, nurse2);
                    }
                }
            }
            Move::ArChain { ref steps, .. } => {
                for step in steps {
                    self.apply_step(step);
                }
            }
        }
        self.obj += mv.delta();
        #[cfg(debug_assertions)]
        self.assert_consistent();
    }

    fn update_consecutive(&mut self, day: Weekday, nurse: NurseId, new_shift: Option<ShiftId>) {
        let was_working = self.assign.is_working(nurse, day);
        let prev_same = new_shift == self.assign.shift_at(nurse, day.prev());
        let next_same = day != Weekday::SUN && new_shift == self.assign.shift_at(nurse, day.next());
        let c = &mut self.consec[nurse.get()];
        if was_working != new_shift.is_some() {
            c.update_day_block(day);
        }
        c.update_shift_block(day, next_same, prev_same);
    }

    /* --------------------- per-constraint deltas --------------------- */

    fn total_assign_delta(&self, nurse: NurseId, step: i64) -> ObjValue {
        let scenario = self.problem.scenario();
        let history = self.problem.history();
        let contract = scenario.contract_of(nurse);
        let total_weeks = scenario.total_week_num();
        let current_week = history.current_week();
        let lo = contract.min_assignments() * current_week;
        let hi = contract.max_assignments() * current_week;
        let cur = self.total_assign[nurse.get()];
        let mut delta = ObjValue::zero();
        delta -= self
            .pen
            .total_assign()
            .saturating_mul(distance_to_range(cur * total_weeks, lo, hi))
            .div_weeks(total_weeks);
        delta += self
            .pen
            .total_assign()
            .saturating_mul(distance_to_range((cur + step) * total_weeks, lo, hi))
            .div_weeks(total_weeks);
        delta
    }

    /// Complete-weekend and total-working-weekend terms of an add or
    /// remove on a weekend day; both fire only through the other weekend
    /// day's status.
    fn weekend_delta(&self, day: Weekday, nurse: NurseId, adding: bool) -> ObjValue {
        let scenario = self.problem.scenario();
        let history = self.problem.history();
        let contract = scenario.contract_of(nurse);
        let other = day.other_weekend_day();
        let other_working = self.assign.is_working(nurse, other);
        let mut delta = ObjValue::zero();

        if contract.complete_weekend() {
            let splits = other_working != adding;
            if splits {
                delta += self.pen.complete_weekend();
            } else {
                delta -= self.pen.complete_weekend();
            }
        }

        if !other_working {
            let total_weeks = scenario.total_week_num();
            let bound = contract.max_working_weekends() * history.current_week();
            let worked = history.total_working_weekend(nurse);
            let (before, after) = if adding { (worked, worked + 1) } else { (worked + 1, worked) };
            delta -= self
                .pen
                .total_working_weekend()
                .saturating_mul(exceed_count(before * total_weeks, bound))
                .div_weeks(total_weeks);
            delta += self
                .pen
                .total_working_weekend()
                .saturating_mul(exceed_count(after * total_weeks, bound))
                .div_weeks(total_weeks);
        }
        delta
    }

    /// Same-shift run terms of adding `shift` on an off day.
    fn add_shift_run_delta(&self, day: Weekday, nurse: NurseId, shift: ShiftId) -> ObjValue {
        let scenario = self.problem.scenario();
        let c = &self.consec[nurse.get()];
        let pen = self.pen.consecutive_shift();
        let new = scenario.shift(shift);
        let w = day.index() as i64;
        let prev_shift = self.assign.shift_at(nurse, day.prev());
        let mut delta = ObjValue::zero();

        if day == Weekday::SUN {
            if c.shift_low[7] == 7 && prev_shift == Some(shift) {
                let prev = scenario.shift(prev_shift.expect("checked working"));
                delta -= pen.saturating_mul(distance_to_range(
                    7 - c.shift_low[6],
                    prev.min_consecutive(),
                    prev.max_consecutive(),
                ));
                delta += pen.saturating_mul(exceed_count(7 - c.shift_low[6] + 1, new.max_consecutive()));
            } else {
                delta += pen.saturating_mul(exceed_count(1, new.max_consecutive()));
            }
            return delta;
        }

        let next_shift = self.assign.shift_at(nurse, day.next());
        if c.shift_high[day.index()] == c.shift_low[day.index()] {
            let mut high = w;
            let mut low = w;
            if prev_shift == Some(shift) {
                let prev = scenario.shift(shift);
                low = c.shift_low[day.prev().index()];
                delta -= pen.saturating_mul(distance_to_range(
                    w - c.shift_low[day.prev().index()],
                    prev.min_consecutive(),
                    prev.max_consecutive(),
                ));
            }
            if next_shift == Some(shift) {
                let next = scenario.shift(shift);
                high = c.shift_high[day.next().index()];
                delta -= pen.saturating_mul(penalty_day_num(
                    c.shift_high[day.next().index()] - w,
                    wd(c.shift_high[day.next().index()]),
                    next.min_consecutive(),
                    next.max_consecutive(),
                ));
            }
            delta += pen.saturating_mul(penalty_day_num(
                high - low + 1,
                wd(high),
                new.min_consecutive(),
                new.max_consecutive(),
            ));
        } else if w == c.shift_high[day.index()] {
            if next_shift == Some(shift) {
                let next = scenario.shift(shift);
                let run_next = c.shift_high[day.next().index()] - w;
                if run_next >= next.max_consecutive() {
                    delta += pen;
                } else if c.shift_high[day.next().index()] < 7 && run_next < next.min_consecutive() {
                    delta -= pen;
                }
            } else {
                delta += pen.saturating_mul(distance_to_range(
                    1,
                    new.min_consecutive(),
                    new.max_consecutive(),
                ));
            }
        } else if w == c.shift_low[day.index()] {
            if prev_shift == Some(shift) {
                let prev = scenario.shift(shift);
                let run_prev = w - c.shift_low[day.prev().index()];
                if run_prev >= prev.max_consecutive() {
                    delta += pen;
                } else if run_prev < prev.min_consecutive() {
                    delta -= pen;
                }
            } else {
                delta += pen.saturating_mul(distance_to_range(
                    1,
                    new.min_consecutive(),
                    new.max_consecutive(),
                ));
            }
        } else {
            delta += pen.saturating_mul(distance_to_range(
                1,
                new.min_consecutive(),
                new.max_consecutive(),
            ));
        }
        delta
    }

    /// Working/off run terms of adding on an off day.
    fn add_day_run_delta(&self, day: Weekday, nurse: NurseId) -> ObjValue {
        let contract = self.problem.scenario().contract_of(nurse);
        let c = &self.consec[nurse.get()];
        let pen_day = self.pen.consecutive_day();
        let pen_off = self.pen.consecutive_day_off();
        let (min_d, max_d) = (contract.min_consecutive_work(), contract.max_consecutive_work());
        let (min_o, max_o) = (contract.min_consecutive_off(), contract.max_consecutive_off());
        let w = day.index() as i64;
        let mut delta = ObjValue::zero();

        if day == Weekday::SUN {
            if c.day_low[7] == 7 {
                delta -= pen_day.saturating_mul(distance_to_range(7 - c.day_low[6], min_d, max_d));
                delta -= pen_off.saturating_mul(exceed_count(1, max_o));
                delta += pen_day.saturating_mul(exceed_count(7 - c.day_low[6] + 1, max_d));
            } else {
                delta -= pen_off.saturating_mul(exceed_count(7 - c.day_low[7] + 1, max_o));
                delta += pen_off.saturating_mul(distance_to_range(7 - c.day_low[7], min_o, max_o));
                delta += pen_day.saturating_mul(exceed_count(1, max_d));
            }
            return delta;
        }

        let prev = day.prev().index();
        let next = day.next().index();
        if c.day_high[day.index()] == c.day_low[day.index()] {
            delta -= pen_day.saturating_mul(distance_to_range(w - c.day_low[prev], min_d, max_d));
            delta -= pen_off.saturating_mul(distance_to_range(1, min_o, max_o));
            delta -= pen_day.saturating_mul(penalty_day_num(
                c.day_high[next] - w,
                wd(c.day_high[next]),
                min_d,
                max_d,
            ));
            delta += pen_day.saturating_mul(penalty_day_num(
                c.day_high[next] - c.day_low[prev] + 1,
                wd(c.day_high[next]),
                min_d,
                max_d,
            ));
        } else if w == c.day_high[day.index()] {
            let run_next = c.day_high[next] - w;
            if run_next >= max_d {
                delta += pen_day;
            } else if c.day_high[next] < 7 && run_next < min_d {
                delta -= pen_day;
            }
            let this_block = w - c.day_low[day.index()] + 1;
            if this_block > max_o {
                delta -= pen_off;
            } else if this_block <= min_o {
                delta += pen_off;
            }
        } else if w == c.day_low[day.index()] {
            let run_prev = w - c.day_low[prev];
            if run_prev >= max_d {
                delta += pen_day;
            } else if run_prev < min_d {
                delta -= pen_day;
            }
            let this_block = c.day_high[day.index()] - w + 1;
            if this_block > max_o {
                delta -= pen_off;
            } else if c.day_high[day.index()] < 7 && this_block <= min_o {
                delta += pen_off;
            }
        } else {
            delta -= pen_off.saturating_mul(penalty_day_num(
                c.day_high[day.index()] - c.day_low[day.index()] + 1,
                wd(c.day_high[day.index()]),
                min_o,
                max_o,
            ));
            delta += pen_off.saturating_mul(distance_to_range(w - c.day_low[day.index()], min_o, max_o));
            delta += pen_day.saturating_mul(distance_to_range(1, min_d, max_d));
            delta += pen_off.saturating_mul(penalty_day_num(
                c.day_high[day.index()] - w,
                wd(c.day_high[day.index()]),
                min_o,
                max_o,
            ));
        }
        delta
    }

    /// Same-shift run terms of replacing `old` with `new_shift` on a
    /// working day.
    fn change_shift_run_delta(
        &self,
        day: Weekday,
        nurse: NurseId,
        old_shift: ShiftId,
        new_shift: ShiftId,
    ) -> ObjValue {
        let scenario = self.problem.scenario();
        let c = &self.consec[nurse.get()];
        let pen = self.pen.consecutive_shift();
        let old = scenario.shift(old_shift);
        let new = scenario.shift(new_shift);
        let w = day.index() as i64;
        let prev_shift = self.assign.shift_at(nurse, day.prev());
        let mut delta = ObjValue::zero();

        if day == Weekday::SUN {
            if c.shift_low[7] == 7 {
                if prev_shift == Some(new_shift) {
                    let prev = scenario.shift(new_shift);
                    delta -= pen.saturating_mul(distance_to_range(
                        7 - c.shift_low[6],
                        prev.min_consecutive(),
                        prev.max_consecutive(),
                    ));
                    delta -= pen.saturating_mul(exceed_count(1, old.max_consecutive()));
                    delta += pen.saturating_mul(exceed_count(
                        7 - c.shift_low[6] + 1,
                        new.max_consecutive(),
                    ));
                } else {
                    delta -= pen.saturating_mul(exceed_count(1, old.max_consecutive()));
                    delta += pen.saturating_mul(exceed_count(1, new.max_consecutive()));
                }
            } else {
                let this_block = 7 - c.shift_low[7] + 1;
                if this_block > old.max_consecutive() {
                    delta -= pen;
                } else if this_block <= old.min_consecutive() {
                    delta += pen;
                }
                delta += pen.saturating_mul(exceed_count(1, new.max_consecutive()));
            }
            return delta;
        }

        let next_shift = self.assign.shift_at(nurse, day.next());
        let prev = day.prev().index();
        let next = day.next().index();
        if c.shift_high[day.index()] == c.shift_low[day.index()] {
            let mut high = w;
            let mut low = w;
            if prev_shift == Some(new_shift) {
                let prev_s = scenario.shift(new_shift);
                low = c.shift_low[prev];
                delta -= pen.saturating_mul(distance_to_range(
                    w - c.shift_low[prev],
                    prev_s.min_consecutive(),
                    prev_s.max_consecutive(),
                ));
            }
            if next_shift == Some(new_shift) {
                let next_s = scenario.shift(new_shift);
                high = c.shift_high[next];
                delta -= pen.saturating_mul(penalty_day_num(
                    c.shift_high[next] - w,
                    wd(c.shift_high[next]),
                    next_s.min_consecutive(),
                    next_s.max_consecutive(),
                ));
            }
            delta -= pen.saturating_mul(distance_to_range(
                1,
                old.min_consecutive(),
                old.max_consecutive(),
            ));
            delta += pen.saturating_mul(penalty_day_num(
                high - low + 1,
                wd(high),
                new.min_consecutive(),
                new.max_consecutive(),
            ));
        } else if w == c.shift_high[day.index()] {
            if next_shift == Some(new_shift) {
                let next_s = scenario.shift(new_shift);
                let run_next = c.shift_high[next] - w;
                if run_next >= next_s.max_consecutive() {
                    delta += pen;
                } else if c.shift_high[next] < 7 && run_next < next_s.min_consecutive() {
                    delta -= pen;
                }
            } else {
                delta += pen.saturating_mul(distance_to_range(
                    1,
                    new.min_consecutive(),
                    new.max_consecutive(),
                ));
            }
            let this_block = w - c.shift_low[day.index()] + 1;
            if this_block > old.max_consecutive() {
                delta -= pen;
            } else if this_block <= old.min_consecutive() {
                delta += pen;
            }
        } else if w == c.shift_low[day.index()] {
            if prev_shift == Some(new_shift) {
                let prev_s = scenario.shift(new_shift);
                let run_prev = w - c.shift_low[prev];
                if run_prev >= prev_s.max_consecutive() {
                    delta += pen;
                } else if run_prev < prev_s.min_consecutive() {
                    delta -= pen;
                }
            } else {
                delta += pen.saturating_mul(distance_to_range(
                    1,
                    new.min_consecutive(),
                    new.max_consecutive(),
                ));
            }
            let this_block = c.shift_high[day.index()] - w + 1;
            if this_block > old.max_consecutive() {
                delta -= pen;
            } else if c.shift_high[day.index()] < 7 && this_block <= old.min_consecutive() {
                delta += pen;
            }
        } else {
            delta -= pen.saturating_mul(penalty_day_num(
                c.shift_high[day.index()] - c.shift_low[day.index()] + 1,
                wd(c.shift_high[day.index()]),
                old.min_consecutive(),
                old.max_consecutive(),
            ));
            delta += pen.saturating_mul(distance_to_range(
                w - c.shift_low[day.index()],
                old.min_consecutive(),
                old.max_consecutive(),
            ));
            delta += pen.saturating_mul(distance_to_range(
                1,
                new.min_consecutive(),
                new.max_consecutive(),
            ));
            delta += pen.saturating_mul(penalty_day_num(
                c.shift_high[day.index()] - w,
                wd(c.shift_high[day.index()]),
                old.min_consecutive(),
                old.max_consecutive(),
            ));
        }
        delta
    }

    /// Same-shift run terms of clearing a working day.
    fn remove_shift_run_delta(&self, day: Weekday, nurse: NurseId, old_shift: ShiftId) -> ObjValue {
        let scenario = self.problem.scenario();
        let c = &self.consec[nurse.get()];
        let pen = self.pen.consecutive_shift();
        let old = scenario.shift(old_shift);
        let w = day.index() as i64;
        let mut delta = ObjValue::zero();

        if day == Weekday::SUN {
            if c.shift_low[7] == 7 {
                delta -= pen.saturating_mul(exceed_count(1, old.max_consecutive()));
            } else {
                delta -= pen.saturating_mul(exceed_count(
                    7 - c.shift_low[7] + 1,
                    old.max_consecutive(),
                ));
                delta += pen.saturating_mul(distance_to_range(
                    7 - c.shift_low[7],
                    old.min_consecutive(),
                    old.max_consecutive(),
                ));
            }
            return delta;
        }

        if c.shift_high[day.index()] == c.shift_low[day.index()] {
            delta -= pen.saturating_mul(distance_to_range(
                1,
                old.min_consecutive(),
                old.max_consecutive(),
            ));
        } else if w == c.shift_high[day.index()] {
            let this_block = w - c.shift_low[day.index()] + 1;
            if this_block > old.max_consecutive() {
                delta -= pen;
            } else if this_block <= old.min_consecutive() {
                delta += pen;
            }
        } else if w == c.shift_low[day.index()] {
            let this_block = c.shift_high[day.index()] - w + 1;
            if this_block > old.max_consecutive() {
                delta -= pen;
            } else if c.shift_high[day.index()] < 7 && this_block <= old.min_consecutive() {
                delta += pen;
            }
        } else {
            delta -= pen.saturating_mul(penalty_day_num(
                c.shift_high[day.index()] - c.shift_low[day.index()] + 1,
                wd(c.shift_high[day.index()]),
                old.min_consecutive(),
                old.max_consecutive(),
            ));
            delta += pen.saturating_mul(distance_to_range(
                w - c.shift_low[day.index()],
                old.min_consecutive(),
                old.max_consecutive(),
            ));
            delta += pen.saturating_mul(penalty_day_num(
                c.shift_high[day.index()] - w,
                wd(c.shift_high[day.index()]),
                old.min_consecutive(),
                old.max_consecutive(),
            ));
        }
        delta
    }

    /// Working/off run terms of clearing a working day.
    fn remove_day_run_delta(&self, day: Weekday, nurse: NurseId) -> ObjValue {
        let contract = self.problem.scenario().contract_of(nurse);
        let c = &self.consec[nurse.get()];
        let pen_day = self.pen.consecutive_day();
        let pen_off = self.pen.consecutive_day_off();
        let (min_d, max_d) = (contract.min_consecutive_work(), contract.max_consecutive_work());
        let (min_o, max_o) = (contract.min_consecutive_off(), contract.max_consecutive_off());
        let w = day.index() as i64;
        let mut delta = ObjValue::zero();

        if day == Weekday::SUN {
            if c.day_low[7] == 7 {
                delta -= pen_off.saturating_mul(distance_to_range(7 - c.day_low[6], min_o, max_o));
                delta -= pen_day.saturating_mul(exceed_count(1, max_d));
                delta += pen_off.saturating_mul(exceed_count(7 - c.day_low[6] + 1, max_o));
            } else {
                delta -= pen_day.saturating_mul(exceed_count(7 - c.day_low[7] + 1, max_d));
                delta += pen_day.saturating_mul(distance_to_range(7 - c.day_low[7], min_d, max_d));
                delta += pen_off.saturating_mul(exceed_count(1, max_o));
            }
            return delta;
        }

        let prev = day.prev().index();
        let next = day.next().index();
        if c.day_high[day.index()] == c.day_low[day.index()] {
            delta -= pen_off.saturating_mul(distance_to_range(w - c.day_low[prev], min_o, max_o));
            delta -= pen_day.saturating_mul(distance_to_range(1, min_d, max_d));
            delta -= pen_off.saturating_mul(penalty_day_num(
                c.day_high[next] - w,
                wd(c.day_high[next]),
                min_o,
                max_o,
            ));
            delta += pen_off.saturating_mul(penalty_day_num(
                c.day_high[next] - c.day_low[prev] + 1,
                wd(c.day_high[next]),
                min_o,
                max_o,
            ));
        } else if w == c.day_high[day.index()] {
            let run_next = c.day_high[next] - w;
            if run_next >= max_o {
                delta += pen_off;
            } else if c.day_high[next] < 7 && run_next < min_o {
                delta -= pen_off;
            }
            let this_block = w - c.day_low[day.index()] + 1;
            if this_block > max_d {
                delta -= pen_day;
            } else if this_block <= min_d {
                delta += pen_day;
            }
        } else if w == c.day_low[day.index()] {
            let run_prev = w - c.day_low[prev];
            if run_prev >= max_o {
                delta += pen_off;
            } else if run_prev < min_o {
                delta -= pen_off;
            }
            let this_block = c.day_high[day.index()] - w + 1;
            if this_block > max_d {
                delta -= pen_day;
            } else if c.day_high[day.index()] < 7 && this_block <= min_d {
                delta += pen_day;
            }
        } else {
            delta -= pen_day.saturating_mul(penalty_day_num(
                c.day_high[day.index()] - c.day_low[day.index()] + 1,
                wd(c.day_high[day.index()]),
                min_d,
                max_d,
            ));
            delta += pen_day.saturating_mul(distance_to_range(w - c.day_low[day.index()], min_d, max_d));
            delta += pen_off.saturating_mul(distance_to_range(1, min_o, max_o));
            delta += pen_day.saturating_mul(penalty_day_num(
                c.day_high[day.index()] - w,
                wd(c.day_high[day.index()]),
                min_d,
                max_d,
            ));
        }
        delta
    }

    /* ------------------------- week hand-over ------------------------- */

    /// The history the next week's solve starts from. The run bounds at
    /// Sunday already absorb this week's history through the extended low
    /// ends, so the counts need no extra bookkeeping.
    pub fn gen_history(&self) -> History {
        let scenario = self.problem.scenario();
        let history = self.problem.history();
        let mut next = History::initial(scenario.nurse_num());
        next.past_week_count = history.current_week();
        next.acc_obj_value = history.acc_obj_value + self.obj.value();
        next.total_assign = self.total_assign.clone();
        for nurse in scenario.nurse_ids() {
            let n = nurse.get();
            let worked_weekend = self.assign.is_working(nurse, Weekday::SAT)
                || self.assign.is_working(nurse, Weekday::SUN);
            next.total_working_weekend[n] =
                history.total_working_weekend(nurse) + i64::from(worked_weekend);
            let c = &self.consec[n];
            match self.assign.shift_at(nurse, Weekday::SUN) {
                Some(shift) => {
                    next.last_shift[n] = Some(shift);
                    next.consecutive_shift[n] = 7 - c.shift_low[7] + 1;
                    next.consecutive_work[n] = 7 - c.day_low[7] + 1;
                    next.consecutive_off[n] = 0;
                }
                None => {
                    next.last_shift[n] = None;
                    next.consecutive_shift[n] = 0;
                    next.consecutive_work[n] = 0;
                    next.consecutive_off[n] = 7 - c.day_low[7] + 1;
                }
            }
        }
        next
    }

    /* ------------------------- debug checking ------------------------- */

    #[cfg(any(test, debug_assertions))]
    fn rebuild_consec(&self, nurse: NurseId) -> Consecutive {
        let history = self.problem.history();
        let mut c = Consecutive::from_history(history, nurse);
        let mut row: [Option<ShiftId>; Weekday::SIZE] = [None; Weekday::SIZE];
        row[0] = history.last_shift(nurse);
        for day in Weekday::week() {
            if let Some(slot) = self.assign.cell(nurse, day) {
                let new = Some(slot.shift);
                c.update_day_block(day);
                let next_same = day != Weekday::SUN && new == row[day.index() + 1];
                let prev_same = new == row[day.index() - 1];
                c.update_shift_block(day, next_same, prev_same);
                row[day.index()] = new;
            }
        }
        c
    }

    /// Every mirror re-derived from the grid must equal the incremental
    /// bookkeeping; runs after each applied move in debug builds.
    #[cfg(any(test, debug_assertions))]
    pub fn assert_consistent(&self) {
        let scenario = self.problem.scenario();
        let history = self.problem.history();
        let roster = self.assign.to_roster();

        let nums = count_nurse_nums(scenario, &roster);
        for day in Weekday::week() {
            for shift in scenario.shift_ids() {
                for skill in scenario.skill_ids() {
                    let opt = self.problem.week_data().opt_nurse_nums().get(day, shift, skill);
                    assert_eq!(
                        self.missing.get(day, shift, skill),
                        opt - nums.get(day, shift, skill),
                        "missing-nurse mirror diverged at {day} {shift} {skill}"
                    );
                }
            }
        }

        for nurse in scenario.nurse_ids() {
            let worked: i64 = Weekday::week()
                .map(|d| i64::from(self.assign.is_working(nurse, d)))
                .sum();
            assert_eq!(
                self.total_assign[nurse.get()],
                history.total_assign(nurse) + worked,
                "total-assign mirror diverged for {nurse}"
            );
            assert_eq!(
                self.consec[nurse.get()],
                self.rebuild_consec(nurse),
                "consecutive index diverged for {nurse}"
            );
        }

        let mut expect = check_obj_value(self.problem, &roster);
        if self.pen.mode() == PenaltyMode::Repair {
            expect += self.pen.understaff().saturating_mul(self.below_min_total());
            expect += self
                .pen
                .succession()
                .saturating_mul(self.succession_pair_total());
        }
        assert_eq!(
            self.obj, expect,
            "incremental objective diverged from checkObjValue"
        );
    }
}

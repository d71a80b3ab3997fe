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

//! From-scratch feasibility and objective evaluation against the raw
//! input tables. `check_obj_value` is the authoritative objective
//! definition: the solver's incremental bookkeeping must agree with it
//! after every applied move.

use crate::common::{NurseId, ShiftId};
use crate::err::FeasibilityError;
use crate::problem::RosterProblem;
use crate::roster::Roster;
use crate::scenario::Scenario;
use crate::week::NurseNumTable;
use nurse_roster_core::prelude::*;

/// Nurses actually assigned per (day, shift, skill).
pub fn count_nurse_nums(scenario: &Scenario, roster: &Roster) -> NurseNumTable {
    let mut nums = NurseNumTable::new(scenario.shift_num(), scenario.skill_num());
    for nurse in scenario.nurse_ids() {
        for day in Weekday::week() {
            if let Some(slot) = roster.get(nurse, day) {
                nums.add(day, slot.shift, slot.skill, 1);
            }
        }
    }
    nums
}

/// H1 holds by construction (one cell per nurse and day); H2, H3 and H4
/// are checked against the raw tables.
pub fn check_feasibility(problem: &RosterProblem, roster: &Roster) -> Result<(), FeasibilityError> {
    let scenario = problem.scenario();
    let week = problem.week_data();
    let history = problem.history();

    // H2: hard staffing floor.
    let nums = count_nurse_nums(scenario, roster);
    for day in Weekday::week() {
        for shift in scenario.shift_ids() {
            for skill in scenario.skill_ids() {
                let have = nums.get(day, shift, skill);
                let need = week.min_nurse_nums().get(day, shift, skill);
                if have < need {
                    return Err(FeasibilityError::UnderStaffed {
                        day,
                        shift,
                        skill,
                        missing: need - have,
                    });
                }
            }
        }
    }

    // H3: legal successions, Monday checked against the history.
    for nurse in scenario.nurse_ids() {
        let mut prev = history.last_shift(nurse);
        for day in Weekday::week() {
            if let Some(slot) = roster.get(nurse, day) {
                if !scenario.legal_succession(prev, slot.shift) {
                    return Err(FeasibilityError::IllegalSuccession { nurse, day });
                }
                prev = Some(slot.shift);
            } else {
                prev = None;
            }
        }
    }

    // H4: owned skills only.
    for nurse in scenario.nurse_ids() {
        for day in Weekday::week() {
            if let Some(slot) = roster.get(nurse, day) {
                if !scenario.nurse(nurse).has_skill(slot.skill) {
                    return Err(FeasibilityError::MissingSkill {
                        nurse,
                        day,
                        skill: slot.skill,
                    });
                }
            }
        }
    }

    Ok(())
}

struct ConsecWalk {
    consecutive_shift: i64,
    consecutive_work: i64,
    consecutive_off: i64,
    shift_begin: bool,
    work_begin: bool,
    off_begin: bool,
}

impl ConsecWalk {
    fn start(problem: &RosterProblem, nurse: NurseId) -> Self {
        let history = problem.history();
        Self {
            consecutive_shift: history.consecutive_shift(nurse),
            consecutive_work: history.consecutive_work(nurse),
            consecutive_off: history.consecutive_off(nurse),
            shift_begin: history.consecutive_shift(nurse) != 0,
            work_begin: history.consecutive_work(nurse) != 0,
            off_begin: history.consecutive_off(nurse) != 0,
        }
    }
}

/// From-scratch objective evaluation.
///
/// S2/S3 are charged when a consecutive run closes; runs still open at
/// Sunday only pay their excess, because they may extend into the next
/// week. A run carried in from the history that already exceeded its
/// bound before Monday pays only for its in-week days (the excess before
/// Monday was charged by the previous solve).
pub fn check_obj_value(problem: &RosterProblem, roster: &Roster) -> ObjValue {
    let scenario = problem.scenario();
    let week = problem.week_data();
    let history = problem.history();
    let pen = PenaltyTable::default();
    let mut obj = ObjValue::zero();

    // S1: insufficient staffing for optimal coverage.
    let nums = count_nurse_nums(scenario, roster);
    for day in Weekday::week() {
        for shift in scenario.shift_ids() {
            for skill in scenario.skill_ids() {
                let missing = week.opt_nurse_nums().get(day, shift, skill) - nums.get(day, shift, skill);
                if missing > 0 {
                    obj += pen.insufficient_staff().saturating_mul(missing);
                }
            }
        }
    }

    // S2 + S3: consecutive shifts, working days and days off.
    for nurse in scenario.nurse_ids() {
        let contract = scenario.contract_of(nurse);
        let mut walk = ConsecWalk::start(problem, nurse);
        let mut last_shift = history.last_shift(nurse);

        for day in Weekday::week() {
            let cell = roster.get(nurse, day).map(|s| s.shift);
            step_consecutive(&mut obj, &pen, problem, nurse, day, last_shift, cell, &mut walk);
            last_shift = cell;
        }

        // The walk charges a run when it closes; finish the runs still
        // open after Sunday.
        if walk.off_begin && history.consecutive_off(nurse) > contract.max_consecutive_off() {
            obj += pen.consecutive_day_off().saturating_mul(Weekday::NUM as i64);
        } else if walk.consecutive_off > contract.max_consecutive_off() {
            obj += pen
                .consecutive_day_off()
                .saturating_mul(walk.consecutive_off - contract.max_consecutive_off());
        } else if walk.consecutive_off == 0 {
            // Sunday is a working day.
            let sun_shift = roster
                .get(nurse, Weekday::SUN)
                .map(|s| s.shift)
                .expect("open working run must cover Sunday");
            let max_shift = scenario.shift(sun_shift).max_consecutive();
            if walk.shift_begin && history.consecutive_shift(nurse) > max_shift {
                obj += pen.consecutive_shift().saturating_mul(Weekday::NUM as i64);
            } else if walk.consecutive_shift > max_shift {
                obj += pen
                    .consecutive_shift()
                    .saturating_mul(walk.consecutive_shift - max_shift);
            }
            if walk.work_begin && history.consecutive_work(nurse) > contract.max_consecutive_work() {
                obj += pen.consecutive_day().saturating_mul(Weekday::NUM as i64);
            } else if walk.consecutive_work > contract.max_consecutive_work() {
                obj += pen
                    .consecutive_day()
                    .saturating_mul(walk.consecutive_work - contract.max_consecutive_work());
            }
        }
    }

    // S4: preferences.
    for nurse in scenario.nurse_ids() {
        for day in Weekday::week() {
            if let Some(slot) = roster.get(nurse, day) {
                obj += pen
                    .preference()
                    .saturating_mul(week.shift_off(day, slot.shift, nurse));
            }
        }
    }

    // S5: complete weekends.
    for nurse in scenario.nurse_ids() {
        let contract = scenario.contract_of(nurse);
        if contract.complete_weekend()
            && roster.is_working(nurse, Weekday::SAT) != roster.is_working(nurse, Weekday::SUN)
        {
            obj += pen.complete_weekend();
        }
    }

    // S6 + S7: total assignments and working weekends, pro-rated over the
    // horizon; the share already charged for past weeks is removed.
    let total_weeks = scenario.total_week_num();
    let current_week = history.current_week();
    let past_weeks = history.past_week_count;
    for nurse in scenario.nurse_ids() {
        let contract = scenario.contract_of(nurse);
        let min = contract.min_assignments();
        let max = contract.max_assignments();

        let mut assign_num = history.total_assign(nurse);
        for day in Weekday::week() {
            assign_num += i64::from(roster.is_working(nurse, day));
        }
        obj += pen
            .total_assign()
            .saturating_mul(distance_to_range(
                assign_num * total_weeks,
                min * current_week,
                max * current_week,
            ))
            .div_weeks(total_weeks);

        let max_weekend = contract.max_working_weekends();
        let mut history_weekend = history.total_working_weekend(nurse) * total_weeks;
        let worked_weekend =
            roster.is_working(nurse, Weekday::SAT) || roster.is_working(nurse, Weekday::SUN);
        let exceeding =
            history_weekend - max_weekend * current_week + i64::from(worked_weekend) * total_weeks;
        if exceeding > 0 {
            obj += pen
                .total_working_weekend()
                .saturating_mul(exceeding)
                .div_weeks(total_weeks);
        }

        if past_weeks > 0 {
            obj -= pen
                .total_assign()
                .saturating_mul(distance_to_range(
                    history.total_assign(nurse) * total_weeks,
                    min * past_weeks,
                    max * past_weeks,
                ))
                .div_weeks(total_weeks);

            history_weekend -= max_weekend * past_weeks;
            if history_weekend > 0 {
                obj -= pen
                    .total_working_weekend()
                    .saturating_mul(history_weekend)
                    .div_weeks(total_weeks);
            }
        }
    }

    obj
}

#[allow(clippy::too_many_arguments)]
fn step_consecutive(
    obj: &mut ObjValue,
    pen: &PenaltyTable,
    problem: &RosterProblem,
    nurse: NurseId,
    day: Weekday,
    last_shift: Option<ShiftId>,
    cell: Option<ShiftId>,
    walk: &mut ConsecWalk,
) {
    let scenario = problem.scenario();
    let history = problem.history();
    let contract = scenario.contract_of(nurse);
    let in_week_days = (day.index() - 1) as i64;

    match cell {
        Some(shift) => {
            if walk.consecutive_work == 0 {
                // A day-off run ends here.
                if walk.off_begin
                    && history.consecutive_off(nurse) > contract.max_consecutive_off()
                {
                    *obj += pen.consecutive_day_off().saturating_mul(in_week_days);
                } else if walk.consecutive_off > 0 || walk.off_begin {
                    *obj += pen.consecutive_day_off().saturating_mul(distance_to_range(
                        walk.consecutive_off,
                        contract.min_consecutive_off(),
                        contract.max_consecutive_off(),
                    ));
                }
                walk.off_begin = false;
                walk.consecutive_off = 0;
                walk.consecutive_shift = 1;
            } else if Some(shift) == last_shift {
                walk.consecutive_shift += 1;
            } else {
                // Still working, but a same-shift run ends here.
                let last = scenario.shift(last_shift.expect("working run has a previous shift"));
                if walk.shift_begin && history.consecutive_shift(nurse) > last.max_consecutive() {
                    *obj += pen.consecutive_shift().saturating_mul(in_week_days);
                } else {
                    *obj += pen.consecutive_shift().saturating_mul(distance_to_range(
                        walk.consecutive_shift,
                        last.min_consecutive(),
                        last.max_consecutive(),
                    ));
                }
                walk.shift_begin = false;
                walk.consecutive_shift = 1;
            }
            walk.consecutive_work += 1;
        }
        None => {
            if walk.consecutive_off == 0 {
                // A working run ends here.
                if let Some(last) = last_shift {
                    let last = scenario.shift(last);
                    if walk.shift_begin
                        && history.consecutive_shift(nurse) > last.max_consecutive()
                    {
                        *obj += pen.consecutive_shift().saturating_mul(in_week_days);
                    } else {
                        *obj += pen.consecutive_shift().saturating_mul(distance_to_range(
                            walk.consecutive_shift,
                            last.min_consecutive(),
                            last.max_consecutive(),
                        ));
                    }
                    walk.shift_begin = false;
                }
                if walk.consecutive_work > 0 || walk.work_begin {
                    if walk.work_begin
                        && history.consecutive_work(nurse) > contract.max_consecutive_work()
                    {
                        *obj += pen.consecutive_day().saturating_mul(in_week_days);
                    } else {
                        *obj += pen.consecutive_day().saturating_mul(distance_to_range(
                            walk.consecutive_work,
                            contract.min_consecutive_work(),
                            contract.max_consecutive_work(),
                        ));
                    }
                    walk.work_begin = false;
                }
                walk.consecutive_shift = 0;
                walk.consecutive_work = 0;
            }
            walk.consecutive_off += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{NurseId, ShiftId, SkillId};
    use crate::history::History;
    use crate::roster::ShiftSlot;
    use crate::scenario::{ContractTerms, ScenarioBuilder};
    use crate::week::WeekData;

    fn terms(max_work: i64) -> ContractTerms {
        ContractTerms {
            min_assignments: 0,
            max_assignments: 35,
            min_consecutive_work: 1,
            max_consecutive_work: max_work,
            min_consecutive_off: 1,
            // Wide enough that a full rest week plus the history day stays
            // inside the bound.
            max_consecutive_off: 9,
            max_working_weekends: 4,
            complete_weekend: false,
        }
    }

    fn one_nurse_problem(max_work: i64) -> RosterProblem {
        let scenario = ScenarioBuilder::new("n001w4", 4)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract("FT", terms(max_work))
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap();
        let mut week = WeekData::new(1, 1, 1);
        for day in Weekday::week() {
            week.set_requirement(day, ShiftId::new(0), SkillId::new(0), 1, 1);
        }
        RosterProblem::new(scenario, week, History::initial(1)).unwrap()
    }

    fn full_week_roster() -> Roster {
        let mut roster = Roster::empty(1);
        for day in Weekday::week() {
            roster.set(
                NurseId::new(0),
                day,
                Some(ShiftSlot::new(ShiftId::new(0), SkillId::new(0))),
            );
        }
        roster
    }

    #[test]
    fn feasibility_flags_understaffing() {
        let problem = one_nurse_problem(7);
        let roster = Roster::empty(1);
        let err = check_feasibility(&problem, &roster).unwrap_err();
        assert!(matches!(err, FeasibilityError::UnderStaffed { .. }));
        assert!(check_feasibility(&problem, &full_week_roster()).is_ok());
    }

    #[test]
    fn feasibility_flags_missing_skill() {
        let scenario = ScenarioBuilder::new("n002w1", 1)
            .skill("HeadNurse")
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract("FT", terms(7))
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap();
        let week = WeekData::new(1, 2, 1);
        let problem = RosterProblem::new(scenario, week, History::initial(1)).unwrap();
        let mut roster = Roster::empty(1);
        roster.set(
            NurseId::new(0),
            Weekday::MON,
            Some(ShiftSlot::new(ShiftId::new(0), SkillId::new(0))),
        );
        let err = check_feasibility(&problem, &roster).unwrap_err();
        assert!(matches!(err, FeasibilityError::MissingSkill { .. }));
    }

    #[test]
    fn feasibility_checks_history_succession() {
        let scenario = ScenarioBuilder::new("n001w1", 1)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .shift("Night", 1, 7)
            .forbid_succession("Night", "Day")
            .contract("FT", terms(7))
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap();
        let week = WeekData::new(2, 1, 1);
        let mut history = History::initial(1);
        history.last_shift[0] = Some(ShiftId::new(1));
        history.consecutive_shift[0] = 1;
        history.consecutive_work[0] = 1;
        history.consecutive_off[0] = 0;
        let problem = RosterProblem::new(scenario, week, history).unwrap();
        let mut roster = Roster::empty(1);
        roster.set(
            NurseId::new(0),
            Weekday::MON,
            Some(ShiftSlot::new(ShiftId::new(0), SkillId::new(0))),
        );
        let err = check_feasibility(&problem, &roster).unwrap_err();
        assert!(matches!(
            err,
            FeasibilityError::IllegalSuccession {
                day: Weekday::MON,
                ..
            }
        ));
    }

    #[test]
    fn seven_day_run_pays_only_the_excess() {
        // One nurse, coverage forces all 7 days; only the consecutive-work
        // excess over max=3 is charged: 30 * (7 - 3) = 120 points.
        let problem = one_nurse_problem(3);
        let roster = full_week_roster();
        assert!(check_feasibility(&problem, &roster).is_ok());
        let obj = check_obj_value(&problem, &roster);
        assert_eq!(obj.value(), 30 * AMP * 4);
    }

    #[test]
    fn empty_roster_charges_coverage_only() {
        // Coverage misses all 7 optimal slots; the 7-day off run stays
        // open at Sunday and inside max_consecutive_off, so it is free.
        let problem = one_nurse_problem(3);
        let roster = Roster::empty(1);
        let obj = check_obj_value(&problem, &roster);
        assert_eq!(obj.value(), 30 * AMP * 7);
    }

    #[test]
    fn monday_continues_history_run() {
        // History: 2 consecutive days worked on "Day", max_consecutive_work=3.
        // Working Mon..Thu then off means the work run is 2+4=6 -> excess 3
        // ... but the pre-Monday part was already charged, so only the
        // in-week days above the bound pay: run closes Fri with length 6,
        // distance to [1,3] = 3.
        let scenario = ScenarioBuilder::new("n001w4", 4)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract("FT", terms(3))
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap();
        let week = WeekData::new(1, 1, 1);
        let mut history = History::initial(1);
        history.last_shift[0] = Some(ShiftId::new(0));
        history.consecutive_shift[0] = 2;
        history.consecutive_work[0] = 2;
        history.consecutive_off[0] = 0;
        let problem = RosterProblem::new(scenario, week, history).unwrap();

        let mut roster = Roster::empty(1);
        for day in [Weekday::MON, Weekday::TUE, Weekday::WED, Weekday::THU] {
            roster.set(
                NurseId::new(0),
                day,
                Some(ShiftSlot::new(ShiftId::new(0), SkillId::new(0))),
            );
        }
        let obj = check_obj_value(&problem, &roster);
        // Work run 2+4=6: distance to [1,3] = 3 -> 90. Same-shift run also
        // 6 vs [1,7] -> 0. Off run Fri..Sun open at Sunday -> 0.
        assert_eq!(obj.value(), 30 * AMP * 3);
    }

    #[test]
    fn complete_weekend_parity() {
        let scenario = ScenarioBuilder::new("n001w1", 1)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract(
                "FT",
                ContractTerms {
                    complete_weekend: true,
                    ..terms(7)
                },
            )
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap();
        let week = WeekData::new(1, 1, 1);
        let problem = RosterProblem::new(scenario, week, History::initial(1)).unwrap();

        let slot = ShiftSlot::new(ShiftId::new(0), SkillId::new(0));
        let mut sat_only = Roster::empty(1);
        sat_only.set(NurseId::new(0), Weekday::SAT, Some(slot));
        let mut both = sat_only.clone();
        both.set(NurseId::new(0), Weekday::SUN, Some(slot));

        let sat_obj = check_obj_value(&problem, &sat_only);
        let both_obj = check_obj_value(&problem, &both);
        // Only the half weekend pays the complete-weekend penalty.
        assert_eq!(sat_obj.value() - both_obj.value(), 30 * AMP);
    }

    #[test]
    fn total_assign_scales_by_week_denominator() {
        // W=4, current week 1, contract max 2 per horizon: working 3 days
        // exceeds by (3*4 - 2*1)/4 weeks -> 20 * 10 / 4 units.
        let scenario = ScenarioBuilder::new("n001w4", 4)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract(
                "FT",
                ContractTerms {
                    min_assignments: 0,
                    max_assignments: 2,
                    ..terms(7)
                },
            )
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap();
        let week = WeekData::new(1, 1, 1);
        let problem = RosterProblem::new(scenario, week, History::initial(1)).unwrap();
        let mut roster = Roster::empty(1);
        for day in [Weekday::MON, Weekday::TUE, Weekday::WED] {
            roster.set(
                NurseId::new(0),
                day,
                Some(ShiftSlot::new(ShiftId::new(0), SkillId::new(0))),
            );
        }
        let obj = check_obj_value(&problem, &roster);
        assert_eq!(obj.value(), 20 * AMP * (3 * 4 - 2) / 4);
    }
}

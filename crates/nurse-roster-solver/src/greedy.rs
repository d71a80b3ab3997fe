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

//! Greedy construction of a feasible starting assignment.
//!
//! Days are filled Mon..Sun. Per day, skills are served in descending
//! staffing pressure (hard demand over available owners), and each
//! minimum requirement is filled by an available nurse from the bucket
//! with the fewest total skills, so specialists are packed before
//! generalists. Ties fall to a uniform draw.

use crate::state::roster_state::RosterState;
use nurse_roster_core::prelude::Weekday;
use nurse_roster_model::prelude::*;
use rand::Rng;

pub struct GreedyInit<'p> {
    problem: &'p RosterProblem,
    /// `nurse_with_skill[skill][k]`: owners of `skill` holding `k + 1`
    /// skills in total.
    nurse_with_skill: Vec<Vec<Vec<NurseId>>>,
    nurse_num_of_skill: Vec<usize>,
}

impl<'p> GreedyInit<'p> {
    pub fn new(problem: &'p RosterProblem) -> Self {
        let scenario = problem.scenario();
        let mut nurse_with_skill = vec![Vec::new(); scenario.skill_num()];
        let mut nurse_num_of_skill = vec![0; scenario.skill_num()];
        for (nurse, data) in scenario.nurses() {
            let bucket = data.skill_count() - 1;
            for skill in data.skills() {
                let table: &mut Vec<Vec<NurseId>> = &mut nurse_with_skill[skill.get()];
                if table.len() <= bucket {
                    table.resize(bucket + 1, Vec::new());
                }
                table[bucket].push(nurse);
                nurse_num_of_skill[skill.get()] += 1;
            }
        }
        Self {
            problem,
            nurse_with_skill,
            nurse_num_of_skill,
        }
    }

    /// One construction pass; false when some requirement could not be
    /// filled. The state is left partially filled on failure, the caller
    /// resets before retrying.
    pub fn attempt<R: Rng>(&self, state: &mut RosterState<'_>, rng: &mut R) -> bool {
        let scenario = self.problem.scenario();
        let week = self.problem.week_data();

        for day in Weekday::week() {
            // Pressure of a skill today: hard demand per available owner.
            let mut rank: Vec<SkillId> = scenario.skill_ids().collect();
            let mut daily_load = vec![0.0f64; scenario.skill_num()];
            for skill in scenario.skill_ids() {
                let demand: i64 = scenario
                    .shift_ids()
                    .map(|shift| week.min_nurse_nums().get(day, shift, skill))
                    .sum();
                daily_load[skill.get()] = if self.nurse_num_of_skill[skill.get()] == 0 {
                    if demand > 0 { f64::INFINITY } else { 0.0 }
                } else {
                    demand as f64 / self.nurse_num_of_skill[skill.get()] as f64
                };
            }
            rank.sort_by(|a, b| {
                daily_load[b.get()]
                    .partial_cmp(&daily_load[a.get()])
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.get().cmp(&b.get()))
            });

            for skill in rank {
                let mut available = AvailableNurses::new(self, day, skill);
                for shift in scenario.shift_ids() {
                    available.set_shift(shift);
                    for _ in 0..week.min_nurse_nums().get(day, shift, skill) {
                        match available.pick(state, rng) {
                            Some(nurse) => {
                                state.apply_add(day, nurse, ShiftSlot::new(shift, skill));
                            }
                            None => {
                                tracing::debug!(
                                    "greedy: no nurse available for {day} {shift} {skill}"
                                );
                                return false;
                            }
                        }
                    }
                }
            }
        }
        state.evaluate_obj_value();
        true
    }

    /// Bounded restarts; leaves the last (possibly partial) attempt in
    /// the state when every attempt fails, for the repair loop to finish.
    pub fn build_initial<R: Rng>(
        &self,
        state: &mut RosterState<'_>,
        rng: &mut R,
        max_attempts: usize,
    ) -> bool {
        for attempt in 0..max_attempts.max(1) {
            state.reset();
            if self.attempt(state, rng) {
                return true;
            }
            tracing::debug!("greedy attempt {attempt} failed");
        }
        false
    }
}

/// Draw-down buckets of candidate nurses for one (day, skill)
/// environment, ordered by total skill count. Invalid picks are swapped
/// behind moving fences, so each candidate is tested at most once per
/// shift and rejected day-level candidates stay rejected for later
/// shifts of the same day.
struct AvailableNurses {
    day: Weekday,
    shift: ShiftId,
    buckets: Vec<Vec<NurseId>>,
    valid_for_shift: Vec<usize>,
    valid_for_day: Vec<usize>,
    min_skill_bucket: usize,
}

impl AvailableNurses {
    fn new(init: &GreedyInit<'_>, day: Weekday, skill: SkillId) -> Self {
        let buckets = init.nurse_with_skill[skill.get()].clone();
        let sizes: Vec<usize> = buckets.iter().map(Vec::len).collect();
        Self {
            day,
            shift: ShiftId::new(0),
            buckets,
            valid_for_shift: sizes.clone(),
            valid_for_day: sizes,
            min_skill_bucket: 0,
        }
    }

    fn set_shift(&mut self, shift: ShiftId) {
        self.shift = shift;
        self.min_skill_bucket = 0;
        self.valid_for_shift = self.valid_for_day.clone();
    }

    fn pick<R: Rng>(&mut self, state: &RosterState<'_>, rng: &mut R) -> Option<NurseId> {
        let scenario = state.problem().scenario();
        loop {
            while self.valid_for_shift[self.min_skill_bucket] == 0 {
                self.min_skill_bucket += 1;
                if self.min_skill_bucket == self.valid_for_shift.len() {
                    return None;
                }
            }
            let k = self.min_skill_bucket;
            loop {
                let i = rng.random_range(0..self.valid_for_shift[k]);
                let nurse = self.buckets[k][i];
                if state.is_working(nurse, self.day) {
                    // Out for the whole day.
                    self.valid_for_shift[k] -= 1;
                    self.buckets[k].swap(i, self.valid_for_shift[k]);
                    self.valid_for_day[k] -= 1;
                    self.buckets[k].swap(self.valid_for_shift[k], self.valid_for_day[k]);
                } else if scenario.legal_succession(
                    state.cell(nurse, self.day.prev()).map(|s| s.shift),
                    self.shift,
                ) {
                    self.valid_for_shift[k] -= 1;
                    self.buckets[k].swap(i, self.valid_for_shift[k]);
                    self.valid_for_day[k] -= 1;
                    self.buckets[k].swap(self.valid_for_shift[k], self.valid_for_day[k]);
                    return Some(nurse);
                } else {
                    // Out for this shift only.
                    self.valid_for_shift[k] -= 1;
                    self.buckets[k].swap(i, self.valid_for_shift[k]);
                }
                if self.valid_for_shift[k] == 0 {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn terms() -> ContractTerms {
        ContractTerms {
            min_assignments: 0,
            max_assignments: 35,
            min_consecutive_work: 1,
            max_consecutive_work: 7,
            min_consecutive_off: 1,
            max_consecutive_off: 9,
            max_working_weekends: 4,
            complete_weekend: false,
        }
    }

    fn problem() -> RosterProblem {
        let scenario = ScenarioBuilder::new("n004w4", 4)
            .skill("HeadNurse")
            .skill("Nurse")
            .shift("Early", 1, 7)
            .shift("Late", 1, 7)
            .contract("FT", terms())
            .nurse("Amy", "FT", &["HeadNurse", "Nurse"])
            .nurse("Ben", "FT", &["Nurse"])
            .nurse("Cal", "FT", &["Nurse"])
            .nurse("Deb", "FT", &["HeadNurse"])
            .build()
            .unwrap();
        let mut week = WeekData::new(2, 2, 4);
        for day in Weekday::week() {
            week.set_requirement(day, ShiftId::new(0), SkillId::new(0), 1, 1);
            week.set_requirement(day, ShiftId::new(0), SkillId::new(1), 1, 2);
            week.set_requirement(day, ShiftId::new(1), SkillId::new(1), 1, 1);
        }
        RosterProblem::new(scenario, week, History::initial(4)).unwrap()
    }

    #[test]
    fn construction_satisfies_hard_constraints() {
        let problem = problem();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let greedy = GreedyInit::new(&problem);
        assert!(greedy.build_initial(&mut state, &mut rng, 4));
        assert!(check_feasibility(&problem, &state.to_roster()).is_ok());
        state.assert_consistent();
    }

    #[test]
    fn specialists_are_packed_first() {
        // Deb is the only single-skill HeadNurse owner; the single
        // HeadNurse slot per day must never starve her bucket by handing
        // the slot to the generalist while Deb idles.
        let problem = problem();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let greedy = GreedyInit::new(&problem);
        assert!(greedy.build_initial(&mut state, &mut rng, 4));
        // Every day needs 3 Nurse-skill slots out of {Amy, Ben, Cal} plus
        // 1 HeadNurse slot; with Deb packed first they all fit.
        for day in Weekday::week() {
            assert!(state.is_working(NurseId::new(3), day) || state.is_working(NurseId::new(0), day));
        }
    }

    #[test]
    fn impossible_requirement_fails_all_attempts() {
        let scenario = ScenarioBuilder::new("n001w1", 1)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract("FT", terms())
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap();
        let mut week = WeekData::new(1, 1, 1);
        // Two nurses demanded, one exists.
        week.set_requirement(Weekday::MON, ShiftId::new(0), SkillId::new(0), 2, 2);
        let problem = RosterProblem::new(scenario, week, History::initial(1)).unwrap();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let greedy = GreedyInit::new(&problem);
        assert!(!greedy.build_initial(&mut state, &mut rng, 3));
        assert!(state.count_hard_defects() > 0);
    }
}

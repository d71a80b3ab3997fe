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

//! Best-move scans per neighborhood kind. Ties on the objective delta
//! fall to the move touching the more under-staffed slot, then to
//! reservoir sampling so equally good moves are picked uniformly.

use crate::engine::config::SolverConfig;
use crate::search::ar_chain;
use crate::search::block_swap;
use crate::search::moves::{Move, MoveMode};
use crate::search::tabu::TabuTables;
use crate::state::roster_state::RosterState;
use nurse_roster_core::prelude::*;
use nurse_roster_model::prelude::*;
use rand::Rng;

/// Tabu filtering for a scan: a move whose reversal is tabu is skipped
/// unless it would beat the global best by itself (aspiration).
#[derive(Debug, Clone, Copy)]
pub struct TabuContext<'t> {
    pub tables: &'t TabuTables,
    pub iter: u64,
    /// `global_best_obj - current_obj`; a tabu move with a smaller delta
    /// strictly improves the global best.
    pub aspiration: ObjValue,
}

impl TabuContext<'_> {
    #[inline]
    pub(crate) fn aspires(&self, delta: ObjValue) -> bool {
        delta < self.aspiration
    }
}

/// Best-of scan with (delta, slot-pressure, reservoir) ordering.
struct Picker<'r, R: Rng> {
    rng: &'r mut R,
    best: Option<Move>,
    best_delta: ObjValue,
    best_pressure: i64,
    ties: u32,
}

impl<'r, R: Rng> Picker<'r, R> {
    fn new(rng: &'r mut R) -> Self {
        Self {
            rng,
            best: None,
            best_delta: FORBIDDEN_MOVE,
            best_pressure: i64::MIN,
            ties: 0,
        }
    }

    fn offer(&mut self, mv: Move, pressure: i64) {
        let delta = mv.delta();
        if is_forbidden(delta) {
            return;
        }
        let better = delta < self.best_delta
            || (delta == self.best_delta && pressure > self.best_pressure);
        if better {
            self.best = Some(mv);
            self.best_delta = delta;
            self.best_pressure = pressure;
            self.ties = 1;
        } else if delta == self.best_delta && pressure == self.best_pressure {
            self.ties += 1;
            if self.rng.random_range(0..self.ties) == 0 {
                self.best = Some(mv);
            }
        }
    }

    fn into_best(self) -> Option<Move> {
        self.best
    }
}

/// Scan the neighborhood of `mode` and return its best admissible move.
pub fn find_best_move<R: Rng>(
    state: &mut RosterState<'_>,
    mode: MoveMode,
    rng: &mut R,
    tabu: Option<&TabuContext<'_>>,
    config: &SolverConfig,
) -> Option<Move> {
    match mode {
        MoveMode::Add => find_best_add(state, rng, tabu),
        MoveMode::Change => find_best_change(state, rng, tabu),
        MoveMode::Remove => find_best_remove(state, rng, tabu),
        MoveMode::Swap => find_best_swap(state, rng, tabu),
        MoveMode::BlockSwap => block_swap::find_best_block_swap(state, rng, tabu, config),
        MoveMode::ArLoop | MoveMode::ArRand | MoveMode::ArBoth => {
            ar_chain::find_best_ar_chain(state, mode, rng, config)
        }
    }
}

fn find_best_add<R: Rng>(
    state: &RosterState<'_>,
    rng: &mut R,
    tabu: Option<&TabuContext<'_>>,
) -> Option<Move> {
    let scenario = state.problem().scenario();
    let mut picker = Picker::new(rng);
    for day in Weekday::week() {
        for nurse in scenario.nurse_ids() {
            if state.is_working(nurse, day) {
                continue;
            }
            for shift in scenario.shift_ids() {
                for skill in scenario.nurse(nurse).skills() {
                    let slot = ShiftSlot::new(shift, skill);
                    let delta = state.try_add(day, nurse, slot);
                    if is_forbidden(delta) {
                        continue;
                    }
                    if let Some(t) = tabu
                        && t.tables.is_fill_tabu(t.iter, nurse, day, shift)
                        && !t.aspires(delta)
                    {
                        continue;
                    }
                    let pressure = state.missing_at(day, shift, skill);
                    picker.offer(Move::Add { day, nurse, slot, delta }, pressure);
                }
            }
        }
    }
    picker.into_best()
}

fn find_best_change<R: Rng>(
    state: &RosterState<'_>,
    rng: &mut R,
    tabu: Option<&TabuContext<'_>>,
) -> Option<Move> {
    let scenario = state.problem().scenario();
    let mut picker = Picker::new(rng);
    for day in Weekday::week() {
        for nurse in scenario.nurse_ids() {
            let Some(old) = state.cell(nurse, day) else {
                continue;
            };
            for shift in scenario.shift_ids() {
                for skill in scenario.nurse(nurse).skills() {
                    let slot = ShiftSlot::new(shift, skill);
                    if slot == old {
                        continue;
                    }
                    let delta = state.try_change(day, nurse, slot);
                    if is_forbidden(delta) {
                        continue;
                    }
                    if let Some(t) = tabu
                        && t.tables.is_fill_tabu(t.iter, nurse, day, shift)
                        && !t.aspires(delta)
                    {
                        continue;
                    }
                    let pressure =
                        state.missing_at(day, shift, skill) - state.missing_at(day, old.shift, old.skill);
                    picker.offer(Move::Change { day, nurse, slot, delta }, pressure);
                }
            }
        }
    }
    picker.into_best()
}

fn find_best_remove<R: Rng>(
    state: &RosterState<'_>,
    rng: &mut R,
    tabu: Option<&TabuContext<'_>>,
) -> Option<Move> {
    let scenario = state.problem().scenario();
    let mut picker = Picker::new(rng);
    for day in Weekday::week() {
        for nurse in scenario.nurse_ids() {
            let Some(old) = state.cell(nurse, day) else {
                continue;
            };
            let delta = state.try_remove(day, nurse);
            if is_forbidden(delta) {
                continue;
            }
            if let Some(t) = tabu
                && t.tables.is_remove_tabu(t.iter, nurse, day)
                && !t.aspires(delta)
            {
                continue;
            }
            // Prefer clearing the most over-covered slot.
            let pressure = -state.missing_at(day, old.shift, old.skill);
            picker.offer(Move::Remove { day, nurse, delta }, pressure);
        }
    }
    picker.into_best()
}

fn find_best_swap<R: Rng>(
    state: &mut RosterState<'_>,
    rng: &mut R,
    tabu: Option<&TabuContext<'_>>,
) -> Option<Move> {
    let nurse_num = state.problem().scenario().nurse_num();
    let mut picker = Picker::new(rng);
    for day in Weekday::week() {
        for n1 in 0..nurse_num {
            for n2 in (n1 + 1)..nurse_num {
                let nurse = NurseId::new(n1);
                let nurse2 = NurseId::new(n2);
                let delta = state.try_swap(day, nurse, nurse2);
                if is_forbidden(delta) {
                    continue;
                }
                if let Some(t) = tabu
                    && swap_is_tabu(state, t, day, nurse, nurse2)
                    && !t.aspires(delta)
                {
                    continue;
                }
                picker.offer(Move::Swap { day, nurse, nurse2, delta }, 0);
            }
        }
    }
    picker.into_best()
}

pub(crate) fn swap_is_tabu(
    state: &RosterState<'_>,
    t: &TabuContext<'_>,
    day: Weekday,
    nurse: NurseId,
    nurse2: NurseId,
) -> bool {
    let c1 = state.cell(nurse, day);
    let c2 = state.cell(nurse2, day);
    let first = match c2 {
        Some(slot) => t.tables.is_fill_tabu(t.iter, nurse, day, slot.shift),
        None => t.tables.is_remove_tabu(t.iter, nurse, day),
    };
    let second = match c1 {
        Some(slot) => t.tables.is_fill_tabu(t.iter, nurse2, day, slot.shift),
        None => t.tables.is_remove_tabu(t.iter, nurse2, day),
    };
    first || second
}

/// One uniformly random admissible elementary move, for walks and
/// perturbation kicks.
pub fn random_move<R: Rng>(state: &mut RosterState<'_>, rng: &mut R) -> Option<Move> {
    let scenario = state.problem().scenario();
    let day = Weekday::new(rng.random_range(1..Weekday::SIZE));
    let nurse = NurseId::new(rng.random_range(0..scenario.nurse_num()));
    let slot = ShiftSlot::new(
        ShiftId::new(rng.random_range(0..scenario.shift_num())),
        SkillId::new(rng.random_range(0..scenario.skill_num())),
    );
    let mv = match rng.random_range(0..4) {
        0 => Move::Add {
            day,
            nurse,
            slot,
            delta: state.try_add(day, nurse, slot),
        },
        1 => Move::Change {
            day,
            nurse,
            slot,
            delta: state.try_change(day, nurse, slot),
        },
        2 => Move::Remove {
            day,
            nurse,
            delta: state.try_remove(day, nurse),
        },
        _ => {
            let nurse2 = NurseId::new(rng.random_range(0..scenario.nurse_num()));
            Move::Swap {
                day,
                nurse,
                nurse2,
                delta: state.try_swap(day, nurse, nurse2),
            }
        }
    };
    (!is_forbidden(mv.delta())).then_some(mv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SolverConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn coverage_problem() -> RosterProblem {
        let scenario = ScenarioBuilder::new("n002w1", 1)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract(
                "FT",
                ContractTerms {
                    min_assignments: 0,
                    max_assignments: 7,
                    min_consecutive_work: 1,
                    max_consecutive_work: 7,
                    min_consecutive_off: 1,
                    max_consecutive_off: 9,
                    max_working_weekends: 1,
                    complete_weekend: false,
                },
            )
            .nurse("Amy", "FT", &["Nurse"])
            .nurse("Ben", "FT", &["Nurse"])
            .build()
            .unwrap();
        let mut week = WeekData::new(1, 1, 2);
        // Tuesday wants two nurses, the rest of the week one.
        for day in Weekday::week() {
            let opt = if day == Weekday::TUE { 2 } else { 1 };
            week.set_requirement(day, ShiftId::new(0), SkillId::new(0), 0, opt);
        }
        RosterProblem::new(scenario, week, History::initial(2)).unwrap()
    }

    #[test]
    fn add_prefers_the_most_understaffed_slot() {
        let problem = coverage_problem();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = SolverConfig::default();
        let mv = find_best_move(&mut state, MoveMode::Add, &mut rng, None, &config)
            .expect("an empty week always has an add");
        match mv {
            Move::Add { day, .. } => assert_eq!(day, Weekday::TUE),
            other => panic!("expected an add, got {other:?}"),
        }
    }

    #[test]
    fn descent_by_best_adds_reaches_full_coverage() {
        let problem = coverage_problem();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let config = SolverConfig::default();
        while let Some(mv) = find_best_move(&mut state, MoveMode::Add, &mut rng, None, &config) {
            if mv.delta() >= ObjValue::zero() {
                break;
            }
            state.apply_move(&mv);
        }
        // 8 useful slots in total; both nurses can cover 7 days each.
        assert_eq!(state.obj_value(), ObjValue::zero());
    }

    #[test]
    fn remove_respects_tabu_until_expiry() {
        let problem = coverage_problem();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let slot = ShiftSlot::new(ShiftId::new(0), SkillId::new(0));
        let delta = state.try_add(Weekday::TUE, NurseId::new(0), slot);
        state.apply_move(&Move::Add { day: Weekday::TUE, nurse: NurseId::new(0), slot, delta });

        let mut tables = TabuTables::new(
            2,
            1,
            &crate::search::tabu::TabuTenureCoefficient::day_default(),
            &crate::search::tabu::TabuTenureCoefficient::shift_default(),
        );
        tables.tabu_remove(1, &mut rng, NurseId::new(0), Weekday::TUE);
        let ctx = TabuContext {
            tables: &tables,
            iter: 2,
            aspiration: ObjValue::new(i64::MIN / 4),
        };
        // The only working cell is tabu to clear and nothing aspires.
        assert!(find_best_remove(&state, &mut rng, Some(&ctx)).is_none());
        let ctx_late = TabuContext {
            tables: &tables,
            iter: u64::MAX,
            ..ctx
        };
        assert!(find_best_remove(&state, &mut rng, Some(&ctx_late)).is_some());
    }
}

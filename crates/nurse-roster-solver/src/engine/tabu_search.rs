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

//! Tabu search: the inner descent applies the best admissible move of a
//! mode even when it worsens, forbids its reversal for a sampled tenure,
//! and lets aspiration override the tables on strict global improvement.
//! The outer shell is the same adaptive-kick loop as the iterated local
//! search.

use crate::engine::config::{BlockSwapTabuStrength, SolverConfig};
use crate::engine::ils::PerturbStrength;
use crate::engine::local::{SearchCounters, random_walk, update_optima};
use crate::output::Output;
use crate::search::finder::{TabuContext, find_best_move};
use crate::search::moves::{ArStep, Move, MoveMode};
use crate::search::tabu::TabuTables;
use crate::state::roster_state::RosterState;
use crate::timer::{Timer, is_check_iter};
use nurse_roster_core::prelude::Weekday;
use nurse_roster_model::prelude::{NurseId, ShiftId};
use rand::Rng;
use smallvec::SmallVec;

/// How the mode sequence is traversed per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabuTraversal {
    /// Cycle the sequence deterministically.
    Loop,
    /// Pick one mode uniformly.
    Rand,
    /// Pick one mode with weight proportional to its recent successes.
    Possibility,
}

/// The reverse cells an applied move writes into the tenure tables;
/// collected before the move mutates the grid.
enum TabuMark {
    Remove { nurse: NurseId, day: Weekday },
    Refill { nurse: NurseId, day: Weekday, shift: ShiftId },
}

fn swap_marks(
    state: &RosterState<'_>,
    day: Weekday,
    nurse: NurseId,
    nurse2: NurseId,
    out: &mut SmallVec<[TabuMark; 8]>,
) {
    for n in [nurse, nurse2] {
        match state.cell(n, day) {
            Some(slot) => out.push(TabuMark::Refill { nurse: n, day, shift: slot.shift }),
            // This side was off and becomes working: the reversal clears it.
            None => out.push(TabuMark::Remove { nurse: n, day }),
        }
    }
}

fn tabu_marks(
    state: &RosterState<'_>,
    mv: &Move,
    strength: BlockSwapTabuStrength,
) -> SmallVec<[TabuMark; 8]> {
    let mut marks: SmallVec<[TabuMark; 8]> = SmallVec::new();
    match *mv {
        Move::Add { day, nurse, .. } => marks.push(TabuMark::Remove { nurse, day }),
        Move::Remove { day, nurse, .. } | Move::Change { day, nurse, .. } => {
            if let Some(old) = state.cell(nurse, day) {
                marks.push(TabuMark::Refill { nurse, day, shift: old.shift });
            }
        }
        Move::Swap { day, nurse, nurse2, .. } => swap_marks(state, day, nurse, nurse2, &mut marks),
        Move::BlockSwap { nurse, nurse2, lo, hi, .. } => {
            let days = lo.index()..=hi.index();
            let selected: Vec<usize> = match strength {
                BlockSwapTabuStrength::Strong => days.collect(),
                BlockSwapTabuStrength::Average => days.step_by(2).collect(),
                BlockSwapTabuStrength::Weak => vec![lo.index()],
                BlockSwapTabuStrength::No => vec![],
            };
            for d in selected {
                let day = Weekday::new(d);
                if state.cell(nurse, day) != state.cell(nurse2, day) {
                    swap_marks(state, day, nurse, nurse2, &mut marks);
                }
            }
        }
        Move::ArChain { ref steps, .. } => {
            for (i, step) in steps.iter().enumerate() {
                match *step {
                    ArStep::Add { day, nurse, .. } => {
                        marks.push(TabuMark::Remove { nurse, day });
                    }
                    ArStep::Remove { day, nurse } => {
                        // The removed cell is either original or one the
                        // chain itself placed earlier.
                        let shift = steps[..i]
                            .iter()
                            .rev()
                            .find_map(|s| match *s {
                                ArStep::Add { day: d, nurse: n, slot } if d == day && n == nurse => {
                                    Some(slot.shift)
                                }
                                _ => None,
                            })
                            .or_else(|| state.cell(nurse, day).map(|s| s.shift));
                        if let Some(shift) = shift {
                            marks.push(TabuMark::Refill { nurse, day, shift });
                        }
                    }
                }
            }
        }
    }
    marks
}

struct ModeSelector {
    successes: Vec<u64>,
    cursor: usize,
}

impl ModeSelector {
    fn new(len: usize) -> Self {
        Self {
            successes: vec![0; len],
            cursor: 0,
        }
    }

    fn pick<R: Rng>(&mut self, traversal: TabuTraversal, rng: &mut R) -> usize {
        let len = self.successes.len();
        match traversal {
            TabuTraversal::Loop => {
                let i = self.cursor;
                self.cursor = (self.cursor + 1) % len;
                i
            }
            TabuTraversal::Rand => rng.random_range(0..len),
            TabuTraversal::Possibility => {
                let total: u64 = self.successes.iter().map(|s| 1 + s).sum();
                let mut ticket = rng.random_range(0..total);
                for (i, s) in self.successes.iter().enumerate() {
                    let w = 1 + s;
                    if ticket < w {
                        return i;
                    }
                    ticket -= w;
                }
                len - 1
            }
        }
    }

    fn reward(&mut self, mode_idx: usize) {
        self.successes[mode_idx] += 1;
    }
}

#[allow(clippy::too_many_arguments)]
fn tabu_descent<R: Rng>(
    state: &mut RosterState<'_>,
    timer: &Timer,
    rng: &mut R,
    config: &SolverConfig,
    tables: &mut TabuTables,
    traversal: TabuTraversal,
    optima: &mut Output,
    counters: &mut SearchCounters,
) {
    let modes = config.mode_seq.modes();
    let nurse_num = state.problem().scenario().nurse_num();
    let max_no_improve = config.max_no_improve_factor * (nurse_num * Weekday::NUM) as u64;
    let mut selector = ModeSelector::new(modes.len());
    let mut local_best = state.obj_value();
    let mut no_improve = 0u64;

    loop {
        if no_improve > max_no_improve {
            return;
        }
        if is_check_iter(counters.iter) && timer.is_time_out() {
            return;
        }
        counters.iter += 1;

        let mode_idx = selector.pick(traversal, rng);
        let mode: MoveMode = modes[mode_idx];
        let ctx = TabuContext {
            tables: &*tables,
            iter: counters.iter,
            aspiration: optima.obj_value() - state.obj_value(),
        };
        let Some(mv) = find_best_move(state, mode, rng, Some(&ctx), config) else {
            no_improve += 1;
            continue;
        };

        let marks = tabu_marks(state, &mv, config.block_swap_tabu_strength);
        state.apply_move(&mv);
        for mark in marks {
            match mark {
                TabuMark::Remove { nurse, day } => {
                    tables.tabu_remove(counters.iter, rng, nurse, day);
                }
                TabuMark::Refill { nurse, day, shift } => {
                    tables.tabu_refill(counters.iter, rng, nurse, day, shift);
                }
            }
        }

        if state.obj_value() < local_best {
            local_best = state.obj_value();
            no_improve = 0;
            selector.reward(mode_idx);
        } else {
            no_improve += 1;
        }
        update_optima(optima, state, timer);
    }
}

pub fn run<R: Rng>(
    state: &mut RosterState<'_>,
    timer: &Timer,
    rng: &mut R,
    config: &SolverConfig,
    traversal: TabuTraversal,
    optima: &mut Output,
    counters: &mut SearchCounters,
) {
    let scenario = state.problem().scenario();
    let mut tables = TabuTables::new(
        scenario.nurse_num(),
        scenario.shift_num(),
        &config.day_tenure_coefficient,
        &config.shift_tenure_coefficient,
    );
    let mut strength = PerturbStrength::new(config);
    let nurse_num = scenario.nurse_num();

    while !timer.is_time_out() {
        let best_before = optima.obj_value();
        tabu_descent(state, timer, rng, config, &mut tables, traversal, optima, counters);
        counters.generation += 1;

        let improved = optima.obj_value() < best_before;
        strength.on_round(improved);
        if timer.is_time_out() {
            break;
        }

        if rng.random::<f64>() < config.perturb_origin_select {
            let roster = optima.roster().clone();
            state.load_roster(&roster);
        }
        tables.clear();
        random_walk(state, timer, rng, strength.steps(nurse_num), optima, counters);
    }

    update_optima(optima, state, timer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use nurse_roster_core::prelude::ObjValue;
    use nurse_roster_model::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    #[test]
    fn mode_selector_cycles_and_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut sel = ModeSelector::new(3);
        assert_eq!(sel.pick(TabuTraversal::Loop, &mut rng), 0);
        assert_eq!(sel.pick(TabuTraversal::Loop, &mut rng), 1);
        assert_eq!(sel.pick(TabuTraversal::Loop, &mut rng), 2);
        assert_eq!(sel.pick(TabuTraversal::Loop, &mut rng), 0);

        // A heavily rewarded mode dominates the possibility draw.
        for _ in 0..500 {
            sel.reward(1);
        }
        let hits = (0..200)
            .filter(|_| sel.pick(TabuTraversal::Possibility, &mut rng) == 1)
            .count();
        assert!(hits > 150, "weighted pick hit only {hits}/200");
    }

    #[test]
    fn tabu_descent_matches_or_beats_descent_start() {
        let scenario = ScenarioBuilder::new("n003w1", 1)
            .skill("Nurse")
            .shift("Early", 1, 7)
            .shift("Late", 1, 7)
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
            .nurse("Cal", "FT", &["Nurse"])
            .build()
            .unwrap();
        let mut week = WeekData::new(2, 1, 3);
        for day in Weekday::week() {
            week.set_requirement(day, ShiftId::new(0), SkillId::new(0), 0, 2);
            week.set_requirement(day, ShiftId::new(1), SkillId::new(0), 0, 1);
        }
        let problem = RosterProblem::new(scenario, week, History::initial(3)).unwrap();

        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let config = SolverConfig::default().with_mode_seq(crate::engine::config::ModeSeq::Acsr);
        let timer = Timer::new(Duration::from_millis(300));
        let mut optima = Output::new(state.to_roster(), state.obj_value(), timer.elapsed());
        let mut counters = SearchCounters::default();
        let start = optima.obj_value();

        run(
            &mut state,
            &timer,
            &mut rng,
            &config,
            TabuTraversal::Rand,
            &mut optima,
            &mut counters,
        );
        assert!(optima.obj_value() <= start);
        assert_eq!(optima.obj_value(), ObjValue::zero());
        assert!(counters.generation >= 1);
    }
}

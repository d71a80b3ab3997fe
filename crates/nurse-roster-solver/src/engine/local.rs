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

//! Building blocks shared by the top-level strategies: greedy descent to
//! a local minimum over a mode sequence, the random-walk kick, and
//! best-so-far tracking.

use crate::engine::config::SolverConfig;
use crate::output::Output;
use crate::search::finder::{find_best_move, random_move};
use crate::search::moves::MoveMode;
use crate::state::roster_state::RosterState;
use crate::timer::{Timer, is_check_iter};
use nurse_roster_core::prelude::ObjValue;
use rand::Rng;

/// Per-solve progress counters, reported in the CSV result row.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchCounters {
    pub iter: u64,
    pub generation: u64,
}

/// Snapshot the state whenever it matches or beats the best so far;
/// returns true only on strict improvement.
pub(crate) fn update_optima(optima: &mut Output, state: &RosterState<'_>, timer: &Timer) -> bool {
    if state.obj_value() <= optima.obj_value() {
        let improved = state.obj_value() < optima.obj_value();
        *optima = Output::new(state.to_roster(), state.obj_value(), timer.elapsed());
        improved
    } else {
        false
    }
}

/// Descend with the best move of each mode in turn until no mode
/// improves; the classic inner loop of the iterated search.
pub(crate) fn local_search<R: Rng>(
    state: &mut RosterState<'_>,
    timer: &Timer,
    rng: &mut R,
    config: &SolverConfig,
    modes: &[MoveMode],
    optima: &mut Output,
    counters: &mut SearchCounters,
) {
    loop {
        let mut improved_any = false;
        for &mode in modes {
            if is_check_iter(counters.iter) && timer.is_time_out() {
                return;
            }
            counters.iter += 1;
            let Some(mv) = find_best_move(state, mode, rng, None, config) else {
                continue;
            };
            if mv.delta() < ObjValue::zero() {
                state.apply_move(&mv);
                update_optima(optima, state, timer);
                improved_any = true;
            }
        }
        if !improved_any {
            return;
        }
    }
}

/// Apply `steps` random admissible moves, never backtracking. Doubles as
/// the baseline strategy and as the perturbation kick.
pub(crate) fn random_walk<R: Rng>(
    state: &mut RosterState<'_>,
    timer: &Timer,
    rng: &mut R,
    steps: usize,
    optima: &mut Output,
    counters: &mut SearchCounters,
) {
    for _ in 0..steps {
        if is_check_iter(counters.iter) && timer.is_time_out() {
            return;
        }
        counters.iter += 1;
        if let Some(mv) = random_move(state, rng) {
            state.apply_move(&mv);
            update_optima(optima, state, timer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nurse_roster_model::prelude::*;
    use nurse_roster_core::prelude::Weekday;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    fn problem() -> RosterProblem {
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
        RosterProblem::new(scenario, week, History::initial(3)).unwrap()
    }

    #[test]
    fn local_search_reaches_zero_on_saturated_coverage() {
        let problem = problem();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = SolverConfig::default();
        let timer = Timer::new(Duration::from_secs(10));
        let mut optima = Output::new(state.to_roster(), state.obj_value(), timer.elapsed());
        let mut counters = SearchCounters::default();

        local_search(
            &mut state,
            &timer,
            &mut rng,
            &config,
            crate::engine::config::ModeSeq::Acsr.modes(),
            &mut optima,
            &mut counters,
        );
        // Three nurses cover 3 optimal slots per day without any soft
        // violation, so the descent must bottom out at zero.
        assert_eq!(optima.obj_value(), ObjValue::zero());
        assert!(counters.iter > 0);
    }

    #[test]
    fn random_walk_never_worsens_best() {
        let problem = problem();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let timer = Timer::new(Duration::from_secs(10));
        let mut optima = Output::new(state.to_roster(), state.obj_value(), timer.elapsed());
        let mut counters = SearchCounters::default();
        let start_best = optima.obj_value();

        random_walk(&mut state, &timer, &mut rng, 500, &mut optima, &mut counters);
        assert!(optima.obj_value() <= start_best);
        // The walk itself may end anywhere at or above the best.
        assert!(state.obj_value() >= optima.obj_value());
    }
}

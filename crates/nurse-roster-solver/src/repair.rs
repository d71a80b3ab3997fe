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

//! Feasibility repair after a failed construction.
//!
//! The penalty table switches to repair mode, which prices understaffing
//! and illegal successions with large finite weights instead of
//! forbidding them, so the search can walk through infeasible states.
//! Greedy descent interleaved with random kicks then drives the priced
//! defects to zero.

use crate::engine::config::SolverConfig;
use crate::err::SolveError;
use crate::search::finder::{find_best_move, random_move};
use crate::search::moves::MoveMode;
use crate::state::roster_state::RosterState;
use crate::timer::{Timer, is_check_iter};
use nurse_roster_core::prelude::{ObjValue, Weekday};
use rand::Rng;

const REPAIR_MODES: [MoveMode; 4] = [
    MoveMode::Add,
    MoveMode::Change,
    MoveMode::Swap,
    MoveMode::Remove,
];

pub fn repair<R: Rng>(
    state: &mut RosterState<'_>,
    timer: &Timer,
    rng: &mut R,
    config: &SolverConfig,
) -> Result<(), SolveError> {
    state.set_repair_mode();
    let nurse_num = state.problem().scenario().nurse_num();
    let kick = nurse_num * Weekday::NUM / 2 + 1;
    let mut iter = 0u64;

    let mut defects = state.count_hard_defects();
    tracing::debug!("repair: starting with {defects} hard defects");
    let mut best_defects = defects;
    let mut best_roster = state.to_roster();

    while defects > 0 && !timer.is_time_out() {
        // Descend while any mode still improves the priced objective.
        loop {
            if is_check_iter(iter) && timer.is_time_out() {
                break;
            }
            let mut improved = false;
            for mode in REPAIR_MODES {
                iter += 1;
                if let Some(mv) = find_best_move(state, mode, rng, None, config)
                    && mv.delta() < ObjValue::zero()
                {
                    state.apply_move(&mv);
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
        defects = state.count_hard_defects();
        if defects < best_defects {
            best_defects = defects;
            best_roster = state.to_roster();
        }
        if defects == 0 {
            break;
        }
        // Kick out of the local minimum and try again.
        for _ in 0..kick {
            iter += 1;
            if let Some(mv) = random_move(state, rng) {
                state.apply_move(&mv);
            }
        }
    }

    // Hand back the least-defective state seen, not whatever the last
    // kick left behind.
    if defects > best_defects {
        state.load_roster(&best_roster);
        defects = best_defects;
    }

    state.set_default_mode();
    if defects > 0 {
        tracing::warn!("repair: {defects} hard defects remain at the deadline");
        return Err(SolveError::Infeasible {
            hard_defects: defects,
        });
    }
    tracing::debug!("repair: feasible after {iter} iterations");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nurse_roster_core::prelude::Weekday;
    use nurse_roster_model::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

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

    #[test]
    fn repair_recovers_a_coverable_week() {
        let scenario = ScenarioBuilder::new("n002w1", 1)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract("FT", terms())
            .nurse("Amy", "FT", &["Nurse"])
            .nurse("Ben", "FT", &["Nurse"])
            .build()
            .unwrap();
        let mut week = WeekData::new(1, 1, 2);
        for day in Weekday::week() {
            week.set_requirement(day, ShiftId::new(0), SkillId::new(0), 1, 1);
        }
        let problem = RosterProblem::new(scenario, week, History::initial(2)).unwrap();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let timer = Timer::new(Duration::from_secs(5));
        let config = SolverConfig::default();

        // Empty week: 7 hard defects to clear.
        assert!(state.count_hard_defects() > 0);
        repair(&mut state, &timer, &mut rng, &config).unwrap();
        assert_eq!(state.count_hard_defects(), 0);
        assert!(check_feasibility(&problem, &state.to_roster()).is_ok());
        state.assert_consistent();
    }

    #[test]
    fn unrecoverable_demand_reports_remaining_defects() {
        let scenario = ScenarioBuilder::new("n001w1", 1)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract("FT", terms())
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap();
        let mut week = WeekData::new(1, 1, 1);
        week.set_requirement(Weekday::MON, ShiftId::new(0), SkillId::new(0), 3, 3);
        let problem = RosterProblem::new(scenario, week, History::initial(1)).unwrap();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let timer = Timer::new(Duration::from_millis(50));
        let config = SolverConfig::default();

        let err = repair(&mut state, &timer, &mut rng, &config).unwrap_err();
        match err {
            SolveError::Infeasible { hard_defects } => assert!(hard_defects >= 2),
        }
        // Best effort is kept and priced in default mode again.
        state.assert_consistent();
    }
}

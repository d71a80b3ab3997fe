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

//! The per-solve facade: construct, search, hand results over.

use crate::engine::config::{SolveAlgorithm, SolverConfig};
use crate::engine::local::{SearchCounters, random_walk, update_optima};
use crate::engine::tabu_search::TabuTraversal;
use crate::engine::{ils, tabu_search};
use crate::err::SolveError;
use crate::greedy::GreedyInit;
use crate::output::Output;
use crate::repair;
use crate::state::roster_state::RosterState;
use crate::timer::Timer;
use nurse_roster_core::prelude::Weekday;
use nurse_roster_model::prelude::{History, RosterProblem, check_feasibility, check_obj_value};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

pub struct RosterSolver<'p> {
    problem: &'p RosterProblem,
    config: SolverConfig,
    rng: ChaCha8Rng,
    state: RosterState<'p>,
    optima: Output,
    timer: Timer,
    counters: SearchCounters,
    algorithm_name: String,
    seed: u64,
    feasible: bool,
}

impl<'p> RosterSolver<'p> {
    pub fn new(problem: &'p RosterProblem, config: SolverConfig, seed: u64, budget: Duration) -> Self {
        let state = RosterState::new(problem);
        let timer = Timer::new(budget);
        let optima = Output::new(state.to_roster(), state.obj_value(), timer.elapsed());
        let algorithm_name = config.algorithm_name();
        Self {
            problem,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            state,
            optima,
            timer,
            counters: SearchCounters::default(),
            algorithm_name,
            seed,
            feasible: false,
        }
    }

    /// Produce the starting assignment: greedy with bounded restarts,
    /// then the repair loop if every restart fails. On an unrecoverable
    /// instance the best-effort assignment is kept and the error
    /// surfaces to the result row.
    pub fn init(&mut self) -> Result<(), SolveError> {
        let greedy = GreedyInit::new(self.problem);
        let nurse_num = self.problem.scenario().nurse_num();
        let attempts = (nurse_num / self.config.greedy_retry_divisor).max(1);
        self.algorithm_name = format!("{}[GreedyInit]", self.config.algorithm_name());

        if !greedy.build_initial(&mut self.state, &mut self.rng, attempts) {
            tracing::warn!("greedy failed {attempts} attempts, entering repair");
            self.algorithm_name.push_str("[Repair]");
            let outcome = repair::repair(&mut self.state, &self.timer, &mut self.rng, &self.config);
            self.snapshot_initial();
            let _ = outcome?;
        } else {
            self.snapshot_initial();
        }
        self.feasible = true;
        Ok(())
    }

    fn snapshot_initial(&mut self) {
        self.optima = Output::new(
            self.state.to_roster(),
            self.state.obj_value(),
            self.timer.elapsed(),
        );
    }

    /// Run the configured strategy until the deadline.
    pub fn solve(&mut self) {
        match self.config.algorithm {
            SolveAlgorithm::RandomWalk => {
                while !self.timer.is_time_out() {
                    let steps = self.problem.scenario().nurse_num() * Weekday::NUM;
                    random_walk(
                        &mut self.state,
                        &self.timer,
                        &mut self.rng,
                        steps,
                        &mut self.optima,
                        &mut self.counters,
                    );
                    self.counters.generation += 1;
                }
            }
            SolveAlgorithm::IteratedLocalSearch => ils::run(
                &mut self.state,
                &self.timer,
                &mut self.rng,
                &self.config,
                &mut self.optima,
                &mut self.counters,
            ),
            SolveAlgorithm::TabuSearchLoop => self.run_tabu(TabuTraversal::Loop),
            SolveAlgorithm::TabuSearchRand => self.run_tabu(TabuTraversal::Rand),
            SolveAlgorithm::TabuSearchPossibility => self.run_tabu(TabuTraversal::Possibility),
        }
        update_optima(&mut self.optima, &self.state, &self.timer);
        tracing::info!(
            "solve done: obj {}, {} iterations, {} generations",
            self.optima.obj_value(),
            self.counters.iter,
            self.counters.generation
        );
    }

    fn run_tabu(&mut self, traversal: TabuTraversal) {
        tabu_search::run(
            &mut self.state,
            &self.timer,
            &mut self.rng,
            &self.config,
            traversal,
            &mut self.optima,
            &mut self.counters,
        );
    }

    #[inline]
    pub fn optima(&self) -> &Output {
        &self.optima
    }

    #[inline]
    pub fn problem(&self) -> &'p RosterProblem {
        self.problem
    }

    #[inline]
    pub fn algorithm_name(&self) -> &str {
        &self.algorithm_name
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn iter_count(&self) -> u64 {
        self.counters.iter
    }

    #[inline]
    pub fn generation_count(&self) -> u64 {
        self.counters.generation
    }

    /// Whether a feasible assignment was reached during init; the best
    /// roster may still fail `check` on an unrecoverable instance.
    #[inline]
    pub fn feasible(&self) -> bool {
        self.feasible && check_feasibility(self.problem, self.optima.roster()).is_ok()
    }

    /// Re-derive the best objective from the raw tables; zero gap means
    /// the incremental bookkeeping and the authoritative evaluation
    /// agree.
    pub fn check_obj_gap(&self) -> i64 {
        check_obj_value(self.problem, self.optima.roster()).value() - self.optima.obj_value().value()
    }

    /// The history handed to next week's solve, derived from the best
    /// roster.
    pub fn gen_history(&self) -> History {
        let mut state = RosterState::new(self.problem);
        state.load_roster(self.optima.roster());
        state.gen_history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::ModeSeq;
    use nurse_roster_core::prelude::{AMP, ObjValue};
    use nurse_roster_model::prelude::*;

    fn terms(max_work: i64) -> ContractTerms {
        ContractTerms {
            min_assignments: 0,
            max_assignments: 28,
            min_consecutive_work: 1,
            max_consecutive_work: max_work,
            min_consecutive_off: 1,
            max_consecutive_off: 9,
            max_working_weekends: 4,
            complete_weekend: false,
        }
    }

    fn single_nurse_problem() -> RosterProblem {
        let scenario = ScenarioBuilder::new("n001w4", 4)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract("FT", terms(3))
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap();
        let mut week = WeekData::new(1, 1, 1);
        for day in Weekday::week() {
            week.set_requirement(day, ShiftId::new(0), SkillId::new(0), 1, 1);
        }
        RosterProblem::new(scenario, week, History::initial(1)).unwrap()
    }

    #[test]
    fn end_to_end_single_nurse_reaches_the_unique_optimum() {
        let problem = single_nurse_problem();
        let config = SolverConfig::default().with_mode_seq(ModeSeq::Acsr);
        let mut solver = RosterSolver::new(&problem, config, 42, Duration::from_millis(400));
        solver.init().unwrap();
        solver.solve();

        assert!(solver.feasible());
        assert_eq!(solver.check_obj_gap(), 0);
        // The only feasible roster works all 7 days: excess 4 over the
        // 3-day work bound.
        assert_eq!(solver.optima().obj_value(), ObjValue::new(30 * AMP * 4));
    }

    #[test]
    fn tabu_variants_solve_the_two_nurse_instance() {
        let scenario = ScenarioBuilder::new("n002w1", 1)
            .skill("HeadNurse")
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract("FT", terms(7))
            .nurse("Amy", "FT", &["HeadNurse"])
            .nurse("Ben", "FT", &["Nurse"])
            .build()
            .unwrap();
        let mut week = WeekData::new(1, 2, 2);
        for day in Weekday::week() {
            week.set_requirement(day, ShiftId::new(0), SkillId::new(0), 1, 1);
            week.set_requirement(day, ShiftId::new(0), SkillId::new(1), 1, 1);
        }
        let problem =
            RosterProblem::new(scenario, week, History::initial(2)).unwrap();

        for algorithm in [
            SolveAlgorithm::TabuSearchLoop,
            SolveAlgorithm::TabuSearchRand,
            SolveAlgorithm::TabuSearchPossibility,
        ] {
            let config = SolverConfig::default()
                .with_algorithm(algorithm)
                .with_mode_seq(ModeSeq::Acsr);
            let mut solver = RosterSolver::new(&problem, config, 7, Duration::from_millis(300));
            solver.init().unwrap();
            solver.solve();
            assert!(solver.feasible(), "{algorithm:?} lost feasibility");
            assert_eq!(
                solver.optima().obj_value(),
                ObjValue::zero(),
                "{algorithm:?} missed the unique optimum"
            );
            assert_eq!(solver.check_obj_gap(), 0);
        }
    }

    #[test]
    fn infeasible_instance_reports_error_and_keeps_best_effort() {
        let scenario = ScenarioBuilder::new("n001w1", 1)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract("FT", terms(7))
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap();
        let mut week = WeekData::new(1, 1, 1);
        week.set_requirement(Weekday::MON, ShiftId::new(0), SkillId::new(0), 2, 2);
        let problem = RosterProblem::new(scenario, week, History::initial(1)).unwrap();

        let config = SolverConfig::default();
        let mut solver = RosterSolver::new(&problem, config, 1, Duration::from_millis(100));
        let err = solver.init().unwrap_err();
        assert!(matches!(err, SolveError::Infeasible { hard_defects } if hard_defects > 0));
        assert!(!solver.feasible());
        // A best-effort roster is still available for the result row.
        assert!(solver.optima().roster().assigned_count() >= 1);
    }

    #[test]
    fn gen_history_follows_the_optima() {
        let problem = single_nurse_problem();
        let config = SolverConfig::default();
        let mut solver = RosterSolver::new(&problem, config, 3, Duration::from_millis(200));
        solver.init().unwrap();
        solver.solve();
        let next = solver.gen_history();
        assert_eq!(next.past_week_count, 1);
        assert_eq!(next.total_assign[0], 7);
        assert_eq!(next.last_shift[0], Some(ShiftId::new(0)));
        assert_eq!(next.consecutive_work[0], 7);
        assert_eq!(next.acc_obj_value, solver.optima().obj_value().value());
    }
}

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

//! Iterated local search: descend to a local minimum, kick with a random
//! walk whose length adapts to stagnation, repeat until the deadline.

use crate::engine::config::SolverConfig;
use crate::engine::local::{SearchCounters, local_search, random_walk, update_optima};
use crate::output::Output;
use crate::state::roster_state::RosterState;
use crate::timer::Timer;
use nurse_roster_core::prelude::Weekday;
use rand::Rng;

/// The adaptive kick size: grows by delta on every round that fails to
/// improve the global best, resets on improvement.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PerturbStrength {
    value: f64,
    init: f64,
    delta: f64,
    max: f64,
}

impl PerturbStrength {
    pub(crate) fn new(config: &SolverConfig) -> Self {
        Self {
            value: config.init_perturb_strength,
            init: config.init_perturb_strength,
            delta: config.perturb_strength_delta,
            max: config.max_perturb_strength,
        }
    }

    pub(crate) fn on_round(&mut self, improved_global: bool) {
        if improved_global {
            self.value = self.init;
        } else {
            self.value = (self.value + self.delta).min(self.max);
        }
    }

    pub(crate) fn steps(&self, nurse_num: usize) -> usize {
        (self.value * (nurse_num * Weekday::NUM) as f64).ceil() as usize
    }

    #[cfg(test)]
    pub(crate) fn value(&self) -> f64 {
        self.value
    }
}

pub fn run<R: Rng>(
    state: &mut RosterState<'_>,
    timer: &Timer,
    rng: &mut R,
    config: &SolverConfig,
    optima: &mut Output,
    counters: &mut SearchCounters,
) {
    let modes = config.mode_seq.modes();
    let nurse_num = state.problem().scenario().nurse_num();
    let mut strength = PerturbStrength::new(config);

    while !timer.is_time_out() {
        let best_before = optima.obj_value();
        local_search(state, timer, rng, config, modes, optima, counters);
        counters.generation += 1;

        let improved = optima.obj_value() < best_before;
        strength.on_round(improved);
        if timer.is_time_out() {
            break;
        }

        // Kick either the global best or the local optimum.
        if rng.random::<f64>() < config.perturb_origin_select {
            let roster = optima.roster().clone();
            state.load_roster(&roster);
        }
        random_walk(state, timer, rng, strength.steps(nurse_num), optima, counters);
    }

    update_optima(optima, state, timer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_grows_and_resets() {
        let config = SolverConfig::default();
        let mut s = PerturbStrength::new(&config);
        let initial = s.value();
        s.on_round(false);
        s.on_round(false);
        assert!(s.value() > initial);
        for _ in 0..100 {
            s.on_round(false);
        }
        assert!(s.value() <= config.max_perturb_strength + 1e-9);
        s.on_round(true);
        assert_eq!(s.value(), initial);
    }

    #[test]
    fn kick_scales_with_roster_size() {
        let config = SolverConfig::default();
        let s = PerturbStrength::new(&config);
        assert!(s.steps(10) >= 1);
        assert!(s.steps(40) > s.steps(10));
    }
}

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

//! Alternating add/remove chains.
//!
//! A chain starts at an under-staffed slot: the best nurse fills it, her
//! now-excessive workload may shed its worst other day, the shed slot can
//! open a new deficit to fill, and so on. Chains are evaluated on a
//! scoped transaction; the best prefix becomes the move. The `ArRand`
//! variant quick-restarts: it grows from a single random seed and stops
//! at the first net improvement. `ArBoth` grows a second head: the chain
//! keeps alternating even while the filling nurse is under her quota.

use crate::engine::config::SolverConfig;
use crate::search::moves::{ArStep, Move, MoveMode};
use crate::state::roster_state::RosterState;
use nurse_roster_core::prelude::*;
use nurse_roster_model::prelude::*;
use rand::Rng;
use smallvec::SmallVec;

type Seed = (Weekday, ShiftId, SkillId);

fn collect_seeds(state: &RosterState<'_>) -> Vec<Seed> {
    let scenario = state.problem().scenario();
    let mut seeds = Vec::new();
    for day in Weekday::week() {
        for shift in scenario.shift_ids() {
            for skill in scenario.skill_ids() {
                if state.missing_at(day, shift, skill) > 0 {
                    seeds.push((day, shift, skill));
                }
            }
        }
    }
    seeds
}

/// Best nurse to fill the slot, by delta with uniform tie-break.
fn best_fill<R: Rng>(
    state: &RosterState<'_>,
    seed: Seed,
    rng: &mut R,
) -> Option<(NurseId, ObjValue)> {
    let (day, shift, skill) = seed;
    let scenario = state.problem().scenario();
    let slot = ShiftSlot::new(shift, skill);
    let mut best: Option<(NurseId, ObjValue)> = None;
    let mut ties = 0u32;
    for nurse in scenario.nurse_ids() {
        if state.is_working(nurse, day) {
            continue;
        }
        let delta = state.try_add(day, nurse, slot);
        if is_forbidden(delta) {
            continue;
        }
        match &mut best {
            Some((_, d)) if delta > *d => {}
            Some((n, d)) if delta == *d => {
                ties += 1;
                if rng.random_range(0..ties) == 0 {
                    *n = nurse;
                }
            }
            _ => {
                best = Some((nurse, delta));
                ties = 1;
            }
        }
    }
    best
}

/// Best other working day of the nurse to shed.
fn best_shed<R: Rng>(
    state: &RosterState<'_>,
    nurse: NurseId,
    keep: Weekday,
    rng: &mut R,
) -> Option<(Weekday, ObjValue)> {
    let mut best: Option<(Weekday, ObjValue)> = None;
    let mut ties = 0u32;
    for day in Weekday::week() {
        if day == keep || !state.is_working(nurse, day) {
            continue;
        }
        let delta = state.try_remove(day, nurse);
        if is_forbidden(delta) {
            continue;
        }
        match &mut best {
            Some((_, d)) if delta > *d => {}
            Some((b, d)) if delta == *d => {
                ties += 1;
                if rng.random_range(0..ties) == 0 {
                    *b = day;
                }
            }
            _ => {
                best = Some((day, delta));
                ties = 1;
            }
        }
    }
    best
}

struct Chain {
    steps: SmallVec<[ArStep; 8]>,
    delta: ObjValue,
}

fn grow_chain<R: Rng>(
    state: &mut RosterState<'_>,
    seed: Seed,
    rng: &mut R,
    quick_restart: bool,
    double_head: bool,
    max_len: usize,
) -> Option<Chain> {
    let scenario = state.problem().scenario();
    let history = state.problem().history();
    let total_weeks = scenario.total_week_num();
    let current_week = history.current_week();

    let mut steps: SmallVec<[ArStep; 8]> = SmallVec::new();
    let mut undo: SmallVec<[ArStep; 8]> = SmallVec::new();
    let mut total = ObjValue::zero();
    let mut best: Option<(usize, ObjValue)> = None;
    let mut pending = Some(seed);

    'grow: while steps.len() < max_len {
        let Some(slot_seed) = pending.take() else {
            break;
        };
        let (day, shift, skill) = slot_seed;
        let Some((nurse, add_delta)) = best_fill(state, slot_seed, rng) else {
            break;
        };
        let slot = ShiftSlot::new(shift, skill);
        state.apply_add(day, nurse, slot);
        steps.push(ArStep::Add { day, nurse, slot });
        undo.push(ArStep::Remove { day, nurse });
        total += add_delta;
        if best.is_none_or(|(_, d)| total < d) {
            best = Some((steps.len(), total));
        }
        if quick_restart && total < ObjValue::zero() {
            break;
        }

        // Shed when the fill pushed the nurse over her pro-rata quota, or
        // unconditionally for the double-headed variant.
        let contract = scenario.contract_of(nurse);
        let over_quota = state.total_assign_of(nurse) * total_weeks
            > contract.max_assignments() * current_week;
        if !(over_quota || double_head) {
            break;
        }
        let Some((shed_day, remove_delta)) = best_shed(state, nurse, day, rng) else {
            break;
        };
        let shed_slot = state
            .cell(nurse, shed_day)
            .expect("shed day is working by construction");
        state.apply_remove(shed_day, nurse);
        steps.push(ArStep::Remove { day: shed_day, nurse });
        undo.push(ArStep::Add { day: shed_day, nurse, slot: shed_slot });
        total += remove_delta;
        if best.is_none_or(|(_, d)| total < d) {
            best = Some((steps.len(), total));
        }
        if quick_restart && total < ObjValue::zero() {
            break;
        }

        // Re-open the shed slot as the next head when it left a deficit.
        if state.missing_at(shed_day, shed_slot.shift, shed_slot.skill) > 0 {
            pending = Some((shed_day, shed_slot.shift, shed_slot.skill));
        } else {
            break 'grow;
        }
    }

    // Roll back, then keep only the best prefix.
    state.undo_steps(&undo);

    let (len, delta) = best?;
    steps.truncate(len);
    Some(Chain { steps, delta })
}

pub fn find_best_ar_chain<R: Rng>(
    state: &mut RosterState<'_>,
    mode: MoveMode,
    rng: &mut R,
    config: &SolverConfig,
) -> Option<Move> {
    let seeds = collect_seeds(state);
    if seeds.is_empty() {
        return None;
    }
    let max_len = config.ar_chain_max_len;

    let chains: Vec<Chain> = match mode {
        MoveMode::ArRand => {
            let seed = seeds[rng.random_range(0..seeds.len())];
            grow_chain(state, seed, rng, true, false, max_len)
                .into_iter()
                .collect()
        }
        MoveMode::ArLoop => seeds
            .iter()
            .take(config.ar_seed_limit)
            .filter_map(|&seed| grow_chain(state, seed, rng, false, false, max_len))
            .collect(),
        MoveMode::ArBoth => seeds
            .iter()
            .take(config.ar_seed_limit)
            .filter_map(|&seed| grow_chain(state, seed, rng, false, true, max_len))
            .collect(),
        _ => unreachable!("not an AR mode: {mode}"),
    };

    chains
        .into_iter()
        .min_by_key(|c| c.delta)
        .map(|c| Move::ArChain {
            mode,
            steps: c.steps,
            delta: c.delta,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn problem() -> RosterProblem {
        let scenario = ScenarioBuilder::new("n002w1", 1)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract(
                "Tight",
                ContractTerms {
                    min_assignments: 0,
                    // One assignment per nurse in a one-week horizon.
                    max_assignments: 1,
                    min_consecutive_work: 1,
                    max_consecutive_work: 7,
                    min_consecutive_off: 1,
                    max_consecutive_off: 9,
                    max_working_weekends: 1,
                    complete_weekend: false,
                },
            )
            .nurse("Amy", "Tight", &["Nurse"])
            .nurse("Ben", "Tight", &["Nurse"])
            .build()
            .unwrap();
        let mut week = WeekData::new(1, 1, 2);
        week.set_requirement(Weekday::MON, ShiftId::new(0), SkillId::new(0), 0, 1);
        week.set_requirement(Weekday::WED, ShiftId::new(0), SkillId::new(0), 0, 1);
        RosterProblem::new(scenario, week, History::initial(2)).unwrap()
    }

    #[test]
    fn chain_fills_deficits_and_rolls_back() {
        let problem = problem();
        let mut state = RosterState::new(&problem);
        let before = state.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let config = SolverConfig::default();

        let mv = find_best_ar_chain(&mut state, MoveMode::ArLoop, &mut rng, &config)
            .expect("two deficits must seed a chain");
        // Evaluation left no trace.
        assert_eq!(state.to_roster(), before.to_roster());
        assert_eq!(state.obj_value(), before.obj_value());

        assert!(mv.delta() < ObjValue::zero());
        state.apply_move(&mv);
        assert!(state.obj_value() < before.obj_value());
    }

    #[test]
    fn rand_variant_stops_at_first_improvement() {
        let problem = problem();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(29);
        let config = SolverConfig::default();
        let mv = find_best_ar_chain(&mut state, MoveMode::ArRand, &mut rng, &config).unwrap();
        match mv {
            Move::ArChain { ref steps, delta, .. } => {
                assert!(delta < ObjValue::zero());
                // Quick restart: a single add already improves.
                assert_eq!(steps.len(), 1);
            }
            other => panic!("expected a chain, got {other:?}"),
        }
    }

    #[test]
    fn no_deficit_means_no_chain() {
        let problem = problem();
        let mut state = RosterState::new(&problem);
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let config = SolverConfig::default();
        let slot = ShiftSlot::new(ShiftId::new(0), SkillId::new(0));
        for (n, day) in [(0usize, Weekday::MON), (1, Weekday::WED)] {
            let nurse = NurseId::new(n);
            let delta = state.try_add(day, nurse, slot);
            state.apply_move(&Move::Add { day, nurse, slot, delta });
        }
        assert!(find_best_ar_chain(&mut state, MoveMode::ArBoth, &mut rng, &config).is_none());
    }
}

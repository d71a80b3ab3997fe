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

//! Per-nurse index of maximal consecutive runs.
//!
//! Two pairs of arrays over the day slots 0..SIZE: `shift_low/high[d]`
//! bound the maximal run of identical shift values around `d`, and
//! `day_low/high[d]` bound the maximal run of identical working/off
//! status. Stored bounds are day positions; a run that continues the
//! previous week extends below slot 0, so `low` entries can be zero or
//! negative and `high - low + 1` counts history days automatically.

use nurse_roster_core::prelude::Weekday;
use nurse_roster_model::prelude::{History, NurseId};

const SIZE: usize = Weekday::SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consecutive {
    pub(crate) shift_low: [i64; SIZE],
    pub(crate) shift_high: [i64; SIZE],
    pub(crate) day_low: [i64; SIZE],
    pub(crate) day_high: [i64; SIZE],
}

impl Consecutive {
    /// Index for an all-off week on top of the given history.
    pub fn from_history(history: &History, nurse: NurseId) -> Self {
        let mon = Weekday::MON.index() as i64;
        let sun = Weekday::SUN.index() as i64;
        if history.is_working_last(nurse) {
            // Slot 0 is its own working block reaching back into the
            // previous week; Mon..Sun form one off block.
            let mut c = Self {
                shift_low: [mon; SIZE],
                shift_high: [sun; SIZE],
                day_low: [mon; SIZE],
                day_high: [sun; SIZE],
            };
            c.shift_high[0] = 0;
            c.shift_low[0] = 1 - history.consecutive_shift(nurse);
            c.day_high[0] = 0;
            c.day_low[0] = 1 - history.consecutive_work(nurse);
            c
        } else {
            // The whole row, slot 0 included, is one off block whose low
            // end absorbs the history's rest days.
            Self {
                shift_low: [1 - history.consecutive_shift(nurse); SIZE],
                shift_high: [sun; SIZE],
                day_low: [1 - history.consecutive_off(nurse); SIZE],
                day_high: [sun; SIZE],
            }
        }
    }

    /// True when Mon..Sun lie in a single same-shift run.
    #[inline]
    pub fn is_single_shift_block(&self) -> bool {
        self.shift_high[Weekday::MON.index()] == Weekday::SUN.index() as i64
    }

    /// True when Mon..Sun lie in a single working/off run.
    #[inline]
    pub fn is_single_day_block(&self) -> bool {
        self.day_high[Weekday::MON.index()] == Weekday::SUN.index() as i64
    }

    /// Re-index the working/off runs after the cell on `day` toggles
    /// status. A toggled cell always joins both neighbors' (new) status,
    /// so the only gate is whether a right neighbor exists.
    pub(crate) fn update_day_block(&mut self, day: Weekday) {
        let affect_right = day != Weekday::SUN;
        update_block(&mut self.day_high, &mut self.day_low, day.index(), affect_right, true);
    }

    /// Re-index the same-shift runs after the cell on `day` takes a new
    /// shift value; `affect_right`/`affect_left` say whether the new value
    /// equals the neighbor cell (day-off counts as a value of its own).
    pub(crate) fn update_shift_block(&mut self, day: Weekday, affect_right: bool, affect_left: bool) {
        update_block(
            &mut self.shift_high,
            &mut self.shift_low,
            day.index(),
            affect_right,
            affect_left,
        );
    }
}

fn update_block(high: &mut [i64; SIZE], low: &mut [i64; SIZE], w: usize, affect_right: bool, affect_left: bool) {
    let is_high = high[w] == w as i64;
    let is_low = low[w] == w as i64;
    match (is_high, is_low) {
        (true, true) => assign_single(w, high, low, affect_right, affect_left),
        (true, false) => assign_high(w, high, low, affect_right),
        (false, true) => assign_low(w, high, low, affect_left),
        (false, false) => assign_middle(w, high, low),
    }
}

/// The changed day closes the high end of its old run.
fn assign_high(w: usize, high: &mut [i64; SIZE], low: &mut [i64; SIZE], affect_right: bool) {
    let prev = w as i64 - 1;
    let mut d = prev;
    while d >= 0 && d >= low[w] {
        high[d as usize] = prev;
        d -= 1;
    }
    if affect_right {
        let next = w + 1;
        let merged_high = high[next];
        for dd in next..=merged_high as usize {
            low[dd] = w as i64;
        }
        high[w] = merged_high;
    } else {
        high[w] = w as i64;
    }
    low[w] = w as i64;
}

/// The changed day closes the low end of its old run.
fn assign_low(w: usize, high: &mut [i64; SIZE], low: &mut [i64; SIZE], affect_left: bool) {
    let next = w + 1;
    for dd in next..=high[w] as usize {
        low[dd] = next as i64;
    }
    if affect_left {
        let prev = w as i64 - 1;
        let merged_low = low[prev as usize];
        let mut d = prev;
        while d >= 0 && d >= merged_low {
            high[d as usize] = w as i64;
            d -= 1;
        }
        low[w] = merged_low;
    } else {
        low[w] = w as i64;
    }
    high[w] = w as i64;
}

/// The changed day splits the interior of its old run.
fn assign_middle(w: usize, high: &mut [i64; SIZE], low: &mut [i64; SIZE]) {
    let next = w + 1;
    for dd in next..=high[w] as usize {
        low[dd] = next as i64;
    }
    let prev = w as i64 - 1;
    let mut d = prev;
    while d >= 0 && d >= low[w] {
        high[d as usize] = prev;
        d -= 1;
    }
    high[w] = w as i64;
    low[w] = w as i64;
}

/// The changed day was a run of its own; it may merge into one or both
/// neighbor runs.
fn assign_single(
    w: usize,
    high: &mut [i64; SIZE],
    low: &mut [i64; SIZE],
    affect_right: bool,
    affect_left: bool,
) {
    let merged_high = if affect_right { high[w + 1] } else { w as i64 };
    let merged_low = if affect_left { low[w - 1] } else { w as i64 };
    if affect_right {
        for dd in (w + 1)..=high[w + 1] as usize {
            low[dd] = merged_low;
        }
        high[w] = merged_high;
    }
    if affect_left {
        let mut d = w as i64 - 1;
        while d >= 0 && d >= merged_low {
            high[d as usize] = merged_high;
            d -= 1;
        }
        low[w] = merged_low;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nurse_roster_model::prelude::ShiftId;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn his(last: Option<usize>, shift: i64, work: i64, off: i64) -> History {
        let mut h = History::initial(1);
        h.last_shift[0] = last.map(ShiftId::new);
        h.consecutive_shift[0] = shift;
        h.consecutive_work[0] = work;
        h.consecutive_off[0] = off;
        h
    }

    /// Mirror of the state-layer update sequencing, driven by a plain
    /// cell row so tests need no full solver state.
    fn apply(c: &mut Consecutive, cells: &mut [Option<usize>; SIZE], day: usize, new: Option<usize>) {
        assert!((1..SIZE).contains(&day));
        assert_ne!(cells[day], new, "no-op updates are the caller's bug");
        let w = Weekday::new(day);
        if cells[day].is_some() != new.is_some() {
            c.update_day_block(w);
        }
        let affect_right = day < 7 && new == cells[day + 1];
        let affect_left = new == cells[day - 1];
        c.update_shift_block(w, affect_right, affect_left);
        cells[day] = new;
    }

    /// Reference construction: start from the history index and append the
    /// final working cells in day order.
    fn rebuild(history: &History, cells: &[Option<usize>; SIZE]) -> Consecutive {
        let mut c = Consecutive::from_history(history, NurseId::new(0));
        let mut row: [Option<usize>; SIZE] = [None; SIZE];
        row[0] = cells[0];
        for day in 1..SIZE {
            if cells[day].is_some() {
                let val = cells[day];
                apply(&mut c, &mut row, day, val);
            }
        }
        c
    }

    fn row_from(history: &History) -> [Option<usize>; SIZE] {
        let mut row = [None; SIZE];
        row[0] = history.last_shift[0].map(|s| s.get());
        row
    }

    #[test]
    fn init_extends_into_history() {
        let h = his(Some(0), 3, 5, 0);
        let c = Consecutive::from_history(&h, NurseId::new(0));
        assert_eq!(c.shift_low[0], 1 - 3);
        assert_eq!(c.shift_high[0], 0);
        assert_eq!(c.day_low[0], 1 - 5);
        assert_eq!(c.day_high[0], 0);
        assert_eq!(c.day_low[1], 1);
        assert_eq!(c.day_high[1], 7);

        let h = his(None, 0, 0, 2);
        let c = Consecutive::from_history(&h, NurseId::new(0));
        assert_eq!(c.day_low[7], 1 - 2);
        assert_eq!(c.day_high[1], 7);
        assert!(c.is_single_day_block());
    }

    #[test]
    fn monday_merge_absorbs_history_run() {
        let h = his(Some(1), 2, 2, 0);
        let mut c = Consecutive::from_history(&h, NurseId::new(0));
        let mut row = row_from(&h);
        apply(&mut c, &mut row, 1, Some(1));
        // Same shift as the history: the Monday run counts 2 + 1 days.
        assert_eq!(c.shift_low[1], 1 - 2);
        assert_eq!(c.shift_high[1], 1);
        assert_eq!(c.day_low[1], 1 - 2);
        // The rest of the week is an off block starting Tue.
        assert_eq!(c.day_low[2], 2);
        assert_eq!(c.day_high[2], 7);
    }

    #[test]
    fn add_then_remove_restores_bitwise() {
        let h = his(Some(0), 2, 4, 0);
        let mut c = Consecutive::from_history(&h, NurseId::new(0));
        let before = c.clone();
        let mut row = row_from(&h);
        apply(&mut c, &mut row, 3, Some(0));
        assert_ne!(c, before);
        apply(&mut c, &mut row, 3, None);
        assert_eq!(c, before);
    }

    #[test]
    fn split_and_merge_update_all_members() {
        let h = his(None, 0, 0, 1);
        let mut c = Consecutive::from_history(&h, NurseId::new(0));
        let mut row = row_from(&h);
        // Build a Mon..Fri same-shift run.
        for day in 1..=5 {
            apply(&mut c, &mut row, day, Some(2));
        }
        assert_eq!((c.shift_low[3], c.shift_high[3]), (1, 5));
        assert_eq!((c.day_low[4], c.day_high[4]), (1, 5));
        // Knock out Wednesday: interior split.
        apply(&mut c, &mut row, 3, None);
        assert_eq!((c.shift_low[1], c.shift_high[1]), (1, 2));
        assert_eq!((c.shift_low[2], c.shift_high[2]), (1, 2));
        assert_eq!((c.shift_low[4], c.shift_high[4]), (4, 5));
        assert_eq!((c.day_low[3], c.day_high[3]), (3, 3));
        // Putting it back merges the three runs again.
        apply(&mut c, &mut row, 3, Some(2));
        assert_eq!((c.shift_low[2], c.shift_high[2]), (1, 5));
        assert_eq!((c.day_low[5], c.day_high[5]), (1, 5));
    }

    #[test]
    fn random_walk_matches_rebuild() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        for case in 0..200 {
            let h = match case % 3 {
                0 => his(None, 0, 0, 1 + case as i64 % 4),
                1 => his(Some(0), 1 + case as i64 % 3, 2, 0),
                _ => his(Some(1), 2, 4, 0),
            };
            let mut c = Consecutive::from_history(&h, NurseId::new(0));
            let mut row = row_from(&h);
            for _ in 0..24 {
                let day = rng.random_range(1..SIZE);
                let new = if rng.random_bool(0.4) {
                    None
                } else {
                    Some(rng.random_range(0..3usize))
                };
                if row[day] == new {
                    continue;
                }
                apply(&mut c, &mut row, day, new);
                // The index is a pure function of history + cells.
                let expect = rebuild(&h, &row);
                assert_eq!(c, expect, "case {case}, row {row:?}");
            }
        }
    }
}

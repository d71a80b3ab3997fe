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

//! Tenure tables forbidding the reversal of recent moves.
//!
//! Two keys: (nurse, day) in the day table blocks re-clearing a cell that
//! was just filled; (nurse, day, shift) in the shift table blocks putting
//! a just-cleared or just-replaced shift back. A table entry stores the
//! iteration until which the reverse move stays tabu; aspiration is the
//! caller's business.

use nurse_roster_core::prelude::Weekday;
use nurse_roster_model::prelude::{NurseId, ShiftId};
use rand::Rng;

pub const MIN_TABU_BASE: f64 = 6.0;
pub const TABU_BASE_TO_AMP: f64 = 4.0;

/// Multipliers applied to instance dimensions; a non-positive entry
/// leaves its factor out of the product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabuTenureCoefficient {
    pub table_size: f64,
    pub nurse_num: f64,
    pub day_num: f64,
    pub shift_num: f64,
}

impl TabuTenureCoefficient {
    /// The day-table default: tenure around half the nurse count.
    pub fn day_default() -> Self {
        Self {
            table_size: 0.0,
            nurse_num: 0.5,
            day_num: 0.0,
            shift_num: 0.0,
        }
    }

    /// The shift-table default: tenure around 0.8 of the nurse count.
    pub fn shift_default() -> Self {
        Self {
            table_size: 0.0,
            nurse_num: 0.8,
            day_num: 0.0,
            shift_num: 0.0,
        }
    }
}

/// Sampled tenure `base ± amp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabuTenure {
    base: u64,
    amp: u64,
}

impl TabuTenure {
    pub fn from_coefficient(
        coefficient: &TabuTenureCoefficient,
        nurse_num: usize,
        shift_num: usize,
    ) -> Self {
        let table_size = (nurse_num * Weekday::NUM * shift_num) as f64;
        let mut base = 1.0_f64;
        for (c, quantity) in [
            (coefficient.table_size, table_size),
            (coefficient.nurse_num, nurse_num as f64),
            (coefficient.day_num, Weekday::NUM as f64),
            (coefficient.shift_num, shift_num as f64),
        ] {
            if c > 0.0 {
                base *= c * quantity;
            }
        }
        let base = base.max(MIN_TABU_BASE);
        let amp = 1.0 + base / TABU_BASE_TO_AMP;
        Self {
            base: base as u64,
            amp: amp as u64,
        }
    }

    /// Expiry iteration for a move applied at `iter`.
    #[inline]
    pub fn sample<R: Rng>(&self, iter: u64, rng: &mut R) -> u64 {
        let lo = self.base.saturating_sub(self.amp);
        let hi = self.base + self.amp;
        iter + rng.random_range(lo..=hi)
    }

    #[inline]
    pub fn base(&self) -> u64 {
        self.base
    }

    #[inline]
    pub fn amp(&self) -> u64 {
        self.amp
    }
}

#[derive(Debug, Clone)]
pub struct TabuTables {
    nurse_num: usize,
    shift_num: usize,
    day_tenure: TabuTenure,
    shift_tenure: TabuTenure,
    day_table: Vec<u64>,
    shift_table: Vec<u64>,
}

impl TabuTables {
    pub fn new(
        nurse_num: usize,
        shift_num: usize,
        day_coefficient: &TabuTenureCoefficient,
        shift_coefficient: &TabuTenureCoefficient,
    ) -> Self {
        Self {
            nurse_num,
            shift_num,
            day_tenure: TabuTenure::from_coefficient(day_coefficient, nurse_num, shift_num),
            shift_tenure: TabuTenure::from_coefficient(shift_coefficient, nurse_num, shift_num),
            day_table: vec![0; nurse_num * Weekday::SIZE],
            shift_table: vec![0; nurse_num * Weekday::SIZE * shift_num],
        }
    }

    pub fn clear(&mut self) {
        self.day_table.fill(0);
        self.shift_table.fill(0);
    }

    #[inline]
    fn day_idx(&self, nurse: NurseId, day: Weekday) -> usize {
        nurse.get() * Weekday::SIZE + day.index()
    }

    #[inline]
    fn shift_idx(&self, nurse: NurseId, day: Weekday, shift: ShiftId) -> usize {
        (nurse.get() * Weekday::SIZE + day.index()) * self.shift_num + shift.get()
    }

    /// Forbid clearing (nurse, day) again; enqueued when an add fills it.
    pub fn tabu_remove<R: Rng>(&mut self, iter: u64, rng: &mut R, nurse: NurseId, day: Weekday) {
        let i = self.day_idx(nurse, day);
        self.day_table[i] = self.day_tenure.sample(iter, rng);
    }

    /// Forbid putting `shift` back onto (nurse, day); enqueued when a
    /// remove or change vacates it.
    pub fn tabu_refill<R: Rng>(
        &mut self,
        iter: u64,
        rng: &mut R,
        nurse: NurseId,
        day: Weekday,
        shift: ShiftId,
    ) {
        let i = self.shift_idx(nurse, day, shift);
        self.shift_table[i] = self.shift_tenure.sample(iter, rng);
    }

    #[inline]
    pub fn is_remove_tabu(&self, iter: u64, nurse: NurseId, day: Weekday) -> bool {
        self.day_table[self.day_idx(nurse, day)] >= iter
    }

    #[inline]
    pub fn is_fill_tabu(&self, iter: u64, nurse: NurseId, day: Weekday, shift: ShiftId) -> bool {
        self.shift_table[self.shift_idx(nurse, day, shift)] >= iter
    }

    #[inline]
    pub fn nurse_num(&self) -> usize {
        self.nurse_num
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn tenure_product_with_clamp() {
        let t = TabuTenure::from_coefficient(&TabuTenureCoefficient::day_default(), 30, 3);
        assert_eq!(t.base(), 15);
        assert_eq!(t.amp(), (1.0 + 15.0 / TABU_BASE_TO_AMP) as u64);

        // Tiny instances clamp to the minimum base.
        let t = TabuTenure::from_coefficient(&TabuTenureCoefficient::day_default(), 2, 1);
        assert_eq!(t.base(), MIN_TABU_BASE as u64);
    }

    #[test]
    fn sampled_expiry_in_band() {
        let t = TabuTenure::from_coefficient(&TabuTenureCoefficient::shift_default(), 20, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for iter in [0u64, 100, 10_000] {
            let e = t.sample(iter, &mut rng);
            assert!(e >= iter + t.base() - t.amp());
            assert!(e <= iter + t.base() + t.amp());
        }
    }

    #[test]
    fn tables_forbid_and_expire() {
        let mut tables = TabuTables::new(
            3,
            2,
            &TabuTenureCoefficient::day_default(),
            &TabuTenureCoefficient::shift_default(),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let nurse = NurseId::new(1);
        let day = Weekday::WED;
        let shift = ShiftId::new(1);

        assert!(!tables.is_remove_tabu(1, nurse, day));
        tables.tabu_remove(1, &mut rng, nurse, day);
        assert!(tables.is_remove_tabu(2, nurse, day));
        assert!(!tables.is_remove_tabu(u64::MAX, nurse, day));

        tables.tabu_refill(1, &mut rng, nurse, day, shift);
        assert!(tables.is_fill_tabu(2, nurse, day, shift));
        assert!(!tables.is_fill_tabu(2, nurse, day, ShiftId::new(0)));

        tables.clear();
        assert!(!tables.is_remove_tabu(2, nurse, day));
    }
}

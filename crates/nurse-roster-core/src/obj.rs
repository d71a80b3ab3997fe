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

use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Objective value in AMP-scaled penalty units.
///
/// All penalty weights carry the global AMP factor, so the `/ total_week_num`
/// terms of the total-assignment constraints stay exact in integer
/// arithmetic and secondary tie-breakers can use sub-unit fractions.
#[repr(transparent)]
#[must_use]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjValue(i64);

impl ObjValue {
    #[inline]
    pub const fn new(value: i64) -> Self {
        ObjValue(value)
    }

    #[inline]
    pub const fn zero() -> Self {
        ObjValue(0)
    }

    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn checked_add(self, rhs: ObjValue) -> Option<Self> {
        self.0.checked_add(rhs.0).map(ObjValue)
    }

    #[inline]
    pub fn saturating_add(self, rhs: ObjValue) -> Self {
        ObjValue(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_mul(self, factor: i64) -> Self {
        ObjValue(self.0.saturating_mul(factor))
    }

    /// Exact scaled division used by the per-week total-assignment terms.
    #[inline]
    pub const fn div_weeks(self, total_week_num: i64) -> Self {
        ObjValue(self.0 / total_week_num)
    }

    /// Value in unscaled penalty points (AMP divided out).
    #[inline]
    pub fn unscaled(self) -> f64 {
        self.0 as f64 / crate::penalty::AMP as f64
    }
}

impl std::fmt::Display for ObjValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Obj({})", self.0)
    }
}

impl Add for ObjValue {
    type Output = ObjValue;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        ObjValue(self.0 + rhs.0)
    }
}

impl AddAssign for ObjValue {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for ObjValue {
    type Output = ObjValue;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        ObjValue(self.0 - rhs.0)
    }
}

impl SubAssign for ObjValue {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for ObjValue {
    type Output = ObjValue;

    #[inline]
    fn neg(self) -> Self::Output {
        ObjValue(-self.0)
    }
}

impl Sum for ObjValue {
    fn sum<I: Iterator<Item = ObjValue>>(iter: I) -> Self {
        iter.fold(ObjValue::zero(), |acc, v| acc + v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(ObjValue: Send, Sync, Copy, Ord);

    #[test]
    fn arithmetic() {
        let a = ObjValue::new(30);
        let b = ObjValue::new(12);
        assert_eq!((a + b).value(), 42);
        assert_eq!((a - b).value(), 18);
        assert_eq!((-b).value(), -12);
        assert_eq!(a.saturating_mul(3).value(), 90);
        let mut c = a;
        c += b;
        c -= ObjValue::new(2);
        assert_eq!(c.value(), 40);
    }

    #[test]
    fn sum_and_div() {
        let total: ObjValue = [1, 2, 3, 4].into_iter().map(ObjValue::new).sum();
        assert_eq!(total.value(), 10);
        assert_eq!(ObjValue::new(10).div_weeks(4).value(), 2);
    }
}

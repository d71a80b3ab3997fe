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

use crate::weekday::Weekday;

/// How far `x` lies outside `[lo, hi]`.
#[inline]
pub const fn distance_to_range(x: i64, lo: i64, hi: i64) -> i64 {
    let below = if lo > x { lo - x } else { 0 };
    let above = if x > hi { x - hi } else { 0 };
    below + above
}

/// How far `x` exceeds `hi`.
#[inline]
pub const fn exceed_count(x: i64, hi: i64) -> i64 {
    if x > hi { x - hi } else { 0 }
}

/// How far `x` falls short of `lo`.
#[inline]
pub const fn absent_count(x: i64, lo: i64) -> i64 {
    if lo > x { lo - x } else { 0 }
}

/// Penalty units for a consecutive block of `block_len` days whose last day
/// is `block_high`. A block that ends on Sunday may still extend into the
/// next week, so only its excess above `max_c` is charged; any other block
/// is closed and charged its full distance to `[min_c, max_c]`.
#[inline]
pub fn penalty_day_num(block_len: i64, block_high: Weekday, min_c: i64, max_c: i64) -> i64 {
    if block_high == Weekday::SUN {
        exceed_count(block_len, max_c)
    } else {
        distance_to_range(block_len, min_c, max_c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance() {
        assert_eq!(distance_to_range(5, 2, 4), 1);
        assert_eq!(distance_to_range(1, 2, 4), 1);
        assert_eq!(distance_to_range(3, 2, 4), 0);
        assert_eq!(distance_to_range(0, 3, 3), 3);
    }

    #[test]
    fn exceed_and_absent() {
        assert_eq!(exceed_count(7, 3), 4);
        assert_eq!(exceed_count(3, 3), 0);
        assert_eq!(absent_count(1, 3), 2);
        assert_eq!(absent_count(4, 3), 0);
    }

    #[test]
    fn week_end_blocks_are_open() {
        // Short block ending on Sunday is not penalized, it may extend.
        assert_eq!(penalty_day_num(1, Weekday::SUN, 3, 5), 0);
        assert_eq!(penalty_day_num(6, Weekday::SUN, 3, 5), 1);
        // Closed block is charged on both sides of the range.
        assert_eq!(penalty_day_num(1, Weekday::WED, 3, 5), 2);
        assert_eq!(penalty_day_num(6, Weekday::WED, 3, 5), 1);
    }
}

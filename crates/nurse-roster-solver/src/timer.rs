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

use std::time::{Duration, Instant};

/// The inner loops poll the clock only when `iter & MASK == 0`; reading a
/// monotonic clock every iteration would dominate the cheap O(1) moves.
pub const CHECK_TIME_INTERVAL_MASK_IN_ITER: u64 = (1 << 10) - 1;

#[inline]
pub fn is_check_iter(iter: u64) -> bool {
    iter & CHECK_TIME_INTERVAL_MASK_IN_ITER == 0
}

/// Monotonic wall-clock deadline for one solve.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
    deadline: Instant,
}

impl Timer {
    pub fn new(budget: Duration) -> Self {
        let start = Instant::now();
        Self {
            start,
            deadline: start + budget,
        }
    }

    #[inline]
    pub fn is_time_out(&self) -> bool {
        Instant::now() >= self.deadline
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline]
    pub fn start(&self) -> Instant {
        self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_selects_every_1024th_iteration() {
        assert!(is_check_iter(0));
        assert!(!is_check_iter(1));
        assert!(!is_check_iter(1023));
        assert!(is_check_iter(1024));
        assert!(is_check_iter(2048));
    }

    #[test]
    fn zero_budget_times_out() {
        let timer = Timer::new(Duration::ZERO);
        assert!(timer.is_time_out());
    }
}

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

/// Day index inside one planning week.
///
/// Index 0 (`HIS`) is a sentinel column mirroring the last day of the
/// previous week, so succession and consecutive-block logic never needs a
/// special first-day path. Mon..Sun occupy 1..=7.
#[repr(transparent)]
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Weekday(usize);

impl Weekday {
    pub const HIS: Weekday = Weekday(0);
    pub const MON: Weekday = Weekday(1);
    pub const TUE: Weekday = Weekday(2);
    pub const WED: Weekday = Weekday(3);
    pub const THU: Weekday = Weekday(4);
    pub const FRI: Weekday = Weekday(5);
    pub const SAT: Weekday = Weekday(6);
    pub const SUN: Weekday = Weekday(7);

    /// Number of real days in a week.
    pub const NUM: usize = 7;
    /// Number of day slots including the history sentinel.
    pub const SIZE: usize = 8;

    const NAMES: [&'static str; Weekday::SIZE] =
        ["His", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

    #[inline]
    pub const fn new(index: usize) -> Self {
        debug_assert!(index < Self::SIZE);
        Weekday(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    #[inline]
    pub const fn prev(self) -> Weekday {
        debug_assert!(self.0 > 0);
        Weekday(self.0 - 1)
    }

    #[inline]
    pub const fn next(self) -> Weekday {
        debug_assert!(self.0 < Self::SIZE - 1);
        Weekday(self.0 + 1)
    }

    #[inline]
    pub const fn is_weekend(self) -> bool {
        self.0 >= Self::SAT.0
    }

    /// Sat for Sun and Sun for Sat.
    #[inline]
    pub const fn other_weekend_day(self) -> Weekday {
        debug_assert!(self.is_weekend());
        if self.0 == Self::SAT.0 { Self::SUN } else { Self::SAT }
    }

    /// Mon..=Sun.
    #[inline]
    pub fn week() -> impl Iterator<Item = Weekday> {
        (Self::MON.0..=Self::SUN.0).map(Weekday)
    }

    pub fn from_name(name: &str) -> Option<Weekday> {
        Self::NAMES
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .filter(|&i| i != Self::HIS.0)
            .map(Weekday)
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        Self::NAMES[self.0]
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_iterates_mon_to_sun() {
        let days: Vec<Weekday> = Weekday::week().collect();
        assert_eq!(days.len(), Weekday::NUM);
        assert_eq!(days[0], Weekday::MON);
        assert_eq!(days[6], Weekday::SUN);
    }

    #[test]
    fn neighbors() {
        assert_eq!(Weekday::MON.prev(), Weekday::HIS);
        assert_eq!(Weekday::SAT.next(), Weekday::SUN);
        assert_eq!(Weekday::SAT.other_weekend_day(), Weekday::SUN);
        assert_eq!(Weekday::SUN.other_weekend_day(), Weekday::SAT);
    }

    #[test]
    fn parses_names() {
        assert_eq!(Weekday::from_name("Tue"), Some(Weekday::TUE));
        assert_eq!(Weekday::from_name("sun"), Some(Weekday::SUN));
        assert_eq!(Weekday::from_name("His"), None);
        assert_eq!(Weekday::from_name("Noday"), None);
    }
}

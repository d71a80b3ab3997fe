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

use nurse_roster_core::prelude::ObjValue;
use nurse_roster_model::prelude::Roster;
use std::time::Duration;

/// Snapshot of the best solution seen so far: the exported roster, its
/// objective, and when (since solve start) it was found.
#[derive(Debug, Clone)]
pub struct Output {
    roster: Roster,
    obj: ObjValue,
    find_time: Duration,
}

impl Output {
    pub fn new(roster: Roster, obj: ObjValue, find_time: Duration) -> Self {
        Self {
            roster,
            obj,
            find_time,
        }
    }

    #[inline]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    #[inline]
    pub fn obj_value(&self) -> ObjValue {
        self.obj
    }

    #[inline]
    pub fn find_time(&self) -> Duration {
        self.find_time
    }
}

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

use nurse_roster_core::prelude::{ObjValue, Weekday};
use nurse_roster_model::prelude::{NurseId, ShiftSlot};
use smallvec::SmallVec;

/// Tags for the neighborhood kinds a mode sequence can list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveMode {
    Add,
    Change,
    Remove,
    Swap,
    BlockSwap,
    ArLoop,
    ArRand,
    ArBoth,
}

impl MoveMode {
    pub const fn name(self) -> &'static str {
        match self {
            MoveMode::Add => "Add",
            MoveMode::Change => "Change",
            MoveMode::Remove => "Remove",
            MoveMode::Swap => "Swap",
            MoveMode::BlockSwap => "BlockSwap",
            MoveMode::ArLoop => "ARLoop",
            MoveMode::ArRand => "ARRand",
            MoveMode::ArBoth => "ARBoth",
        }
    }
}

impl std::fmt::Display for MoveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One atomic step of a composite move; also the undo record of the
/// transactional evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArStep {
    Add {
        day: Weekday,
        nurse: NurseId,
        slot: ShiftSlot,
    },
    Remove {
        day: Weekday,
        nurse: NurseId,
    },
}

/// An evaluated candidate move; `delta` is the exact objective change the
/// matching apply will cause.
#[derive(Debug, Clone, PartialEq)]
pub enum Move {
    Add {
        day: Weekday,
        nurse: NurseId,
        slot: ShiftSlot,
        delta: ObjValue,
    },
    Change {
        day: Weekday,
        nurse: NurseId,
        slot: ShiftSlot,
        delta: ObjValue,
    },
    Remove {
        day: Weekday,
        nurse: NurseId,
        delta: ObjValue,
    },
    Swap {
        day: Weekday,
        nurse: NurseId,
        nurse2: NurseId,
        delta: ObjValue,
    },
    BlockSwap {
        nurse: NurseId,
        nurse2: NurseId,
        lo: Weekday,
        hi: Weekday,
        delta: ObjValue,
    },
    ArChain {
        mode: MoveMode,
        steps: SmallVec<[ArStep; 8]>,
        delta: ObjValue,
    },
}

impl Move {
    #[inline]
    pub fn delta(&self) -> ObjValue {
        match self {
            Move::Add { delta, .. }
            | Move::Change { delta, .. }
            | Move::Remove { delta, .. }
            | Move::Swap { delta, .. }
            | Move::BlockSwap { delta, .. }
            | Move::ArChain { delta, .. } => *delta,
        }
    }

    #[inline]
    pub fn mode(&self) -> MoveMode {
        match self {
            Move::Add { .. } => MoveMode::Add,
            Move::Change { .. } => MoveMode::Change,
            Move::Remove { .. } => MoveMode::Remove,
            Move::Swap { .. } => MoveMode::Swap,
            Move::BlockSwap { .. } => MoveMode::BlockSwap,
            Move::ArChain { mode, .. } => *mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nurse_roster_model::prelude::{ShiftId, SkillId};
    use static_assertions::assert_impl_all;

    assert_impl_all!(Move: Send, Sync, Clone);
    assert_impl_all!(MoveMode: Send, Sync, Copy);
    assert_impl_all!(ArStep: Send, Sync, Copy);

    #[test]
    fn modes_round_trip_through_moves() {
        let slot = ShiftSlot::new(ShiftId::new(0), SkillId::new(0));
        let mv = Move::Add {
            day: Weekday::MON,
            nurse: NurseId::new(0),
            slot,
            delta: ObjValue::zero(),
        };
        assert_eq!(mv.mode(), MoveMode::Add);
        assert_eq!(mv.delta(), ObjValue::zero());

        let chain = Move::ArChain {
            mode: MoveMode::ArBoth,
            steps: SmallVec::new(),
            delta: ObjValue::new(-1),
        };
        assert_eq!(chain.mode(), MoveMode::ArBoth);
        assert_eq!(chain.mode().name(), "ARBoth");
    }
}

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

pub trait IdentifierMarkerName: Copy {
    const NAME: &'static str;
}

/// Dense 0-based index with a phantom marker, so nurse, shift, skill and
/// contract ids cannot be mixed up at call sites.
#[repr(transparent)]
#[must_use]
#[derive(Debug)]
pub struct Identifier<U>(usize, core::marker::PhantomData<U>);

impl<U> Clone for Identifier<U> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for Identifier<U> {}

impl<U> PartialEq for Identifier<U> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<U> Eq for Identifier<U> {}

impl<U> std::hash::Hash for Identifier<U> {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<U> PartialOrd for Identifier<U> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<U> Ord for Identifier<U> {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<U> Identifier<U> {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index, core::marker::PhantomData)
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl<U> std::fmt::Display for Identifier<U>
where
    U: IdentifierMarkerName,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", U::NAME, self.0)
    }
}

impl<U> serde::Serialize for Identifier<U> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0 as u64)
    }
}

impl<'de, U> serde::Deserialize<'de> for Identifier<U> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <u64 as serde::Deserialize>::deserialize(deserializer).map(|v| Identifier::new(v as usize))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NurseMarker;

impl IdentifierMarkerName for NurseMarker {
    const NAME: &'static str = "Nurse";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShiftMarker;

impl IdentifierMarkerName for ShiftMarker {
    const NAME: &'static str = "Shift";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkillMarker;

impl IdentifierMarkerName for SkillMarker {
    const NAME: &'static str = "Skill";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractMarker;

impl IdentifierMarkerName for ContractMarker {
    const NAME: &'static str = "Contract";
}

pub type NurseId = Identifier<NurseMarker>;
pub type ShiftId = Identifier<ShiftMarker>;
pub type SkillId = Identifier<SkillMarker>;
pub type ContractId = Identifier<ContractMarker>;

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(NurseId: Send, Sync, Copy, Ord);
    assert_impl_all!(ShiftId: Send, Sync, Copy, Ord);

    #[test]
    fn display_uses_marker_name() {
        assert_eq!(NurseId::new(3).to_string(), "Nurse(3)");
        assert_eq!(ShiftId::new(0).to_string(), "Shift(0)");
        assert_eq!(SkillId::new(1).to_string(), "Skill(1)");
        assert_eq!(ContractId::new(2).to_string(), "Contract(2)");
    }

    #[test]
    fn round_trips_through_serde() {
        let id = ShiftId::new(5);
        let json = serde_json_value(&id);
        assert_eq!(json, "5");
        let back: ShiftId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    fn serde_json_value<T: serde::Serialize>(v: &T) -> String {
        serde_json::to_string(v).unwrap()
    }
}

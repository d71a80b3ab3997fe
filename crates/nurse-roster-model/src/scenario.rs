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

use crate::common::{ContractId, NurseId, ShiftId, SkillId};
use crate::err::ScenarioBuildError;
use fixedbitset::FixedBitSet;
use std::collections::BTreeMap;

/// One shift type with its consecutive-run bounds and the set of shift
/// types that may legally follow it on the next day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    name: String,
    min_consecutive: i64,
    max_consecutive: i64,
    legal_next: FixedBitSet,
}

impl Shift {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn min_consecutive(&self) -> i64 {
        self.min_consecutive
    }

    #[inline]
    pub fn max_consecutive(&self) -> i64 {
        self.max_consecutive
    }

    #[inline]
    pub fn can_precede(&self, next: ShiftId) -> bool {
        self.legal_next.contains(next.get())
    }
}

/// The numeric terms of a work contract over the whole planning horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractTerms {
    pub min_assignments: i64,
    pub max_assignments: i64,
    pub min_consecutive_work: i64,
    pub max_consecutive_work: i64,
    pub min_consecutive_off: i64,
    pub max_consecutive_off: i64,
    pub max_working_weekends: i64,
    pub complete_weekend: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    name: String,
    terms: ContractTerms,
}

impl Contract {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn min_assignments(&self) -> i64 {
        self.terms.min_assignments
    }

    #[inline]
    pub fn max_assignments(&self) -> i64 {
        self.terms.max_assignments
    }

    #[inline]
    pub fn min_consecutive_work(&self) -> i64 {
        self.terms.min_consecutive_work
    }

    #[inline]
    pub fn max_consecutive_work(&self) -> i64 {
        self.terms.max_consecutive_work
    }

    #[inline]
    pub fn min_consecutive_off(&self) -> i64 {
        self.terms.min_consecutive_off
    }

    #[inline]
    pub fn max_consecutive_off(&self) -> i64 {
        self.terms.max_consecutive_off
    }

    #[inline]
    pub fn max_working_weekends(&self) -> i64 {
        self.terms.max_working_weekends
    }

    #[inline]
    pub fn complete_weekend(&self) -> bool {
        self.terms.complete_weekend
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nurse {
    name: String,
    contract: ContractId,
    skills: FixedBitSet,
    skill_count: usize,
}

impl Nurse {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn contract(&self) -> ContractId {
        self.contract
    }

    #[inline]
    pub fn has_skill(&self, skill: SkillId) -> bool {
        self.skills.contains(skill.get())
    }

    /// Number of skills this nurse owns. The greedy constructor packs
    /// specialists (fewer skills) first.
    #[inline]
    pub fn skill_count(&self) -> usize {
        self.skill_count
    }

    pub fn skills(&self) -> impl Iterator<Item = SkillId> + '_ {
        self.skills.ones().map(SkillId::new)
    }
}

/// The immutable instance description shared by every week of a horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    name: String,
    total_week_num: i64,
    skills: Vec<String>,
    shifts: Vec<Shift>,
    contracts: Vec<Contract>,
    nurses: Vec<Nurse>,
    shift_map: BTreeMap<String, usize>,
    skill_map: BTreeMap<String, usize>,
    contract_map: BTreeMap<String, usize>,
    nurse_map: BTreeMap<String, usize>,
}

impl Scenario {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn total_week_num(&self) -> i64 {
        self.total_week_num
    }

    #[inline]
    pub fn shift_num(&self) -> usize {
        self.shifts.len()
    }

    #[inline]
    pub fn skill_num(&self) -> usize {
        self.skills.len()
    }

    #[inline]
    pub fn contract_num(&self) -> usize {
        self.contracts.len()
    }

    #[inline]
    pub fn nurse_num(&self) -> usize {
        self.nurses.len()
    }

    #[inline]
    pub fn shift(&self, id: ShiftId) -> &Shift {
        &self.shifts[id.get()]
    }

    #[inline]
    pub fn skill_name(&self, id: SkillId) -> &str {
        &self.skills[id.get()]
    }

    #[inline]
    pub fn contract(&self, id: ContractId) -> &Contract {
        &self.contracts[id.get()]
    }

    #[inline]
    pub fn nurse(&self, id: NurseId) -> &Nurse {
        &self.nurses[id.get()]
    }

    #[inline]
    pub fn contract_of(&self, nurse: NurseId) -> &Contract {
        self.contract(self.nurse(nurse).contract())
    }

    pub fn shifts(&self) -> impl Iterator<Item = (ShiftId, &Shift)> {
        self.shifts.iter().enumerate().map(|(i, s)| (ShiftId::new(i), s))
    }

    pub fn nurses(&self) -> impl Iterator<Item = (NurseId, &Nurse)> {
        self.nurses.iter().enumerate().map(|(i, n)| (NurseId::new(i), n))
    }

    pub fn shift_ids(&self) -> impl Iterator<Item = ShiftId> {
        (0..self.shift_num()).map(ShiftId::new)
    }

    pub fn skill_ids(&self) -> impl Iterator<Item = SkillId> {
        (0..self.skill_num()).map(SkillId::new)
    }

    pub fn nurse_ids(&self) -> impl Iterator<Item = NurseId> {
        (0..self.nurse_num()).map(NurseId::new)
    }

    /// H3: a day off on either side makes any succession legal.
    #[inline]
    pub fn legal_succession(&self, prev: Option<ShiftId>, next: ShiftId) -> bool {
        match prev {
            Some(p) => self.shift(p).can_precede(next),
            None => true,
        }
    }

    pub fn shift_id(&self, name: &str) -> Option<ShiftId> {
        self.shift_map.get(name).copied().map(ShiftId::new)
    }

    pub fn skill_id(&self, name: &str) -> Option<SkillId> {
        self.skill_map.get(name).copied().map(SkillId::new)
    }

    pub fn contract_id(&self, name: &str) -> Option<ContractId> {
        self.contract_map.get(name).copied().map(ContractId::new)
    }

    pub fn nurse_id(&self, name: &str) -> Option<NurseId> {
        self.nurse_map.get(name).copied().map(NurseId::new)
    }

    /// Number of nurses owning `skill`.
    pub fn nurse_count_with_skill(&self, skill: SkillId) -> usize {
        self.nurses.iter().filter(|n| n.has_skill(skill)).count()
    }
}

/// Incremental scenario assembly; name resolution and consistency checks
/// run in [`ScenarioBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct ScenarioBuilder {
    name: String,
    total_weeks: i64,
    skills: Vec<String>,
    shifts: Vec<(String, i64, i64)>,
    forbidden: Vec<(String, String)>,
    contracts: Vec<(String, ContractTerms)>,
    nurses: Vec<(String, String, Vec<String>)>,
}

impl ScenarioBuilder {
    pub fn new(name: impl Into<String>, total_weeks: i64) -> Self {
        Self {
            name: name.into(),
            total_weeks,
            ..Self::default()
        }
    }

    pub fn skill(mut self, name: impl Into<String>) -> Self {
        self.skills.push(name.into());
        self
    }

    pub fn shift(mut self, name: impl Into<String>, min_consecutive: i64, max_consecutive: i64) -> Self {
        self.shifts.push((name.into(), min_consecutive, max_consecutive));
        self
    }

    /// Forbid `next` directly after `from`. Every succession not forbidden
    /// is legal.
    pub fn forbid_succession(mut self, from: impl Into<String>, next: impl Into<String>) -> Self {
        self.forbidden.push((from.into(), next.into()));
        self
    }

    pub fn contract(mut self, name: impl Into<String>, terms: ContractTerms) -> Self {
        self.contracts.push((name.into(), terms));
        self
    }

    pub fn nurse(
        mut self,
        name: impl Into<String>,
        contract: impl Into<String>,
        skills: &[&str],
    ) -> Self {
        self.nurses.push((
            name.into(),
            contract.into(),
            skills.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    pub fn build(self) -> Result<Scenario, ScenarioBuildError> {
        if self.total_weeks <= 0 {
            return Err(ScenarioBuildError::NonPositiveWeeks {
                weeks: self.total_weeks,
            });
        }
        for (kind, names) in [
            ("skill", !self.skills.is_empty()),
            ("shift", !self.shifts.is_empty()),
            ("contract", !self.contracts.is_empty()),
            ("nurse", !self.nurses.is_empty()),
        ] {
            if !names {
                return Err(ScenarioBuildError::EmptyTable { kind });
            }
        }

        let skill_names = self.skills.clone();
        let skill_map = index_names("skill", self.skills.iter().cloned())?;
        let shift_map = index_names("shift", self.shifts.iter().map(|(n, _, _)| n.clone()))?;
        let contract_map = index_names("contract", self.contracts.iter().map(|(n, _)| n.clone()))?;
        let nurse_map = index_names("nurse", self.nurses.iter().map(|(n, _, _)| n.clone()))?;

        let shift_num = self.shifts.len();
        let mut shifts: Vec<Shift> = self
            .shifts
            .into_iter()
            .map(|(name, lo, hi)| {
                if lo < 1 || hi < lo {
                    return Err(ScenarioBuildError::InvalidRange {
                        what: "consecutive-shift",
                        lo,
                        hi,
                    });
                }
                let mut legal_next = FixedBitSet::with_capacity(shift_num);
                legal_next.insert_range(..);
                Ok(Shift {
                    name,
                    min_consecutive: lo,
                    max_consecutive: hi,
                    legal_next,
                })
            })
            .collect::<Result<_, _>>()?;

        for (from, next) in self.forbidden {
            let f = *shift_map
                .get(&from)
                .ok_or(ScenarioBuildError::UnknownName {
                    kind: "shift",
                    name: from.clone(),
                })?;
            let n = *shift_map
                .get(&next)
                .ok_or(ScenarioBuildError::UnknownName {
                    kind: "shift",
                    name: next.clone(),
                })?;
            shifts[f].legal_next.remove(n);
        }

        let contracts: Vec<Contract> = self
            .contracts
            .into_iter()
            .map(|(name, terms)| {
                if terms.min_assignments > terms.max_assignments {
                    return Err(ScenarioBuildError::InvalidRange {
                        what: "total-assignment",
                        lo: terms.min_assignments,
                        hi: terms.max_assignments,
                    });
                }
                if terms.min_consecutive_work < 1
                    || terms.max_consecutive_work < terms.min_consecutive_work
                {
                    return Err(ScenarioBuildError::InvalidRange {
                        what: "consecutive-work",
                        lo: terms.min_consecutive_work,
                        hi: terms.max_consecutive_work,
                    });
                }
                if terms.min_consecutive_off < 1
                    || terms.max_consecutive_off < terms.min_consecutive_off
                {
                    return Err(ScenarioBuildError::InvalidRange {
                        what: "consecutive-off",
                        lo: terms.min_consecutive_off,
                        hi: terms.max_consecutive_off,
                    });
                }
                Ok(Contract { name, terms })
            })
            .collect::<Result<_, _>>()?;

        let skill_num = skill_map.len();
        let nurses: Vec<Nurse> = self
            .nurses
            .into_iter()
            .map(|(name, contract, skill_names)| {
                let contract = *contract_map.get(&contract).ok_or_else(|| {
                    ScenarioBuildError::UnknownName {
                        kind: "contract",
                        name: contract.clone(),
                    }
                })?;
                if skill_names.is_empty() {
                    return Err(ScenarioBuildError::NurseWithoutSkill { name });
                }
                let mut skills = FixedBitSet::with_capacity(skill_num);
                for s in &skill_names {
                    let id = *skill_map.get(s).ok_or_else(|| ScenarioBuildError::UnknownName {
                        kind: "skill",
                        name: s.clone(),
                    })?;
                    skills.insert(id);
                }
                let skill_count = skills.count_ones(..);
                Ok(Nurse {
                    name,
                    contract: ContractId::new(contract),
                    skills,
                    skill_count,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Scenario {
            name: self.name,
            total_week_num: self.total_weeks,
            skills: skill_names,
            shifts,
            contracts,
            nurses,
            shift_map,
            skill_map,
            contract_map,
            nurse_map,
        })
    }
}

fn index_names(
    kind: &'static str,
    names: impl Iterator<Item = String>,
) -> Result<BTreeMap<String, usize>, ScenarioBuildError> {
    let mut map = BTreeMap::new();
    for (i, name) in names.enumerate() {
        if map.insert(name.clone(), i).is_some() {
            return Err(ScenarioBuildError::DuplicateName { kind, name });
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn full_time() -> ContractTerms {
        ContractTerms {
            min_assignments: 0,
            max_assignments: 35,
            min_consecutive_work: 1,
            max_consecutive_work: 7,
            min_consecutive_off: 1,
            max_consecutive_off: 7,
            max_working_weekends: 4,
            complete_weekend: false,
        }
    }

    fn small() -> Scenario {
        ScenarioBuilder::new("n002w4", 4)
            .skill("HeadNurse")
            .skill("Nurse")
            .shift("Early", 1, 5)
            .shift("Night", 2, 4)
            .forbid_succession("Night", "Early")
            .contract("FullTime", full_time())
            .nurse("Amy", "FullTime", &["HeadNurse", "Nurse"])
            .nurse("Ben", "FullTime", &["Nurse"])
            .build()
            .unwrap()
    }

    #[test]
    fn resolves_names_to_dense_ids() {
        let sc = small();
        assert_eq!(sc.shift_num(), 2);
        assert_eq!(sc.skill_num(), 2);
        assert_eq!(sc.nurse_num(), 2);
        let night = sc.shift_id("Night").unwrap();
        let early = sc.shift_id("Early").unwrap();
        assert!(!sc.shift(night).can_precede(early));
        assert!(sc.shift(early).can_precede(night));
        assert!(sc.legal_succession(None, early));
    }

    #[test]
    fn skill_ownership() {
        let sc = small();
        let amy = sc.nurse_id("Amy").unwrap();
        let ben = sc.nurse_id("Ben").unwrap();
        let head = sc.skill_id("HeadNurse").unwrap();
        assert!(sc.nurse(amy).has_skill(head));
        assert!(!sc.nurse(ben).has_skill(head));
        assert_eq!(sc.nurse(amy).skill_count(), 2);
        assert_eq!(sc.nurse_count_with_skill(head), 1);
    }

    #[test]
    fn rejects_duplicate_and_unknown_names() {
        let err = ScenarioBuilder::new("bad", 4)
            .skill("Nurse")
            .skill("Nurse")
            .shift("Early", 1, 3)
            .contract("FullTime", full_time())
            .nurse("Amy", "FullTime", &["Nurse"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ScenarioBuildError::DuplicateName { .. }));

        let err = ScenarioBuilder::new("bad", 4)
            .skill("Nurse")
            .shift("Early", 1, 3)
            .contract("FullTime", full_time())
            .nurse("Amy", "PartTime", &["Nurse"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ScenarioBuildError::UnknownName { .. }));
    }
}

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

use crate::err::ProblemError;
use crate::history::History;
use crate::scenario::Scenario;
use crate::week::WeekData;

/// Everything one weekly solve reads: the immutable scenario, this week's
/// demand and preferences, and what the previous weeks left behind.
#[derive(Debug, Clone)]
pub struct RosterProblem {
    scenario: Scenario,
    week_data: WeekData,
    history: History,
}

impl RosterProblem {
    pub fn new(
        scenario: Scenario,
        week_data: WeekData,
        history: History,
    ) -> Result<Self, ProblemError> {
        if week_data.nurse_num() != scenario.nurse_num() {
            return Err(ProblemError::NurseCountMismatch {
                scenario: scenario.nurse_num(),
                other: week_data.nurse_num(),
                table: "week data",
            });
        }
        if week_data.opt_nurse_nums().shift_num() != scenario.shift_num() {
            return Err(ProblemError::ShiftCountMismatch {
                scenario: scenario.shift_num(),
                other: week_data.opt_nurse_nums().shift_num(),
                table: "week data",
            });
        }
        if week_data.opt_nurse_nums().skill_num() != scenario.skill_num() {
            return Err(ProblemError::SkillCountMismatch {
                scenario: scenario.skill_num(),
                other: week_data.opt_nurse_nums().skill_num(),
                table: "week data",
            });
        }
        if history.nurse_num() != scenario.nurse_num() {
            return Err(ProblemError::NurseCountMismatch {
                scenario: scenario.nurse_num(),
                other: history.nurse_num(),
                table: "history",
            });
        }
        for nurse in scenario.nurse_ids() {
            if !history.is_consistent(nurse) {
                return Err(ProblemError::InconsistentHistory { nurse: nurse.get() });
            }
        }
        Ok(Self {
            scenario,
            week_data,
            history,
        })
    }

    #[inline]
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    #[inline]
    pub fn week_data(&self) -> &WeekData {
        &self.week_data
    }

    #[inline]
    pub fn history(&self) -> &History {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{ContractTerms, ScenarioBuilder};

    fn scenario() -> Scenario {
        ScenarioBuilder::new("tiny", 4)
            .skill("Nurse")
            .shift("Day", 1, 7)
            .contract(
                "FT",
                ContractTerms {
                    min_assignments: 0,
                    max_assignments: 28,
                    min_consecutive_work: 1,
                    max_consecutive_work: 7,
                    min_consecutive_off: 1,
                    max_consecutive_off: 7,
                    max_working_weekends: 4,
                    complete_weekend: false,
                },
            )
            .nurse("Amy", "FT", &["Nurse"])
            .build()
            .unwrap()
    }

    #[test]
    fn accepts_consistent_parts() {
        let sc = scenario();
        let wd = WeekData::new(1, 1, 1);
        let his = History::initial(1);
        assert!(RosterProblem::new(sc, wd, his).is_ok());
    }

    #[test]
    fn rejects_mismatched_nurse_count() {
        let sc = scenario();
        let wd = WeekData::new(1, 1, 2);
        let his = History::initial(1);
        let err = RosterProblem::new(sc, wd, his).unwrap_err();
        assert!(matches!(err, ProblemError::NurseCountMismatch { .. }));
    }
}

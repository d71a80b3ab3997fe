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

use crate::common::{NurseId, ShiftId, SkillId};
use nurse_roster_core::prelude::Weekday;

/// Error building a scenario from raw parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioBuildError {
    DuplicateName { kind: &'static str, name: String },
    UnknownName { kind: &'static str, name: String },
    EmptyTable { kind: &'static str },
    InvalidRange { what: &'static str, lo: i64, hi: i64 },
    NonPositiveWeeks { weeks: i64 },
    NurseWithoutSkill { name: String },
}

impl std::fmt::Display for ScenarioBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioBuildError::DuplicateName { kind, name } => {
                write!(f, "duplicate {kind} name {name:?}")
            }
            ScenarioBuildError::UnknownName { kind, name } => {
                write!(f, "unknown {kind} name {name:?}")
            }
            ScenarioBuildError::EmptyTable { kind } => {
                write!(f, "a scenario needs at least one {kind}")
            }
            ScenarioBuildError::InvalidRange { what, lo, hi } => {
                write!(f, "invalid {what} range [{lo}, {hi}]")
            }
            ScenarioBuildError::NonPositiveWeeks { weeks } => {
                write!(f, "planning horizon must be positive, got {weeks} weeks")
            }
            ScenarioBuildError::NurseWithoutSkill { name } => {
                write!(f, "nurse {name:?} owns no skill")
            }
        }
    }
}

impl std::error::Error for ScenarioBuildError {}

/// Error reading one of the scenario / history / week-data text files.
#[derive(Debug)]
pub enum LoaderError {
    Io(std::io::Error),
    Syntax { line: usize, message: String },
    Build(ScenarioBuildError),
}

impl LoaderError {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        LoaderError::Syntax {
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderError::Io(e) => write!(f, "i/o error: {e}"),
            LoaderError::Syntax { line, message } => write!(f, "line {line}: {message}"),
            LoaderError::Build(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoaderError::Io(e) => Some(e),
            LoaderError::Build(e) => Some(e),
            LoaderError::Syntax { .. } => None,
        }
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(e: std::io::Error) -> Self {
        LoaderError::Io(e)
    }
}

impl From<ScenarioBuildError> for LoaderError {
    fn from(e: ScenarioBuildError) -> Self {
        LoaderError::Build(e)
    }
}

/// Scenario, week data and history do not describe the same instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemError {
    NurseCountMismatch { scenario: usize, other: usize, table: &'static str },
    ShiftCountMismatch { scenario: usize, other: usize, table: &'static str },
    SkillCountMismatch { scenario: usize, other: usize, table: &'static str },
    InconsistentHistory { nurse: usize },
}

impl std::fmt::Display for ProblemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (kind, scenario, other, table) = match self {
            ProblemError::NurseCountMismatch { scenario, other, table } => {
                ("nurse", scenario, other, table)
            }
            ProblemError::ShiftCountMismatch { scenario, other, table } => {
                ("shift", scenario, other, table)
            }
            ProblemError::SkillCountMismatch { scenario, other, table } => {
                ("skill", scenario, other, table)
            }
            ProblemError::InconsistentHistory { nurse } => {
                return write!(
                    f,
                    "history consecutive counters of nurse {nurse} contradict her last shift"
                );
            }
        };
        write!(
            f,
            "{table} describes {other} {kind}s but the scenario has {scenario}"
        )
    }
}

impl std::error::Error for ProblemError {}

/// A hard-constraint violation found by `check_feasibility`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeasibilityError {
    /// H2: fewer nurses than the hard floor on a (day, shift, skill) slot.
    UnderStaffed {
        day: Weekday,
        shift: ShiftId,
        skill: SkillId,
        missing: i64,
    },
    /// H3: an illegal shift succession, including against the history.
    IllegalSuccession { nurse: NurseId, day: Weekday },
    /// H4: a nurse works a skill she does not own.
    MissingSkill {
        nurse: NurseId,
        day: Weekday,
        skill: SkillId,
    },
}

impl std::fmt::Display for FeasibilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeasibilityError::UnderStaffed {
                day,
                shift,
                skill,
                missing,
            } => write!(f, "{day} {shift} {skill}: {missing} nurse(s) below the hard floor"),
            FeasibilityError::IllegalSuccession { nurse, day } => {
                write!(f, "{nurse}: illegal shift succession into {day}")
            }
            FeasibilityError::MissingSkill { nurse, day, skill } => {
                write!(f, "{nurse} works {skill} on {day} without owning it")
            }
        }
    }
}

impl std::error::Error for FeasibilityError {}

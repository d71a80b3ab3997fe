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

//! Whitespace-token text loaders for the three input files of one weekly
//! solve: scenario (`Sc-*`), initial history (`H0-*`) and week data
//! (`WD-*`). Lines starting with `#` are comments.

use crate::err::LoaderError;
use crate::history::History;
use crate::scenario::{ContractTerms, Scenario, ScenarioBuilder};
use crate::week::WeekData;
use nurse_roster_core::prelude::Weekday;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

struct Scanner<R> {
    reader: R,
    line: usize,
    tokens: VecDeque<String>,
}

impl<R: BufRead> Scanner<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            tokens: VecDeque::new(),
        }
    }

    fn next_token(&mut self) -> Result<String, LoaderError> {
        loop {
            if let Some(tok) = self.tokens.pop_front() {
                return Ok(tok);
            }
            let mut buf = String::new();
            if self.reader.read_line(&mut buf)? == 0 {
                return Err(LoaderError::syntax(self.line, "unexpected end of file"));
            }
            self.line += 1;
            let content = buf.split('#').next().unwrap_or("");
            self.tokens
                .extend(content.split_whitespace().map(str::to_string));
        }
    }

    fn next_i64(&mut self) -> Result<i64, LoaderError> {
        let tok = self.next_token()?;
        tok.parse()
            .map_err(|_| LoaderError::syntax(self.line, format!("expected a number, got {tok:?}")))
    }

    fn next_usize(&mut self) -> Result<usize, LoaderError> {
        let tok = self.next_token()?;
        tok.parse()
            .map_err(|_| LoaderError::syntax(self.line, format!("expected a count, got {tok:?}")))
    }

    fn next_bool(&mut self) -> Result<bool, LoaderError> {
        match self.next_i64()? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(LoaderError::syntax(
                self.line,
                format!("expected 0 or 1, got {v}"),
            )),
        }
    }

    fn expect(&mut self, keyword: &str) -> Result<(), LoaderError> {
        let tok = self.next_token()?;
        if tok == keyword {
            Ok(())
        } else {
            Err(LoaderError::syntax(
                self.line,
                format!("expected {keyword:?}, got {tok:?}"),
            ))
        }
    }

    fn line(&self) -> usize {
        self.line
    }
}

/// Loader for the scenario file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioLoader;

impl ScenarioLoader {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    pub fn from_path(&self, path: impl AsRef<Path>) -> Result<Scenario, LoaderError> {
        self.from_bufread(BufReader::new(File::open(path)?))
    }

    pub fn from_bufread<R: BufRead>(&self, reader: R) -> Result<Scenario, LoaderError> {
        let mut sc = Scanner::new(reader);

        sc.expect("SCENARIO")?;
        let name = sc.next_token()?;
        sc.expect("WEEKS")?;
        let weeks = sc.next_i64()?;
        let mut builder = ScenarioBuilder::new(name, weeks);

        sc.expect("SKILLS")?;
        let skill_num = sc.next_usize()?;
        for _ in 0..skill_num {
            builder = builder.skill(sc.next_token()?);
        }

        sc.expect("SHIFT_TYPES")?;
        let shift_num = sc.next_usize()?;
        for _ in 0..shift_num {
            let name = sc.next_token()?;
            let min = sc.next_i64()?;
            let max = sc.next_i64()?;
            builder = builder.shift(name, min, max);
        }

        sc.expect("FORBIDDEN_SUCCESSIONS")?;
        let forbidden_num = sc.next_usize()?;
        for _ in 0..forbidden_num {
            let from = sc.next_token()?;
            let next = sc.next_token()?;
            builder = builder.forbid_succession(from, next);
        }

        sc.expect("CONTRACTS")?;
        let contract_num = sc.next_usize()?;
        for _ in 0..contract_num {
            let name = sc.next_token()?;
            let terms = ContractTerms {
                min_assignments: sc.next_i64()?,
                max_assignments: sc.next_i64()?,
                min_consecutive_work: sc.next_i64()?,
                max_consecutive_work: sc.next_i64()?,
                min_consecutive_off: sc.next_i64()?,
                max_consecutive_off: sc.next_i64()?,
                max_working_weekends: sc.next_i64()?,
                complete_weekend: sc.next_bool()?,
            };
            builder = builder.contract(name, terms);
        }

        sc.expect("NURSES")?;
        let nurse_num = sc.next_usize()?;
        for _ in 0..nurse_num {
            let name = sc.next_token()?;
            let contract = sc.next_token()?;
            let own_num = sc.next_usize()?;
            let mut skills = Vec::with_capacity(own_num);
            for _ in 0..own_num {
                skills.push(sc.next_token()?);
            }
            let skill_refs: Vec<&str> = skills.iter().map(String::as_str).collect();
            builder = builder.nurse(name, contract, &skill_refs);
        }

        Ok(builder.build()?)
    }
}

/// Loader for an initial-history file; prior weeks instead hand their
/// history over through the custom snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryLoader;

impl HistoryLoader {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    pub fn from_path(
        &self,
        path: impl AsRef<Path>,
        scenario: &Scenario,
    ) -> Result<History, LoaderError> {
        self.from_bufread(BufReader::new(File::open(path)?), scenario)
    }

    pub fn from_bufread<R: BufRead>(
        &self,
        reader: R,
        scenario: &Scenario,
    ) -> Result<History, LoaderError> {
        let mut sc = Scanner::new(reader);

        sc.expect("HISTORY")?;
        let past_week_count = sc.next_i64()?;
        let scenario_name = sc.next_token()?;
        if scenario_name != scenario.name() {
            return Err(LoaderError::syntax(
                sc.line(),
                format!(
                    "history is for scenario {scenario_name:?}, expected {:?}",
                    scenario.name()
                ),
            ));
        }

        let mut history = History::initial(scenario.nurse_num());
        history.past_week_count = past_week_count;

        sc.expect("NURSE_HISTORY")?;
        for _ in 0..scenario.nurse_num() {
            let nurse_name = sc.next_token()?;
            let nurse = scenario.nurse_id(&nurse_name).ok_or_else(|| {
                LoaderError::syntax(sc.line(), format!("unknown nurse {nurse_name:?}"))
            })?;
            let n = nurse.get();
            history.total_assign[n] = sc.next_i64()?;
            history.total_working_weekend[n] = sc.next_i64()?;
            let shift_name = sc.next_token()?;
            history.last_shift[n] = if shift_name == "None" {
                None
            } else {
                Some(scenario.shift_id(&shift_name).ok_or_else(|| {
                    LoaderError::syntax(sc.line(), format!("unknown shift {shift_name:?}"))
                })?)
            };
            history.consecutive_shift[n] = sc.next_i64()?;
            history.consecutive_work[n] = sc.next_i64()?;
            history.consecutive_off[n] = sc.next_i64()?;
        }

        Ok(history)
    }
}

/// Loader for one week's demand and preference file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekDataLoader;

impl WeekDataLoader {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    pub fn from_path(
        &self,
        path: impl AsRef<Path>,
        scenario: &Scenario,
    ) -> Result<WeekData, LoaderError> {
        self.from_bufread(BufReader::new(File::open(path)?), scenario)
    }

    pub fn from_bufread<R: BufRead>(
        &self,
        reader: R,
        scenario: &Scenario,
    ) -> Result<WeekData, LoaderError> {
        let mut sc = Scanner::new(reader);

        sc.expect("WEEK_DATA")?;
        let scenario_name = sc.next_token()?;
        if scenario_name != scenario.name() {
            return Err(LoaderError::syntax(
                sc.line(),
                format!(
                    "week data is for scenario {scenario_name:?}, expected {:?}",
                    scenario.name()
                ),
            ));
        }

        let mut week = WeekData::new(
            scenario.shift_num(),
            scenario.skill_num(),
            scenario.nurse_num(),
        );

        // One row per (shift, skill): min/opt pairs for Mon..Sun.
        sc.expect("REQUIREMENTS")?;
        for _ in 0..scenario.shift_num() * scenario.skill_num() {
            let shift_name = sc.next_token()?;
            let shift = scenario.shift_id(&shift_name).ok_or_else(|| {
                LoaderError::syntax(sc.line(), format!("unknown shift {shift_name:?}"))
            })?;
            let skill_name = sc.next_token()?;
            let skill = scenario.skill_id(&skill_name).ok_or_else(|| {
                LoaderError::syntax(sc.line(), format!("unknown skill {skill_name:?}"))
            })?;
            for day in Weekday::week() {
                let min = sc.next_i64()?;
                let opt = sc.next_i64()?;
                week.set_requirement(day, shift, skill, min, opt);
            }
        }

        sc.expect("SHIFT_OFF_REQUESTS")?;
        let request_num = sc.next_usize()?;
        for _ in 0..request_num {
            let nurse_name = sc.next_token()?;
            let nurse = scenario.nurse_id(&nurse_name).ok_or_else(|| {
                LoaderError::syntax(sc.line(), format!("unknown nurse {nurse_name:?}"))
            })?;
            let shift_name = sc.next_token()?;
            let day_name = sc.next_token()?;
            let day = Weekday::from_name(&day_name).ok_or_else(|| {
                LoaderError::syntax(sc.line(), format!("unknown day {day_name:?}"))
            })?;
            // "Any" asks the whole day off: flag every shift type.
            if shift_name == "Any" {
                for shift in scenario.shift_ids() {
                    week.set_shift_off(day, shift, nurse);
                }
            } else {
                let shift = scenario.shift_id(&shift_name).ok_or_else(|| {
                    LoaderError::syntax(sc.line(), format!("unknown shift {shift_name:?}"))
                })?;
                week.set_shift_off(day, shift, nurse);
            }
        }

        Ok(week)
    }
}

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

use crate::err::ConfigParseError;
use crate::search::block_swap::BlockSwapVariant;
use crate::search::moves::MoveMode;
use crate::search::tabu::TabuTenureCoefficient;

/// Top-level search strategies. The three tabu variants differ only in
/// how the mode sequence is traversed per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveAlgorithm {
    RandomWalk,
    IteratedLocalSearch,
    TabuSearchLoop,
    TabuSearchRand,
    TabuSearchPossibility,
}

impl SolveAlgorithm {
    pub const fn name(self) -> &'static str {
        match self {
            SolveAlgorithm::RandomWalk => "RW",
            SolveAlgorithm::IteratedLocalSearch => "ILS",
            SolveAlgorithm::TabuSearchLoop => "Tabu[Loop]",
            SolveAlgorithm::TabuSearchRand => "Tabu[Rand]",
            SolveAlgorithm::TabuSearchPossibility => "Tabu[Possibility]",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text {
            "rw" | "random-walk" => Some(SolveAlgorithm::RandomWalk),
            "ils" => Some(SolveAlgorithm::IteratedLocalSearch),
            "tabu-loop" => Some(SolveAlgorithm::TabuSearchLoop),
            "tabu-rand" => Some(SolveAlgorithm::TabuSearchRand),
            "tabu-possibility" => Some(SolveAlgorithm::TabuSearchPossibility),
            _ => None,
        }
    }
}

/// The supported move-kind sequences the inner descents cycle through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSeq {
    Acsr,
    Ascr,
    Arlcs,
    Arrcs,
    Arbcs,
}

impl ModeSeq {
    pub const fn name(self) -> &'static str {
        match self {
            ModeSeq::Acsr => "[ACSR]",
            ModeSeq::Ascr => "[ASCR]",
            ModeSeq::Arlcs => "[ARLCS]",
            ModeSeq::Arrcs => "[ARRCS]",
            ModeSeq::Arbcs => "[ARBCS]",
        }
    }

    pub const fn modes(self) -> &'static [MoveMode] {
        match self {
            ModeSeq::Acsr => &[
                MoveMode::Add,
                MoveMode::Change,
                MoveMode::Swap,
                MoveMode::Remove,
            ],
            ModeSeq::Ascr => &[
                MoveMode::Add,
                MoveMode::Swap,
                MoveMode::Change,
                MoveMode::Remove,
            ],
            ModeSeq::Arlcs => &[MoveMode::ArLoop, MoveMode::Change, MoveMode::Swap],
            ModeSeq::Arrcs => &[MoveMode::ArRand, MoveMode::Change, MoveMode::Swap],
            ModeSeq::Arbcs => &[MoveMode::ArBoth, MoveMode::Change, MoveMode::Swap],
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text {
            "ACSR" => Some(ModeSeq::Acsr),
            "ASCR" => Some(ModeSeq::Ascr),
            "ARLCS" => Some(ModeSeq::Arlcs),
            "ARRCS" => Some(ModeSeq::Arrcs),
            "ARBCS" => Some(ModeSeq::Arbcs),
            _ => None,
        }
    }
}

/// How aggressively applied block swaps write tenure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSwapTabuStrength {
    /// Every exchanged day, both nurses.
    Strong,
    /// Every second exchanged day.
    Average,
    /// The first exchanged day only.
    Weak,
    No,
}

pub const INIT_PERTURB_STRENGTH: f64 = 0.2;
pub const PERTURB_STRENGTH_DELTA: f64 = 0.05;
pub const MAX_PERTURB_STRENGTH: f64 = 0.8;
pub const PERTURB_ORIGIN_SELECT: f64 = 0.4;

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub algorithm: SolveAlgorithm,
    pub mode_seq: ModeSeq,
    pub block_swap_variant: BlockSwapVariant,
    pub block_swap_radius: usize,
    pub block_swap_samples: usize,
    pub block_swap_tabu_strength: BlockSwapTabuStrength,
    pub ar_chain_max_len: usize,
    pub ar_seed_limit: usize,
    pub day_tenure_coefficient: TabuTenureCoefficient,
    pub shift_tenure_coefficient: TabuTenureCoefficient,
    pub init_perturb_strength: f64,
    pub perturb_strength_delta: f64,
    pub max_perturb_strength: f64,
    pub perturb_origin_select: f64,
    /// Inner-descent stagnation bound, in multiples of nurse × day slots.
    pub max_no_improve_factor: u64,
    /// Greedy restarts per solve, in nurses per attempt (nurse_num / this).
    pub greedy_retry_divisor: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            algorithm: SolveAlgorithm::IteratedLocalSearch,
            mode_seq: ModeSeq::Arbcs,
            block_swap_variant: BlockSwapVariant::Fast,
            block_swap_radius: 2,
            block_swap_samples: 64,
            block_swap_tabu_strength: BlockSwapTabuStrength::Average,
            ar_chain_max_len: 8,
            ar_seed_limit: 16,
            day_tenure_coefficient: TabuTenureCoefficient::day_default(),
            shift_tenure_coefficient: TabuTenureCoefficient::shift_default(),
            init_perturb_strength: INIT_PERTURB_STRENGTH,
            perturb_strength_delta: PERTURB_STRENGTH_DELTA,
            max_perturb_strength: MAX_PERTURB_STRENGTH,
            perturb_origin_select: PERTURB_ORIGIN_SELECT,
            max_no_improve_factor: 30,
            greedy_retry_divisor: 4,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithm(mut self, algorithm: SolveAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_mode_seq(mut self, mode_seq: ModeSeq) -> Self {
        self.mode_seq = mode_seq;
        self
    }

    pub fn with_block_swap_variant(mut self, variant: BlockSwapVariant) -> Self {
        self.block_swap_variant = variant;
        self
    }

    /// Parse an inline `key=value;key=value` configuration string, e.g.
    /// `alg=tabu-rand;seq=ARBCS;blockSwap=orgn`.
    pub fn parse(text: &str) -> Result<Self, ConfigParseError> {
        let mut config = Self::default();
        for entry in text.split(';').filter(|e| !e.trim().is_empty()) {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigParseError::new(entry, "expected key=value"))?;
            let (key, value) = (key.trim(), value.trim());
            match key {
                "alg" => {
                    config.algorithm = SolveAlgorithm::parse(value)
                        .ok_or_else(|| ConfigParseError::new(entry, "unknown algorithm"))?;
                }
                "seq" => {
                    config.mode_seq = ModeSeq::parse(value)
                        .ok_or_else(|| ConfigParseError::new(entry, "unknown mode sequence"))?;
                }
                "blockSwap" => {
                    config.block_swap_variant = match value {
                        "orgn" => BlockSwapVariant::Orgn,
                        "fast" => BlockSwapVariant::Fast,
                        "part" => BlockSwapVariant::Part,
                        "rand" => BlockSwapVariant::Rand,
                        _ => return Err(ConfigParseError::new(entry, "unknown block-swap variant")),
                    };
                }
                "blockSwapTabu" => {
                    config.block_swap_tabu_strength = match value {
                        "strong" => BlockSwapTabuStrength::Strong,
                        "avg" => BlockSwapTabuStrength::Average,
                        "weak" => BlockSwapTabuStrength::Weak,
                        "no" => BlockSwapTabuStrength::No,
                        _ => return Err(ConfigParseError::new(entry, "unknown tabu strength")),
                    };
                }
                "blockSwapRadius" => config.block_swap_radius = parse_num(entry, value)?,
                "blockSwapSamples" => config.block_swap_samples = parse_num(entry, value)?,
                "arLen" => config.ar_chain_max_len = parse_num(entry, value)?,
                "arSeeds" => config.ar_seed_limit = parse_num(entry, value)?,
                "stagnation" => config.max_no_improve_factor = parse_num(entry, value)?,
                "perturbInit" => config.init_perturb_strength = parse_float(entry, value)?,
                "perturbDelta" => config.perturb_strength_delta = parse_float(entry, value)?,
                "perturbMax" => config.max_perturb_strength = parse_float(entry, value)?,
                "perturbOrigin" => config.perturb_origin_select = parse_float(entry, value)?,
                "dayTenureNurse" => config.day_tenure_coefficient.nurse_num = parse_float(entry, value)?,
                "shiftTenureNurse" => {
                    config.shift_tenure_coefficient.nurse_num = parse_float(entry, value)?;
                }
                _ => return Err(ConfigParseError::new(entry, "unknown key")),
            }
        }
        Ok(config)
    }

    /// The algorithm tag the CSV result sheet reports.
    pub fn algorithm_name(&self) -> String {
        format!("{}{}", self.algorithm.name(), self.mode_seq.name())
    }
}

fn parse_num<T: std::str::FromStr>(entry: &str, value: &str) -> Result<T, ConfigParseError> {
    value
        .parse()
        .map_err(|_| ConfigParseError::new(entry, "expected a number"))
}

fn parse_float(entry: &str, value: &str) -> Result<f64, ConfigParseError> {
    value
        .parse()
        .map_err(|_| ConfigParseError::new(entry, "expected a float"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_sequences_match_their_tags() {
        assert_eq!(ModeSeq::Acsr.modes().len(), 4);
        assert_eq!(ModeSeq::Arbcs.modes()[0], MoveMode::ArBoth);
        assert_eq!(ModeSeq::Arrcs.modes(), &[MoveMode::ArRand, MoveMode::Change, MoveMode::Swap]);
    }

    #[test]
    fn parses_inline_config() {
        let config =
            SolverConfig::parse("alg=tabu-rand; seq=ACSR; blockSwap=part; blockSwapRadius=3")
                .unwrap();
        assert_eq!(config.algorithm, SolveAlgorithm::TabuSearchRand);
        assert_eq!(config.mode_seq, ModeSeq::Acsr);
        assert_eq!(config.block_swap_variant, BlockSwapVariant::Part);
        assert_eq!(config.block_swap_radius, 3);
        assert_eq!(config.algorithm_name(), "Tabu[Rand][ACSR]");
    }

    #[test]
    fn rejects_unknown_entries() {
        assert!(SolverConfig::parse("alg=annealing").is_err());
        assert!(SolverConfig::parse("nonsense").is_err());
        assert!(SolverConfig::parse("seq=XYZ").is_err());
        assert!(SolverConfig::parse("").is_ok());
    }
}

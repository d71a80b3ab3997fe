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

//! One weekly solve: load scenario/history/week data, search until the
//! deadline, write the solution listing, the history snapshot for the
//! next week, and a row in the shared CSV result sheet.

use chrono::Local;
use clap::{Command, arg};
use nurse_roster_core::prelude::AMP;
use nurse_roster_model::prelude::*;
use nurse_roster_solver::prelude::*;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Seconds granted per nurse-count bracket when `--timeout` is absent,
/// optionally overridden by a `timeout.txt` table of
/// `<nurse count> <seconds>` lines next to the working directory.
const DEFAULT_TIMEOUTS: [(usize, f64); 5] =
    [(20, 10.0), (40, 30.0), (60, 60.0), (80, 120.0), (usize::MAX, 240.0)];

fn cli() -> Command {
    Command::new("nurse-roster")
        .about("Weekly INRC-II nurse rostering solve")
        .arg(arg!(--id <ID> "Run identifier for the result sheet").default_value("run"))
        .arg(arg!(--config <CONFIG> "Inline solver configuration string"))
        .arg(arg!(--sce <FILE> "Scenario file").required(true).value_parser(clap::value_parser!(PathBuf)))
        .arg(arg!(--his <FILE> "Initial history file").value_parser(clap::value_parser!(PathBuf)))
        .arg(arg!(--week <FILE> "Week data file").required(true).value_parser(clap::value_parser!(PathBuf)))
        .arg(arg!(--sol <FILE> "Solution file to write").value_parser(clap::value_parser!(PathBuf)))
        .arg(arg!(--timeout <SECONDS> "Wall-clock budget in seconds").value_parser(clap::value_parser!(f64)))
        .arg(arg!(--rand <SEED> "Random seed").default_value("42").value_parser(clap::value_parser!(u64)))
        .arg(
            arg!(--"cus-in" <FILE> "History snapshot from the previous week")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"cus-out" <FILE> "History snapshot for the next week")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--log <FILE> "Shared CSV result sheet")
                .default_value("log.csv")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn table_timeout(nurse_num: usize) -> f64 {
    if let Ok(text) = std::fs::read_to_string("timeout.txt") {
        let mut entries: Vec<(usize, f64)> = text
            .lines()
            .filter_map(|line| {
                let mut it = line.split_whitespace();
                Some((it.next()?.parse().ok()?, it.next()?.parse().ok()?))
            })
            .collect();
        entries.sort_by_key(|e| e.0);
        for (count, seconds) in entries {
            if nurse_num <= count {
                return seconds;
            }
        }
    }
    DEFAULT_TIMEOUTS
        .iter()
        .find(|(count, _)| nurse_num <= *count)
        .map(|(_, seconds)| *seconds)
        .unwrap_or(240.0)
}

fn load_history(
    cus_in: Option<&PathBuf>,
    his: Option<&PathBuf>,
    scenario: &Scenario,
) -> Result<History, Box<dyn std::error::Error>> {
    if let Some(path) = cus_in {
        let file = File::open(path)?;
        let history: History = serde_json::from_reader(file)?;
        return Ok(history);
    }
    if let Some(path) = his {
        return Ok(HistoryLoader::new().from_path(path, scenario)?);
    }
    Ok(History::initial(scenario.nurse_num()))
}

/// Advisory lock around the shared result sheet; other solves on the
/// same machine append concurrently.
struct SheetLock {
    path: PathBuf,
}

impl SheetLock {
    fn acquire(sheet: &Path) -> std::io::Result<SheetLock> {
        let path = sheet.with_extension("csv.lock");
        for _ in 0..200 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(SheetLock { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    std::thread::sleep(Duration::from_millis(25));
                }
                Err(e) => return Err(e),
            }
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "result sheet stayed locked",
        ))
    }
}

impl Drop for SheetLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[allow(clippy::too_many_arguments)]
fn append_result_row(
    sheet: &Path,
    id: &str,
    instance: &str,
    solver: &RosterSolver<'_>,
    feasible: bool,
    acc_obj_value: i64,
) -> std::io::Result<()> {
    let _lock = SheetLock::acquire(sheet)?;
    let fresh = std::fs::metadata(sheet).map(|m| m.len() == 0).unwrap_or(true);
    let mut file = OpenOptions::new().append(true).create(true).open(sheet)?;
    if fresh {
        writeln!(
            file,
            "Time,ID,Instance,Algorithm,RandSeed,Gen,Iter,Duration,Feasible,Check-Obj,ObjValue,AccObjValue,Solution"
        )?;
    }
    let obj = solver.optima().obj_value();
    writeln!(
        file,
        "{},{},{},{},{},{},{},{:.3}s,{},{},{},{},{}",
        Local::now().format("%Y-%m-%d %a %H:%M:%S"),
        id,
        instance,
        solver.algorithm_name(),
        solver.seed(),
        solver.generation_count(),
        solver.iter_count(),
        solver.optima().find_time().as_secs_f64(),
        feasible,
        solver.check_obj_gap() as f64 / AMP as f64,
        obj.unscaled(),
        (obj.value() + acc_obj_value) as f64 / AMP as f64,
        solver.optima().roster().serialize_compact(),
    )
}

fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    let sce_path = matches.get_one::<PathBuf>("sce").expect("required");
    let week_path = matches.get_one::<PathBuf>("week").expect("required");
    let id = matches.get_one::<String>("id").expect("defaulted").clone();
    let seed = *matches.get_one::<u64>("rand").expect("defaulted");
    let sheet = matches.get_one::<PathBuf>("log").expect("defaulted").clone();

    let config = match matches.get_one::<String>("config") {
        Some(text) => SolverConfig::parse(text)?,
        None => SolverConfig::default(),
    };

    let scenario = ScenarioLoader::new().from_path(sce_path)?;
    let history = load_history(
        matches.get_one::<PathBuf>("cus-in"),
        matches.get_one::<PathBuf>("his"),
        &scenario,
    )?;
    let week = WeekDataLoader::new().from_path(week_path, &scenario)?;
    let acc_obj_value = history.acc_obj_value;
    let problem = RosterProblem::new(scenario, week, history)?;

    let seconds = matches
        .get_one::<f64>("timeout")
        .copied()
        .unwrap_or_else(|| table_timeout(problem.scenario().nurse_num()));
    tracing::info!(
        "solving {} ({} nurses) for {seconds}s, seed {seed}",
        problem.scenario().name(),
        problem.scenario().nurse_num()
    );

    let mut solver = RosterSolver::new(&problem, config, seed, Duration::from_secs_f64(seconds));
    let feasible = match solver.init() {
        Ok(()) => {
            solver.solve();
            true
        }
        Err(e) => {
            tracing::error!("no feasible assignment: {e}");
            false
        }
    };

    if let Some(path) = matches.get_one::<PathBuf>("sol") {
        let mut out = BufWriter::new(File::create(path)?);
        solver
            .optima()
            .roster()
            .write_solution(problem.scenario(), &mut out)?;
    }
    if let Some(path) = matches.get_one::<PathBuf>("cus-out") {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &solver.gen_history())?;
    }

    append_result_row(
        &sheet,
        &id,
        problem.scenario().name(),
        &solver,
        feasible && solver.feasible(),
        acc_obj_value,
    )?;

    println!(
        "obj: {} (feasible: {})",
        solver.optima().obj_value().unscaled(),
        feasible && solver.feasible()
    );
    Ok(if feasible { 0 } else { 1 })
}

fn main() {
    enable_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("fatal: {e}");
            std::process::exit(2);
        }
    }
}

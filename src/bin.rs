extern crate cdclsat;
extern crate fern;
extern crate log;

use std::env;
use std::process;
use std::str::FromStr;
use std::time::Instant;

use cdclsat::parser::parse_file;
use cdclsat::solver::{Solver, SolverConfig, SolverResult};

fn main() {
    if let Err(err) = setup_logger() {
        eprintln!("Could not set up logging: {}", err);
    }
    let args: Vec<String> = env::args().collect();
    let (filepath, config) = match parse_args(&args[1..]) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("{}\nusage: cdclsat [--conflicts N] <file>", message);
            process::exit(1);
        }
    };

    let total_start = Instant::now();

    let start = Instant::now();
    let dimacs = match parse_file(&filepath) {
        Ok(dimacs) => dimacs,
        Err(err) => {
            eprintln!("{}: {}", filepath, err);
            process::exit(1);
        }
    };
    let to_parse = start.elapsed();

    let start = Instant::now();
    let mut solver = match Solver::build(dimacs.num_vars, dimacs.clauses, config) {
        Ok(solver) => solver,
        Err(err) => {
            eprintln!("{}: {}", filepath, err);
            process::exit(1);
        }
    };
    let to_init = start.elapsed();

    let start = Instant::now();
    let result = match solver.solve() {
        Ok(result) => result,
        Err(err) => {
            eprintln!("{}: {}", filepath, err);
            process::exit(1);
        }
    };
    let to_solve = start.elapsed();

    let total = total_start.elapsed();

    let code = match result {
        SolverResult::Sat(ref model) => {
            println!("s SATISFIABLE\n{}", model);
            10
        }
        SolverResult::Unsat => {
            println!("s UNSATISFIABLE");
            20
        }
        SolverResult::Unknown => {
            println!("s UNKNOWN");
            0
        }
    };
    println!(
        "c {} in {:?} ===== {:?} to parse | {:?} to init | {:?} to solve | {} conflicts",
        filepath,
        total,
        to_parse,
        to_init,
        to_solve,
        solver.stats().conflicts
    );
    process::exit(code);
}

fn parse_args(args: &[String]) -> Result<(String, SolverConfig), String> {
    let mut config = SolverConfig::default();
    let mut filepath = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--conflicts" {
            let limit = iter
                .next()
                .and_then(|value| u64::from_str(value).ok())
                .ok_or_else(|| "--conflicts expects a number".to_string())?;
            config = config.conflict_limit(limit);
        } else if filepath.is_none() {
            filepath = Some(arg.clone());
        } else {
            return Err(format!("unexpected argument {}", arg));
        }
    }
    filepath
        .map(|path| (path, config))
        .ok_or_else(|| "No file path given".to_string())
}

fn setup_logger() -> Result<(), fern::InitError> {
    if let Ok(level) = env::var("LOG") {
        let level = log::LevelFilter::from_str(&level).unwrap_or(log::LevelFilter::Trace);
        fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!("[{}] {}", record.level(), message))
            })
            .level(level)
            .chain(std::io::stdout())
            .chain(fern::log_file("output.log")?)
            .apply()?;
    }
    Ok(())
}

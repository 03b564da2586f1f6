//! Command-line level generator.
//!
//! ```text
//! levelgen <levels.xml> [--level NAME] [--seed N] [--max-iterations N]
//!          [--tries N] [--config run.json] [--save-config run.json] [--animate]
//! ```
//!
//! Without `--config` the grid size comes from the level. Flags override
//! config values. A failed attempt is retried with the next seed until
//! `tries` attempts have been made.
//!
//! Logging is controlled with `RUST_LOG`, e.g.
//! `RUST_LOG=levelgen_core=trace` to see every collapse.

use levelgen_core::wfc::{observe_with, Solver, StepResult};
use levelgen_core::{
    generate, render_ascii, GenerationConfig, GenerationResult, LevelSet, NoOpObserver,
    TileCatalog,
};
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::thread;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: levelgen <levels.xml> [--level NAME] [--seed N] [--max-iterations N] \
[--tries N] [--config run.json] [--save-config run.json] [--animate]";

#[derive(Debug, Default)]
struct CliArgs {
    levels: PathBuf,
    level: Option<String>,
    seed: Option<u64>,
    max_iterations: Option<usize>,
    tries: Option<usize>,
    config: Option<PathBuf>,
    save_config: Option<PathBuf>,
    animate: bool,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut parsed = CliArgs::default();
        let mut levels = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--level" => parsed.level = Some(flag_value(&mut args, &arg)?),
                "--seed" => parsed.seed = Some(flag_value(&mut args, &arg)?),
                "--max-iterations" => parsed.max_iterations = Some(flag_value(&mut args, &arg)?),
                "--tries" => parsed.tries = Some(flag_value(&mut args, &arg)?),
                "--config" => parsed.config = Some(flag_value(&mut args, &arg)?),
                "--save-config" => parsed.save_config = Some(flag_value(&mut args, &arg)?),
                "--animate" => parsed.animate = true,
                "-h" | "--help" => return Err(USAGE.to_string()),
                flag if flag.starts_with("--") => {
                    return Err(format!("unknown flag {}\n{}", flag, USAGE))
                }
                _ if levels.is_none() => levels = Some(PathBuf::from(arg)),
                _ => return Err(format!("unexpected argument {}\n{}", arg, USAGE)),
            }
        }

        parsed.levels = levels.ok_or_else(|| USAGE.to_string())?;
        Ok(parsed)
    }
}

fn flag_value<T: FromStr>(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<T, String> {
    let value = args
        .next()
        .ok_or_else(|| format!("{} requires a value", flag))?;
    value
        .parse()
        .map_err(|_| format!("invalid value '{}' for {}", value, flag))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether a complete layout was produced.
fn run(args: &CliArgs) -> Result<bool, Box<dyn Error>> {
    let levels = LevelSet::load(&args.levels)?;
    let level = match &args.level {
        Some(name) => levels.level(name)?,
        None => levels
            .levels()
            .first()
            .ok_or("level document contains no levels")?,
    };
    let catalog = level.catalog()?;

    let mut config = match &args.config {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::from_level(level),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(tries) = args.tries {
        config.tries = tries;
    }
    config.validate()?;
    if let Some(path) = &args.save_config {
        config.save(path)?;
    }

    info!(
        level = %level.name,
        rows = config.rows,
        cols = config.cols,
        tiles = catalog.len(),
        seed = config.seed,
        "generating layout"
    );

    for attempt in 0..config.tries {
        let seed = config.seed.wrapping_add(attempt as u64);
        let attempt_config = config.clone().with_seed(seed);

        let result = if args.animate {
            animate(&catalog, &attempt_config)?
        } else {
            let mut observer = observe_with(|p| {
                debug!(
                    pos = %p.pos,
                    x = p.world.x,
                    y = p.world.y,
                    tile = %p.tile.name,
                    visual = %p.tile.visual,
                    "placed tile"
                )
            });
            generate(&catalog, &attempt_config, &mut observer)?
        };

        match result {
            GenerationResult::Success(grid) => {
                print!("{}", render_ascii(&grid.map(|_, t| Some(*t)), &catalog));
                info!(attempt, seed, "layout complete");
                return Ok(true);
            }
            GenerationResult::Failure(reason) => {
                warn!(attempt, seed, %reason, "attempt failed");
            }
            GenerationResult::Partial {
                assignment,
                cells_remaining,
            } => {
                print!("{}", render_ascii(&assignment, &catalog));
                warn!(seed, cells_remaining, "stopped at iteration limit");
                return Ok(false);
            }
        }
    }

    error!(tries = config.tries, "no attempt produced a layout");
    Ok(false)
}

/// Step once per tick, redrawing the partial layout each time.
fn animate(
    catalog: &TileCatalog,
    config: &GenerationConfig,
) -> Result<GenerationResult, Box<dyn Error>> {
    let mut solver = Solver::new(catalog, config)?;
    let mut stdout = io::stdout();

    while let StepResult::Collapsed { .. } = solver.step(&mut NoOpObserver) {
        write!(
            stdout,
            "\x1b[2J\x1b[H{}",
            render_ascii(&solver.wave().assignment(), catalog)
        )?;
        stdout.flush()?;
        thread::sleep(config.step_delay());
    }

    Ok(solver.result())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, String> {
        CliArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_flags() {
        let args = parse(&[
            "levels.xml",
            "--level",
            "meadow",
            "--seed",
            "42",
            "--max-iterations",
            "9",
            "--animate",
        ])
        .unwrap();
        assert_eq!(args.levels, PathBuf::from("levels.xml"));
        assert_eq!(args.level.as_deref(), Some("meadow"));
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.max_iterations, Some(9));
        assert_eq!(args.tries, None);
        assert!(args.animate);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[]).is_err(), "levels path is required");
        assert!(parse(&["a.xml", "--seed"]).is_err());
        assert!(parse(&["a.xml", "--seed", "many"]).is_err());
        assert!(parse(&["a.xml", "--bogus"]).is_err());
        assert!(parse(&["a.xml", "b.xml"]).is_err());
    }
}

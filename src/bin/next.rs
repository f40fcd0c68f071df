//! CLI entry point: load particles, configure the thread pool, and run
//! until the user quits or the process is killed (spec §6).

use std::process::ExitCode;

use clap::Parser;
use simplelog::{ColorChoice, Config as LogConfig, LevelFilter, TermLogger, TerminalMode};

use next::config::{BhConfig, RunConfig, SnapshotFormat};
use next::error::NextError;
use next::rank::RankContext;
use next::{io, run};

/// N-body gravitational simulator using a Barnes-Hut octree.
#[derive(Debug, Parser)]
#[command(name = "next", about = "N-body gravitational simulator using a Barnes-Hut octree")]
struct Cli {
    /// Path to the initial-condition file (ASCII, or HDF5 with `hdf5-io`).
    input: String,
    /// Worker thread count for the rayon pool.
    threads: usize,
    /// Base timestep, scaled down adaptively as particle speeds rise.
    dt: f64,
    /// Simulation-time interval between snapshot writes.
    dump_interval: f64,
    /// Snapshot format: vtk, vtu, or hdf5.
    format: SnapshotFormat,
}

fn main() -> ExitCode {
    TermLogger::init(LevelFilter::Info, LogConfig::default(), TerminalMode::Mixed, ColorChoice::Auto)
        .expect("logger already initialized");

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("next: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> next::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // `--help`/`--version` aren't usage errors: print and exit 0, same as
        // the derive's default `parse()` would (spec §6 exit code 1 applies
        // only to actual argument errors).
        Err(e) if matches!(e.kind(), clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => return Err(NextError::Usage(e.to_string())),
    };

    if cli.threads == 0 {
        return Err(NextError::Usage("thread count must be at least 1".into()));
    }
    if !(cli.dt.is_finite() && cli.dt > 0.0) {
        return Err(NextError::Usage("dt must be a positive, finite number".into()));
    }
    if !(cli.dump_interval.is_finite() && cli.dump_interval > 0.0) {
        return Err(NextError::Usage("dump-interval must be a positive, finite number".into()));
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
        .map_err(|e| NextError::Usage(format!("failed to start thread pool: {e}")))?;

    let rank = init_rank();

    let particles = io::load_particles(&cli.input)?;
    log::info!("loaded {} particles from {}", particles.len(), cli.input);

    let config = RunConfig {
        input_path: cli.input,
        threads: cli.threads,
        dt0: cli.dt,
        dump_interval: cli.dump_interval,
        format: cli.format,
        bh: BhConfig::default(),
    };

    run::run(particles, &config, &rank)
}

#[cfg(feature = "mpi")]
fn init_rank() -> RankContext {
    use mpi::traits::Communicator;

    match mpi::initialize() {
        Some(universe) => {
            // Leaked deliberately: MPI must stay initialized for the life of
            // the process, and `main` has no natural place to hold it.
            let universe = Box::leak(Box::new(universe));
            RankContext::from_world(universe.world())
        }
        None => {
            log::warn!("MPI failed to initialize; running single-rank");
            RankContext::single()
        }
    }
}

#[cfg(not(feature = "mpi"))]
fn init_rank() -> RankContext {
    RankContext::single()
}

//! vmsim - Main Entry Point
//!
//! Usage: vmsim [OPTIONS] <npages> <nframes> <rand|fifo|custom> <scan|sort|focus|mean_mode|count_sort>
//!
//! Runs the selected program over an `npages`-page address space backed by
//! `nframes` physical frames and prints the fault and disk I/O summary.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use env_logger::Env;

use vmsim::storage::page::DEFAULT_DISK_PATH;
use vmsim::{PolicyKind, Program, Result, SimConfig, Simulation};

/// Demand-paged virtual memory simulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of virtual pages
    npages: usize,

    /// Number of physical frames
    nframes: usize,

    /// Page replacement policy: rand, fifo or custom
    policy: String,

    /// Program to run: scan, sort, focus, mean_mode or count_sort
    program: String,

    /// Seed for random eviction (default: seeded from the OS)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Path of the simulated disk file
    #[arg(short, long, default_value = DEFAULT_DISK_PATH)]
    disk: PathBuf,

    /// Log every fault, eviction and write-back
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let policy: PolicyKind = args.policy.parse()?;
    let program: Program = args.program.parse()?;

    let mut config =
        SimConfig::new(args.npages, args.nframes, policy, program).with_disk_path(args.disk.clone());
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let mut sim = Simulation::new(config)?;
    let result = sim.run()?;

    println!("{result}");
    println!("\n{}\n", sim.stats());
    Ok(())
}

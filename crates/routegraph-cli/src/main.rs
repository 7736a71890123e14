//! `routegraph` command-line tool.
//!
//! `run` answers a line-protocol stream (file or stdin) against a live graph
//! store with temporal history. `verify` cross-checks the query engine
//! against exhaustive search on random graphs and prints a JSON report.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use routegraph_cli::{run_protocol, RunOptions};
use routegraph_core::Directedness;
use routegraph_query::verify::{run_verification, VerifyConfig};
use routegraph_query::{Resolution, SearchConfig};

/// Dynamic constrained shortest-path engine.
#[derive(Parser)]
#[command(name = "routegraph", about = "Dynamic constrained shortest-path engine")]
struct Cli {
    /// Log to stderr; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a line-protocol stream.
    Run {
        /// Protocol input file (default: stdin).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Treat edges as one-way.
        #[arg(long)]
        directed: bool,

        /// Print one JSON object per result.
        #[arg(long)]
        json: bool,

        /// Buckets per constrained resource.
        #[arg(long, default_value_t = 64, conflicts_with = "exact")]
        buckets: u32,

        /// Exact Pareto labels instead of buckets.
        #[arg(long)]
        exact: bool,
    },

    /// Cross-check the engine against brute force on random graphs.
    Verify {
        /// Number of random graph/query pairs.
        #[arg(short = 'n', long)]
        iterations: u32,

        /// PRNG seed (default: derived from the clock).
        #[arg(short, long)]
        seed: Option<u64>,

        /// Largest generated graph.
        #[arg(long, default_value_t = 6)]
        nodes: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Run {
            input,
            directed,
            json,
            buckets,
            exact,
        } => {
            let options = RunOptions {
                directedness: if directed {
                    Directedness::Directed
                } else {
                    Directedness::Undirected
                },
                json,
                search: SearchConfig {
                    resolution: if exact {
                        Resolution::Exact
                    } else {
                        Resolution::Buckets(buckets)
                    },
                    ..SearchConfig::default()
                },
            };
            run(input, options)
        }
        Commands::Verify {
            iterations,
            seed,
            nodes,
        } => verify(iterations, seed, nodes),
    };
    process::exit(exit_code);
}

/// Returns exit code: 0 = success, 1 = protocol error, 3 = I/O error.
fn run(input: Option<PathBuf>, options: RunOptions) -> i32 {
    let stdout = io::stdout();
    let result = match input {
        Some(path) => match File::open(&path) {
            Ok(file) => run_protocol(BufReader::new(file), stdout.lock(), options),
            Err(e) => {
                eprintln!("Error: failed to open '{}': {}", path.display(), e);
                return 3;
            }
        },
        None => run_protocol(io::stdin().lock(), stdout.lock(), options),
    };
    match result {
        Ok(summary) => {
            tracing::info!(?summary, "run complete");
            0
        }
        Err(routegraph_cli::CliError::Io(e)) => {
            eprintln!("I/O error: {}", e);
            3
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// Returns exit code: 0 = all iterations agree, 1 = disagreement or error.
fn verify(iterations: u32, seed: Option<u64>, nodes: usize) -> i32 {
    let random_seed = seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    let config = VerifyConfig {
        iterations,
        random_seed,
        max_nodes: nodes,
        ..VerifyConfig::default()
    };
    let result = match run_verification(&config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let json = serde_json::to_string_pretty(&result)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
    if result.is_success() {
        0
    } else {
        1
    }
}

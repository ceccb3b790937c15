// PBVI Control CLI
// Solve, sweep and simulate finite POMDPs from the command line

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pbvictl")]
#[command(about = "Point-based value iteration for POMDPs", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve for the action at one belief
    Solve {
        /// Belief as label=probability pairs, e.g. tiger-left=0.5,tiger-right=0.5
        #[arg(short, long)]
        belief: String,

        #[command(flatten)]
        problem: ProblemArgs,

        /// Print the full solution as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the policy at evenly spaced beliefs of a two-state problem
    Sweep {
        /// Number of intervals between the two point beliefs
        #[arg(long, default_value = "20")]
        steps: usize,

        #[command(flatten)]
        problem: ProblemArgs,
    },

    /// Roll out the solved policy in the simulator
    Simulate {
        /// Number of episodes
        #[arg(long, default_value = "100")]
        episodes: usize,

        /// Steps per episode
        #[arg(long, default_value = "20")]
        horizon: usize,

        /// Random seed for the simulator
        #[arg(long)]
        seed: Option<u64>,

        /// Initial belief as label=probability pairs (uniform when omitted)
        #[arg(short, long)]
        belief: Option<String>,

        /// Also evaluate a uniformly random policy
        #[arg(long)]
        baseline: bool,

        /// Write the PBVI episode summaries to this JSON file
        #[arg(long)]
        episode_log: Option<PathBuf>,

        #[command(flatten)]
        problem: ProblemArgs,
    },
}

/// Problem selection and solver overrides shared by every command
#[derive(Args, Clone)]
struct ProblemArgs {
    /// "tiger" or a path to a tabular POMDP JSON file
    #[arg(short, long, default_value = "tiger")]
    problem: String,

    /// Solver configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Discount factor
    #[arg(long)]
    discount: Option<f64>,

    /// Improve/Expand rounds
    #[arg(long)]
    rounds: Option<usize>,

    /// Decimal places for rounding and alpha-vector equality
    #[arg(long)]
    places: Option<u32>,

    /// Action label of the pessimistic seed vector
    #[arg(long)]
    seed_action: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Solve {
            belief,
            problem,
            json,
        } => commands::solve(&problem, &belief, json),
        Commands::Sweep { steps, problem } => commands::sweep(&problem, steps),
        Commands::Simulate {
            episodes,
            horizon,
            seed,
            belief,
            baseline,
            episode_log,
            problem,
        } => {
            let options = commands::SimulateOptions {
                episodes,
                horizon,
                seed,
                belief,
                baseline,
                episode_log,
            };
            commands::simulate(&problem, &options).await
        }
    }
}

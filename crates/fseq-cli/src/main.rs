//! `fseq` — command-line surface for the fluorosequencing classification
//! engine (spec §6): `classify hmm|ann|hybrid`, `simulate rad`, and `fit`.

mod commands;
mod model_args;

use anyhow::Result;
use clap::{Parser, Subcommand};
use model_args::ModelArgs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fseq", about = "Fluorosequencing classification engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify radiometries against a dye-sequence library.
    Classify {
        #[command(subcommand)]
        mode: ClassifyMode,
    },
    /// Generate synthetic radiometries from a dye-sequence library.
    Simulate {
        #[command(subcommand)]
        mode: SimulateMode,
    },
    /// Re-estimate a sequencing model's parameters via Baum-Welch.
    Fit {
        /// Dye-sequences library file (spec §6).
        #[arg(long)]
        dye_seqs: PathBuf,
        /// Radiometries file, paired by replicate position with `--dye-seqs`.
        #[arg(long)]
        radiometries: PathBuf,
        /// Optional fit-settings JSON (spec §6); missing fields default to "fit, don't hold".
        #[arg(long)]
        fit_settings: Option<PathBuf>,
        /// Number of Baum-Welch iterations to run.
        #[arg(long, default_value_t = 1)]
        iterations: usize,
        /// Distribution cutoff `k` for emission pruning (spec §4.8); omit for no pruning.
        #[arg(long)]
        sig: Option<f64>,
        /// Where to write the re-estimated model, as JSON.
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        model_args: ModelArgs,
    },
}

#[derive(Subcommand, Debug)]
enum ClassifyMode {
    /// Score every radiometry against every library candidate via the full HMM.
    Hmm {
        #[arg(long)]
        dye_seqs: PathBuf,
        #[arg(long)]
        radiometries: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Distribution cutoff `k` for emission pruning; omit for no pruning.
        #[arg(long)]
        sig: Option<f64>,
        #[command(flatten)]
        model_args: ModelArgs,
    },
    /// Classify by a pure weighted k-NN vote over a dye-tracks corpus (no HMM).
    Ann {
        #[arg(long)]
        dye_tracks: PathBuf,
        #[arg(long)]
        radiometries: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Number of nearest dye tracks to vote with.
        #[arg(long, default_value_t = 10)]
        k: usize,
        #[command(flatten)]
        model_args: ModelArgs,
    },
    /// Use a k-NN short-list to narrow candidates, then run the HMM on just those.
    Hybrid {
        #[arg(long)]
        dye_seqs: PathBuf,
        #[arg(long)]
        radiometries: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Number of nearest dye tracks to consider when building the short-list.
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Short-list size handed to the HMM.
        #[arg(long, default_value_t = 10)]
        h: usize,
        #[arg(long)]
        sig: Option<f64>,
        #[command(flatten)]
        model_args: ModelArgs,
    },
}

#[derive(Subcommand, Debug)]
enum SimulateMode {
    /// Monte Carlo radiometries from a dye-sequences library.
    Rad {
        #[arg(long)]
        dye_seqs: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Number of imaging cycles to simulate.
        #[arg(long)]
        num_timesteps: usize,
        /// RNG seed, for reproducible runs.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[command(flatten)]
        model_args: ModelArgs,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Classify { mode } => match mode {
            ClassifyMode::Hmm {
                dye_seqs,
                radiometries,
                out,
                sig,
                model_args,
            } => commands::classify::classify_hmm(dye_seqs, radiometries, out, &model_args, sig),
            ClassifyMode::Ann {
                dye_tracks,
                radiometries,
                out,
                k,
                model_args,
            } => commands::classify::classify_ann(dye_tracks, radiometries, out, &model_args, k),
            ClassifyMode::Hybrid {
                dye_seqs,
                radiometries,
                out,
                k,
                h,
                sig,
                model_args,
            } => commands::classify::classify_hybrid(
                dye_seqs,
                radiometries,
                out,
                &model_args,
                k,
                h,
                sig,
            ),
        },
        Command::Simulate { mode } => match mode {
            SimulateMode::Rad {
                dye_seqs,
                out,
                num_timesteps,
                seed,
                model_args,
            } => commands::simulate::simulate_rad(dye_seqs, out, &model_args, num_timesteps, seed),
        },
        Command::Fit {
            dye_seqs,
            radiometries,
            fit_settings,
            iterations,
            sig,
            out,
            model_args,
        } => commands::fit::fit(
            dye_seqs,
            radiometries,
            fit_settings,
            &model_args,
            iterations,
            sig,
            out,
        ),
    }
}

use chrono::Local;
use clap::{Args as ClapArgs, Parser, Subcommand};
use env_logger::{Builder, Env};
use log::{LevelFilter, info};
use rayon::ThreadPoolBuilder;
use std::path::{Path, PathBuf};

use crate::config::{DEFAULT_SEED, PipelineConfig};
use crate::error::{CustomError, Result};
use crate::kinship::{KinshipThresholds, flag_unexpected, summarize};
use crate::model::Sample;
use crate::output::{
    write_background_matrix, write_coordinates, write_flagged_pairs, write_kinship_summary,
    write_probabilities, write_summary,
};
use crate::pipeline::{build_cohort, predict_ancestry};
use crate::reader::labels::{DEFAULT_LABEL_COLUMN, LabelPanel};
use crate::reader::pairs::read_pairs;
use crate::reader::somalier::read_samples;

const LOG_ENV: &str = "ANCESTRY_LOG";

fn default_output_directory() -> String {
    format!("ancestry_output_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Predict genetic ancestry from somalier site-count files.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fit PCA + SVM on a labelled background panel and classify query samples.
    Predict(PredictArgs),
    /// Flag pairs expected to be unrelated that share too few IBS0 sites.
    Kinship(KinshipArgs),
}

#[derive(ClapArgs, Debug)]
pub struct PredictArgs {
    /// Tab-separated label panel; the first column holds sample ids.
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub labels: PathBuf,

    /// Column of the label panel holding the population label.
    #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
    pub label_column: String,

    /// .somalier files of the labelled background samples.
    #[arg(short, long, num_args = 1.., required = true)]
    pub backgrounds: Vec<PathBuf>,

    /// .somalier files of the samples to classify.
    #[arg(short, long, num_args = 1..)]
    pub samples: Vec<PathBuf>,

    /// Output directory.
    #[arg(
        short,
        long,
        value_hint = clap::ValueHint::DirPath,
        default_value_t = default_output_directory()
    )]
    pub output_directory: String,

    /// Prefix of the output file names.
    #[arg(long, default_value = "ancestry")]
    pub prefix: String,

    /// Seed of the randomized PCA and the calibration folds.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Number of threads used to decode input files.
    #[arg(short, long)]
    pub threads: Option<usize>,
}

#[derive(ClapArgs, Debug)]
pub struct KinshipArgs {
    /// somalier pairs TSV.
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub pairs: PathBuf,

    /// Unrelated pairs with fewer IBS0 sites than this are flagged.
    #[arg(long, default_value_t = KinshipThresholds::default().max_unrelated_ibs0)]
    pub max_ibs0: f64,

    /// Output directory.
    #[arg(
        short,
        long,
        value_hint = clap::ValueHint::DirPath,
        default_value_t = default_output_directory()
    )]
    pub output_directory: String,

    /// Prefix of the output file names.
    #[arg(long, default_value = "kinship")]
    pub prefix: String,
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init_logger(verbose: u8) {
    Builder::new()
        .filter_level(level_filter(verbose))
        .parse_env(Env::default().filter(LOG_ENV))
        .init();
}

fn create_output_dir(dir: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| CustomError::OutputDir { source: e })?;
    Ok(PathBuf::from(dir))
}

fn print_paths(label: &str, paths: &[PathBuf]) {
    match paths {
        [] => println!("{label}: (none)"),
        [only] => println!("{label}: {}", only.display()),
        [first, ..] => println!(
            "{label}: {} (+{} more)",
            first.display(),
            paths.len() - 1
        ),
    }
}

fn decode_all(paths: &[PathBuf], threads: Option<usize>) -> Result<Vec<Sample>> {
    match threads {
        Some(n) => {
            let pool = ThreadPoolBuilder::new().num_threads(n).build()?;
            pool.install(|| read_samples(paths))
        }
        None => read_samples(paths),
    }
}

fn output_path(dir: &Path, prefix: &str, name: &str) -> PathBuf {
    dir.join(format!("{prefix}.{name}"))
}

pub fn run_predict(args: &PredictArgs) -> Result<()> {
    let output_dir = create_output_dir(&args.output_directory)?;
    println!("LABELS     : {}", args.labels.display());
    print_paths("BACKGROUNDS", &args.backgrounds);
    print_paths("SAMPLES    ", &args.samples);
    println!();

    let panel = LabelPanel::read(&args.labels, &args.label_column)?;
    info!("Read {} labels from {}", panel.len(), args.labels.display());

    let background = decode_all(&args.backgrounds, args.threads)?;
    let query = decode_all(&args.samples, args.threads)?;

    let config = PipelineConfig::with_seed(args.seed);
    let cohort = build_cohort(&background, &query, &panel, config.min_depth)?;
    let output = predict_ancestry(&cohort, &config)?;
    let report = &output.report;

    let npy_path = output_path(&output_dir, &args.prefix, "background.npy");
    println!("Writing background allele balances to {}...", npy_path.display());
    write_background_matrix(output.aligned.background().matrix(), &npy_path)?;

    let pcs_path = output_path(&output_dir, &args.prefix, "ancestry_pcs.csv");
    println!("Writing ancestry PCs to {}...", pcs_path.display());
    write_coordinates(&report.coordinates, &pcs_path)?;

    if let Some(probabilities) = &report.probabilities {
        let pred_path = output_path(&output_dir, &args.prefix, "ancestry_prediction.csv");
        println!("Writing ancestry predictions to {}...", pred_path.display());
        write_probabilities(probabilities, &pred_path)?;
    }

    let summary_path = output_path(&output_dir, &args.prefix, "summary.json");
    println!("Writing run summary to {}...", summary_path.display());
    write_summary(&output.aligned, &report.labels, args.seed, &summary_path)?;
    Ok(())
}

pub fn run_kinship(args: &KinshipArgs) -> Result<()> {
    let output_dir = create_output_dir(&args.output_directory)?;
    println!("PAIRS: {}", args.pairs.display());
    println!();

    let thresholds = KinshipThresholds {
        max_unrelated_ibs0: args.max_ibs0,
    };
    let pairs = read_pairs(&args.pairs)?;
    let flagged = flag_unexpected(&pairs, &thresholds);
    let summary = summarize(&pairs, &thresholds);
    for group in &summary {
        info!(
            "{}: {} pairs, {} flagged",
            group.group, group.n_pairs, group.n_flagged
        );
    }

    let flagged_path = output_path(&output_dir, &args.prefix, "unexpected_relatedness.csv");
    println!(
        "Writing {} unexpectedly related pairs to {}...",
        flagged.len(),
        flagged_path.display()
    );
    write_flagged_pairs(&flagged, &flagged_path)?;

    let summary_path = output_path(&output_dir, &args.prefix, "summary.csv");
    println!("Writing kinship summary to {}...", summary_path.display());
    write_kinship_summary(&summary, &summary_path)?;
    Ok(())
}

pub fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Predict(predict) => run_predict(predict),
        Command::Kinship(kinship) => run_kinship(kinship),
    }
}

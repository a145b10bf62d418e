use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use issue_classifier::{workflow, AppPaths, EvaluationMode, RuntimeConfig};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding Data/ and Models/ (defaults to two levels above the executable's directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Training data file, overrides <base-dir>/Data/issues_train.tsv
    #[arg(long)]
    train_data: Option<PathBuf>,

    /// Test data file, overrides <base-dir>/Data/issues_test.tsv
    #[arg(long)]
    test_data: Option<PathBuf>,

    /// Model file, overrides <base-dir>/Models/model.bin
    #[arg(long)]
    model: Option<PathBuf>,

    /// Seed for the trainer's shuffling
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// How the test data is scored
    #[arg(long, value_enum, default_value_t = EvaluationMode::Refit)]
    evaluation: EvaluationMode,
}

impl Args {
    fn into_config(self) -> RuntimeConfig {
        let base = AppPaths::from_base_dir(self.base_dir.unwrap_or_else(AppPaths::default_base_dir));
        RuntimeConfig {
            paths: AppPaths {
                train_data: self.train_data.unwrap_or(base.train_data),
                test_data: self.test_data.unwrap_or(base.test_data),
                model: self.model.unwrap_or(base.model),
            },
            seed: self.seed,
            evaluation: self.evaluation,
        }
    }
}

fn main() -> anyhow::Result<()> {
    issue_classifier::init_logger();
    let config = Args::parse().into_config();

    info!("=== Starting GitHub Issue Classifier ===");
    info!("Training data: {:?}", config.paths.train_data);
    info!("Test data: {:?}", config.paths.test_data);
    info!("Model: {:?}", config.paths.model);

    let start_time = Instant::now();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    workflow::run(&config, &mut out).context("Issue classification failed")?;

    info!("=== Done (took {:.2?}) ===", start_time.elapsed());
    Ok(())
}

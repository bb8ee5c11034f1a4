// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All work is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train` — train on MSR-VTT, keep the best checkpoint by
//                validation score, then score it on test
//   2. `test`  — score an existing checkpoint on test only
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TestArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "scn-captioner",
    version = "0.1.0",
    about = "Train and evaluate a semantic-compositional video captioner on MSR-VTT."
)]
pub struct Cli {
    /// The subcommand to run (train or test)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Test(args)  => run_test(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting run '{}' on corpus {}", args.name, args.data.corpus);
    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete.");
    Ok(())
}

fn run_test(args: TestArgs) -> Result<()> {
    use crate::application::test_use_case::TestUseCase;

    tracing::info!("Scoring checkpoint '{}' on the test split", args.checkpoint);
    TestUseCase::new(args.into()).execute()
}

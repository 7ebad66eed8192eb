// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
//   1. `summary` - build a model and check one forward pass
//   2. `config`  - write a model config JSON

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ConfigArgs, SummaryArgs};

use crate::application::summary_use_case::{ModelSettings, SummaryUseCase};

#[derive(Parser, Debug)]
#[command(
    name = "neural-stacking",
    version,
    about = "Inspect bidirectional LSTM taggers and their gated stacked variant."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Summary(args) => run_summary(args),
            Commands::Config(args)  => run_config(args),
        }
    }
}

fn run_summary(args: SummaryArgs) -> Result<()> {
    let json = args.json;
    let settings: ModelSettings = args.into();
    tracing::info!(
        "Building {} model",
        if settings.stacked { "stacked" } else { "single-stage" }
    );

    let report = SummaryUseCase::new(settings).execute()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", report.description);
    println!("  parameters:    {}", report.num_params);
    println!("  logits:        {:?}", report.logits_dims);
    println!("  hidden:        {:?}", report.hidden_dims);
    if report.shared_bottom {
        println!("  bottom encoder shared with a plain model");
    }
    Ok(())
}

fn run_config(args: ConfigArgs) -> Result<()> {
    let settings: ModelSettings = args.model.into();
    settings.save_model_config(&args.output)?;
    println!("Wrote {}", args.output);
    Ok(())
}

// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Two subcommands: `summary` and `config`.
// Both describe a model the same way, so they share
// ModelArgs via #[command(flatten)].

use clap::{Args, Subcommand};

use crate::application::summary_use_case::ModelSettings;
use crate::domain::cell::CellKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a model, run one random batch through it, and report its shapes
    Summary(SummaryArgs),

    /// Write a model config JSON that `summary --config` can read back
    Config(ConfigArgs),
}

/// Architecture flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Build the two-stage gated model instead of the single-stage one
    #[arg(long)]
    pub stacked: bool,

    /// Recurrent cell type (only LSTM is available)
    #[arg(long, default_value = "LSTM")]
    pub cell: CellKind,

    /// Vocabulary size
    #[arg(long, default_value_t = 10000)]
    pub ntoken: usize,

    /// Embedding width
    #[arg(long, default_value_t = 200)]
    pub ninp: usize,

    /// Encoder output width (both directions together, must be even)
    #[arg(long, default_value_t = 200)]
    pub nhid: usize,

    /// Number of stacked bidirectional layers per encoder
    #[arg(long, default_value_t = 2)]
    pub nlayers: usize,

    /// Dropout probability between stages
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Use the embedding table as the decoder weight (needs nhid == ninp)
    #[arg(long)]
    pub tie_weights: bool,

    /// Stacked only: bottom encoder width (defaults to nhid)
    #[arg(long)]
    pub bottom_nhid: Option<usize>,

    /// Stacked only: start the top encoder from a zero state
    #[arg(long)]
    pub reset_top_state: bool,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Read the architecture from this config JSON instead of the flags
    #[arg(long)]
    pub config: Option<String>,

    /// Stacked only: share the bottom encoder with a freshly built plain model
    #[arg(long)]
    pub share_bottom: bool,

    /// Number of leading tokens that get (synthetic) pretrained vectors
    #[arg(long, default_value_t = 0)]
    pub pretrained_rows: usize,

    #[arg(long, default_value_t = 35)]
    pub seq_len: usize,

    #[arg(long, default_value_t = 20)]
    pub batch_size: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Where to write the config JSON
    #[arg(long, default_value = "model_config.json")]
    pub output: String,
}

impl From<ModelArgs> for ModelSettings {
    fn from(a: ModelArgs) -> Self {
        ModelSettings {
            stacked:         a.stacked,
            cell:            a.cell,
            ntoken:          a.ntoken,
            ninp:            a.ninp,
            nhid:            a.nhid,
            nlayers:         a.nlayers,
            dropout:         a.dropout,
            tie_weights:     a.tie_weights,
            bottom_nhid:     a.bottom_nhid,
            reset_top_state: a.reset_top_state,
            ..ModelSettings::default()
        }
    }
}

/// The application layer never sees clap types.
impl From<SummaryArgs> for ModelSettings {
    fn from(a: SummaryArgs) -> Self {
        ModelSettings {
            config_path:     a.config,
            share_bottom:    a.share_bottom,
            pretrained_rows: a.pretrained_rows,
            seq_len:         a.seq_len,
            batch_size:      a.batch_size,
            ..ModelSettings::from(a.model)
        }
    }
}

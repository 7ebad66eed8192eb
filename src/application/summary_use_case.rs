// ============================================================
// Layer 2 - SummaryUseCase
// ============================================================
// Builds one model and pushes a single batch through it so a
// configuration can be checked before an external training
// loop picks it up:
//
//   Step 1: Resolve the model config      (file or flags)
//   Step 2: Synthesise pretrained vectors (first k tokens)
//   Step 3: Build the model               (Layer 5 - ml)
//   Step 4: Forward one random batch
//   Step 5: Report parameters and shapes
//
// Training, data loading and checkpointing are not part of
// this crate; the random batch only exercises the shapes.

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use rand::Rng;
use serde::Serialize;

use crate::domain::{cell::CellKind, embeddings::PretrainedEmbeddings};
use crate::ml::{RnnModelConfig, SequenceTagger, StackedRnnModelConfig};

#[cfg(not(feature = "wgpu"))]
type SummaryBackend = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
type SummaryBackend = burn::backend::Wgpu;

// ─── Model Settings ──────────────────────────────────────────────────────────
// Everything needed to build either architecture. When
// `config_path` is set the architecture fields come from that
// JSON file instead and only the batch shape is taken from here.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub config_path:     Option<String>,
    pub stacked:         bool,
    pub share_bottom:    bool,
    pub cell:            CellKind,
    pub ntoken:          usize,
    pub ninp:            usize,
    pub nhid:            usize,
    pub nlayers:         usize,
    pub dropout:         f64,
    pub tie_weights:     bool,
    pub bottom_nhid:     Option<usize>,
    pub reset_top_state: bool,
    pub pretrained_rows: usize,
    pub seq_len:         usize,
    pub batch_size:      usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            config_path:     None,
            stacked:         false,
            share_bottom:    false,
            cell:            CellKind::Lstm,
            ntoken:          10000,
            ninp:            200,
            nhid:            200,
            nlayers:         2,
            dropout:         0.5,
            tie_weights:     false,
            bottom_nhid:     None,
            reset_top_state: false,
            pretrained_rows: 0,
            seq_len:         35,
            batch_size:      20,
        }
    }
}

impl ModelSettings {
    pub fn rnn_config(&self) -> Result<RnnModelConfig> {
        match &self.config_path {
            Some(path) => {
                check_config_kind(path, false)?;
                RnnModelConfig::load(path)
                    .map_err(|e| anyhow::anyhow!("Cannot load model config from '{path}': {e}"))
            }
            None => Ok(RnnModelConfig::new(self.ntoken, self.ninp, self.nhid, self.nlayers)
                .with_cell(self.cell)
                .with_dropout(self.dropout)
                .with_tie_weights(self.tie_weights)),
        }
    }

    pub fn stacked_config(&self) -> Result<StackedRnnModelConfig> {
        match &self.config_path {
            Some(path) => {
                check_config_kind(path, true)?;
                StackedRnnModelConfig::load(path)
                    .map_err(|e| anyhow::anyhow!("Cannot load model config from '{path}': {e}"))
            }
            None => Ok(StackedRnnModelConfig::new(self.ntoken, self.ninp, self.nhid, self.nlayers)
                .with_cell(self.cell)
                .with_dropout(self.dropout)
                .with_tie_weights(self.tie_weights)
                .with_bottom_nhid(self.bottom_nhid)
                .with_reset_top_state(self.reset_top_state)),
        }
    }

    /// Write the model config these settings describe as JSON.
    pub fn save_model_config(&self, path: &str) -> Result<()> {
        let saved = if self.stacked {
            self.stacked_config()?.save(path)
        } else {
            self.rnn_config()?.save(path)
        };
        saved.with_context(|| format!("Cannot write model config to '{path}'"))?;
        tracing::info!("Saved model config to '{}'", path);
        Ok(())
    }
}

// Both config types fill missing fields with defaults, so a file of
// the wrong kind would load silently. Only stacked configs carry
// `reset_top_state`.
fn check_config_kind(path: &str, stacked: bool) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read model config from '{path}'"))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Model config '{path}' is not valid JSON"))?;
    let found = value.get("reset_top_state").is_some();
    if found != stacked {
        let kind = |s: bool| if s { "stacked" } else { "single-stage" };
        bail!(
            "Model config '{}' describes a {} model but a {} model was requested",
            path,
            kind(found),
            kind(stacked)
        );
    }
    Ok(())
}

// ─── Summary Report ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub description:   String,
    pub num_params:    usize,
    pub logits_dims:   [usize; 3],
    pub hidden_dims:   [usize; 3],
    pub shared_bottom: bool,
}

// ─── SummaryUseCase ──────────────────────────────────────────────────────────
pub struct SummaryUseCase {
    settings: ModelSettings,
}

impl SummaryUseCase {
    pub fn new(settings: ModelSettings) -> Self {
        Self { settings }
    }

    /// Run on the CLI backend's default device.
    pub fn execute(&self) -> Result<SummaryReport> {
        let device: <SummaryBackend as Backend>::Device = Default::default();
        tracing::info!("Using device: {:?}", device);
        self.run::<SummaryBackend>(&device)
    }

    pub fn run<B: Backend>(&self, device: &B::Device) -> Result<SummaryReport> {
        let s = &self.settings;

        if s.stacked {
            let cfg = self.settings.stacked_config()?;
            check_vocabulary(cfg.ntoken)?;
            let pretrained = synthetic_pretrained(s.pretrained_rows, cfg.ninp);

            // The shared bottom comes from a plain model of matching shape.
            let base = if s.share_bottom {
                let base_cfg = RnnModelConfig::new(cfg.ntoken, cfg.ninp, cfg.bottom_width(), cfg.nlayers)
                    .with_cell(cfg.cell)
                    .with_dropout(cfg.dropout);
                Some(base_cfg.init::<B>(&pretrained, device)?)
            } else {
                None
            };

            let model = cfg.init::<B>(&pretrained, base.as_ref(), device)?;
            Ok(summarise(&model, model.num_params(), s, base.is_some(), device))
        } else {
            let cfg = self.settings.rnn_config()?;
            check_vocabulary(cfg.ntoken)?;
            let pretrained = synthetic_pretrained(s.pretrained_rows, cfg.ninp);
            let model = cfg.init::<B>(&pretrained, device)?;
            Ok(summarise(&model, model.num_params(), s, false, device))
        }
    }
}

// The random batch draws ids from [0, ntoken).
fn check_vocabulary(ntoken: usize) -> Result<()> {
    if ntoken == 0 {
        bail!("ntoken must be at least 1");
    }
    Ok(())
}

fn summarise<B: Backend, M: SequenceTagger<B>>(
    model:         &M,
    num_params:    usize,
    settings:      &ModelSettings,
    shared_bottom: bool,
    device:        &B::Device,
) -> SummaryReport {
    let input = random_tokens::<B>(settings.seq_len, settings.batch_size, model.vocab_size(), device);
    let (logits, hidden) = model.forward(input, model.init_hidden(settings.batch_size));

    let report = SummaryReport {
        description: model.describe(),
        num_params,
        logits_dims: logits.dims(),
        hidden_dims: hidden.dims(),
        shared_bottom,
    };
    tracing::debug!("Forward pass: logits {:?}, hidden {:?}", report.logits_dims, report.hidden_dims);
    report
}

// ─── Synthetic Inputs ────────────────────────────────────────────────────────
// Stand-ins for what a real pipeline would supply: pretrained
// vectors from a word-embedding file and token ids from a
// tokenised corpus.
fn synthetic_pretrained(rows: usize, dim: usize) -> PretrainedEmbeddings {
    if rows == 0 {
        return PretrainedEmbeddings::empty(dim);
    }
    let mut rng = rand::thread_rng();
    let vectors: Vec<Vec<f32>> = (0..rows)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();
    // Every row is generated `dim` wide, so this cannot fail.
    PretrainedEmbeddings::from_rows(dim, vectors).unwrap_or_else(|_| PretrainedEmbeddings::empty(dim))
}

fn random_tokens<B: Backend>(
    seq_len:    usize,
    batch_size: usize,
    ntoken:     usize,
    device:     &B::Device,
) -> Tensor<B, 2, Int> {
    let mut rng = rand::thread_rng();
    let ids: Vec<i32> = (0..seq_len * batch_size)
        .map(|_| rng.gen_range(0..ntoken) as i32)
        .collect();
    Tensor::<B, 1, Int>::from_ints(ids.as_slice(), device).reshape([seq_len, batch_size])
}

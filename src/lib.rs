#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod ml;

pub use domain::{cell::CellKind, embeddings::PretrainedEmbeddings, vocabulary::VocabularyLayout};
pub use error::{ModelError, Result};
pub use ml::{HiddenState, RnnModel, RnnModelConfig, SequenceTagger, StackedRnnModel, StackedRnnModelConfig};

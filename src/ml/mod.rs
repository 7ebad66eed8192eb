// ============================================================
// ML / Model Layer (Burn)
// ============================================================
// All Burn framework code lives here. No other layer builds
// tensors or modules directly.
//
//   init.rs       - uniform / zero / fan-in parameter init
//   embedding.rs  - embedding table seeded from pretrained vectors
//   state.rs      - the (cell, hidden) pair threaded through calls
//   encoder.rs    - stacked bidirectional LSTM encoder
//   decoder.rs    - vocabulary projection, optionally tied
//   model.rs      - RnnModel
//   stacked.rs    - StackedRnnModel with the gated bottom path
//   tagger.rs     - trait both models implement
//
// Reference: Burn Book §3 (Building Blocks)

pub mod decoder;
pub mod embedding;
pub mod encoder;
pub mod init;
pub mod model;
pub mod stacked;
pub mod state;
pub mod tagger;

pub use model::{RnnModel, RnnModelConfig};
pub use stacked::{StackedRnnModel, StackedRnnModelConfig};
pub use state::HiddenState;
pub use tagger::SequenceTagger;

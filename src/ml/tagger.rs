use burn::prelude::*;

use crate::ml::state::HiddenState;

/// Common surface of the tagging models: a sequence-first forward pass
/// that threads an explicit hidden state.
pub trait SequenceTagger<B: Backend> {
    /// input: [seq_len, batch] token ids in [0, ntoken)
    /// → logits [seq_len, batch, ntoken] and the state to continue from.
    fn forward(&self, input: Tensor<B, 2, Int>, hidden: HiddenState<B>) -> (Tensor<B, 3>, HiddenState<B>);

    /// Zeroed state for `batch_size` independent sequences.
    fn init_hidden(&self, batch_size: usize) -> HiddenState<B>;

    fn vocab_size(&self) -> usize;

    /// One-line architecture summary for logs.
    fn describe(&self) -> String;
}

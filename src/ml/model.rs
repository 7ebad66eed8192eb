// ============================================================
// RnnModel - single-stage bidirectional tagger
// ============================================================
//
//   tokens [seq, batch]
//     → Embedding            [seq, batch, ninp]
//     → BiEncoder (nlayers)  [seq, batch, nhid]
//     → Dropout
//     → Decoder              [seq, batch, ntoken]
//
// The embedding can start from pretrained vectors and the
// decoder can share the embedding table (weight tying).

use burn::{
    nn::{Dropout, DropoutConfig, Embedding},
    prelude::*,
};

use crate::domain::{cell::CellKind, embeddings::PretrainedEmbeddings};
use crate::error::{self, ModelError};
use crate::ml::{
    decoder::Decoder,
    embedding::pretrained_embedding,
    encoder::{BiEncoder, BiEncoderConfig},
    state::HiddenState,
    tagger::SequenceTagger,
};

#[derive(Config, Debug)]
pub struct RnnModelConfig {
    #[config(default = "CellKind::Lstm")]
    pub cell:        CellKind,
    /// Vocabulary size
    pub ntoken:      usize,
    /// Embedding width
    pub ninp:        usize,
    /// Encoder output width, split evenly between the two directions
    pub nhid:        usize,
    pub nlayers:     usize,
    #[config(default = 0.5)]
    pub dropout:     f64,
    #[config(default = false)]
    pub tie_weights: bool,
}

impl RnnModelConfig {
    pub fn init<B: Backend>(
        &self,
        pretrained: &PretrainedEmbeddings,
        device: &B::Device,
    ) -> error::Result<RnnModel<B>> {
        if self.tie_weights && self.nhid != self.ninp {
            return Err(ModelError::TiedWidthMismatch {
                nhid: self.nhid,
                ninp: self.ninp,
            });
        }

        let embedding = pretrained_embedding(self.ntoken, self.ninp, pretrained, device)?;
        let encoder = BiEncoderConfig::new(self.ninp, self.nhid, self.nlayers)
            .with_cell(self.cell)
            .with_dropout(self.dropout)
            .init(device)?;
        let decoder = if self.tie_weights {
            Decoder::tied(self.ntoken, device)
        } else {
            Decoder::projection(self.nhid, self.ntoken, device)
        };

        let model = RnnModel {
            embedding,
            encoder,
            dropout: DropoutConfig::new(self.dropout).init(),
            decoder,
            ntoken: self.ntoken,
        };
        tracing::info!("Model ready: {} ({} parameters)", model.describe(), model.num_params());
        Ok(model)
    }
}

#[derive(Module, Debug)]
pub struct RnnModel<B: Backend> {
    pub embedding: Embedding<B>,
    pub encoder: BiEncoder<B>,
    pub dropout: Dropout,
    pub decoder: Decoder<B>,
    pub ntoken: usize,
}

impl<B: Backend> RnnModel<B> {
    /// input: [seq_len, batch] → logits [seq_len, batch, ntoken]
    pub fn forward(&self, input: Tensor<B, 2, Int>, hidden: HiddenState<B>) -> (Tensor<B, 3>, HiddenState<B>) {
        let emb = self.embedding.forward(input);
        let (output, hidden) = self.encoder.forward(emb, hidden);
        let output = self.dropout.forward(output);
        (self.decoder.forward(output, &self.embedding), hidden)
    }

    pub fn init_hidden(&self, batch_size: usize) -> HiddenState<B> {
        self.encoder.zero_state(batch_size, &self.embedding.weight.device())
    }

    pub fn encoder(&self) -> &BiEncoder<B> {
        &self.encoder
    }

    /// Swap in another encoder's parameters, keeping this model's
    /// inter-layer dropout.
    pub fn with_encoder(mut self, encoder: BiEncoder<B>) -> Self {
        let prob = self.encoder.dropout.prob;
        self.encoder = encoder.with_dropout(prob);
        self
    }

    /// [ntoken, nhid]; the embedding weight itself when tied.
    pub fn decoder_weight(&self) -> Tensor<B, 2> {
        self.decoder.weight(&self.embedding)
    }

    pub fn is_tied(&self) -> bool {
        self.decoder.is_tied()
    }
}

impl<B: Backend> SequenceTagger<B> for RnnModel<B> {
    fn forward(&self, input: Tensor<B, 2, Int>, hidden: HiddenState<B>) -> (Tensor<B, 3>, HiddenState<B>) {
        RnnModel::forward(self, input, hidden)
    }

    fn init_hidden(&self, batch_size: usize) -> HiddenState<B> {
        RnnModel::init_hidden(self, batch_size)
    }

    fn vocab_size(&self) -> usize {
        self.ntoken
    }

    fn describe(&self) -> String {
        let [_, ninp] = self.embedding.weight.dims();
        format!(
            "RnnModel(cell={}, ntoken={}, ninp={}, nhid={}, nlayers={}, tied={})",
            self.encoder.cell(),
            self.ntoken,
            ninp,
            self.encoder.d_hidden,
            self.encoder.num_layers(),
            self.is_tied(),
        )
    }
}

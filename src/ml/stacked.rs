// ============================================================
// StackedRnnModel - gated two-stage tagger
// ============================================================
//
//   tokens [seq, batch]
//     → Embedding ─────────────────────────────┐ emb [seq, batch, ninp]
//     → bottom BiEncoder → Dropout              │
//     → Linear(bottom_nhid, nhid) → tanh        │ gate [seq, batch, nhid]
//     → concat(emb, gate) ◄─────────────────────┘ [seq, batch, ninp + nhid]
//     → top BiEncoder → Dropout
//     → Decoder                                   [seq, batch, ntoken]
//
// Hidden state policy between the stages:
//   carry (default) - the bottom stage's final state is the top
//                     stage's initial state; the top's final state
//                     is returned. Both stages must be equally wide.
//   reset           - the top stage starts from zeros every call;
//                     the bottom stage's final state is returned,
//                     since it is the only state that continues.
//
// The bottom encoder can be taken from an existing RnnModel, in
// which case both models hold the same parameters (same ParamId,
// same tensor storage) rather than copies. Burn optimizers return
// a new module from every step, so after a step on one model the
// other is brought up to date with `sync_bottom_into` or
// `sync_bottom_from`; the ParamIds never diverge.

use burn::{
    nn::{Dropout, DropoutConfig, Embedding, Linear, LinearConfig},
    prelude::*,
};

use crate::domain::{cell::CellKind, embeddings::PretrainedEmbeddings};
use crate::error::{self, ModelError};
use crate::ml::{
    decoder::Decoder,
    embedding::pretrained_embedding,
    encoder::{BiEncoder, BiEncoderConfig},
    init::fan_in_initializer,
    model::RnnModel,
    state::HiddenState,
    tagger::SequenceTagger,
};

#[derive(Config, Debug)]
pub struct StackedRnnModelConfig {
    #[config(default = "CellKind::Lstm")]
    pub cell:            CellKind,
    pub ntoken:          usize,
    pub ninp:            usize,
    /// Width of the top encoder and of the gate
    pub nhid:            usize,
    pub nlayers:         usize,
    /// Width of the bottom encoder; `nhid` when unset
    #[config(default = "None")]
    pub bottom_nhid:     Option<usize>,
    #[config(default = 0.5)]
    pub dropout:         f64,
    #[config(default = false)]
    pub tie_weights:     bool,
    #[config(default = false)]
    pub reset_top_state: bool,
}

impl StackedRnnModelConfig {
    pub fn bottom_width(&self) -> usize {
        self.bottom_nhid.unwrap_or(self.nhid)
    }

    /// Build the model. With `bottom` set, the bottom encoder shares that
    /// model's encoder parameters instead of initialising new ones.
    pub fn init<B: Backend>(
        &self,
        pretrained: &PretrainedEmbeddings,
        bottom: Option<&RnnModel<B>>,
        device: &B::Device,
    ) -> error::Result<StackedRnnModel<B>> {
        if self.tie_weights && self.nhid != self.ninp {
            return Err(ModelError::TiedWidthMismatch {
                nhid: self.nhid,
                ninp: self.ninp,
            });
        }
        let bottom_width = self.bottom_width();
        if !self.reset_top_state && bottom_width != self.nhid {
            return Err(ModelError::StateWidthMismatch {
                bottom: bottom_width,
                top: self.nhid,
            });
        }

        let embedding = pretrained_embedding(self.ntoken, self.ninp, pretrained, device)?;
        let rnn_bottom = match bottom {
            Some(source) => self.shared_bottom(source)?,
            None => BiEncoderConfig::new(self.ninp, bottom_width, self.nlayers)
                .with_cell(self.cell)
                .with_dropout(self.dropout)
                .init(device)?,
        };
        let mult_bottom = LinearConfig::new(bottom_width, self.nhid)
            .with_initializer(fan_in_initializer(bottom_width))
            .init(device);
        let rnn_top = BiEncoderConfig::new(self.ninp + self.nhid, self.nhid, self.nlayers)
            .with_cell(self.cell)
            .with_dropout(self.dropout)
            .init(device)?;
        let decoder = if self.tie_weights {
            Decoder::tied(self.ntoken, device)
        } else {
            Decoder::projection(self.nhid, self.ntoken, device)
        };

        let model = StackedRnnModel {
            embedding,
            rnn_bottom,
            mult_bottom,
            rnn_top,
            dropout: DropoutConfig::new(self.dropout).init(),
            decoder,
            ntoken: self.ntoken,
            reset_top_state: self.reset_top_state,
        };
        tracing::info!("Model ready: {} ({} parameters)", model.describe(), model.num_params());
        Ok(model)
    }

    fn shared_bottom<B: Backend>(&self, source: &RnnModel<B>) -> error::Result<BiEncoder<B>> {
        let encoder = source.encoder();
        if encoder.cell() != self.cell {
            return Err(ModelError::incompatible_bottom(format!(
                "cell {} != {}",
                encoder.cell(),
                self.cell
            )));
        }
        check_bottom(encoder, self.ninp, self.bottom_width(), self.nlayers)?;

        tracing::info!(
            "Sharing bottom encoder parameters with {}",
            source.describe()
        );
        // Cloning a module keeps every ParamId and the tensor storage behind it.
        Ok(encoder.clone().with_dropout(self.dropout))
    }
}

fn check_bottom<B: Backend>(
    encoder: &BiEncoder<B>,
    d_input: usize,
    d_hidden: usize,
    num_layers: usize,
) -> error::Result<()> {
    if encoder.d_input != d_input {
        return Err(ModelError::incompatible_bottom(format!(
            "input width {} != ninp {}",
            encoder.d_input, d_input
        )));
    }
    if encoder.d_hidden != d_hidden {
        return Err(ModelError::incompatible_bottom(format!(
            "hidden width {} != bottom width {}",
            encoder.d_hidden, d_hidden
        )));
    }
    if encoder.num_layers() != num_layers {
        return Err(ModelError::incompatible_bottom(format!(
            "{} layers != nlayers {}",
            encoder.num_layers(),
            num_layers
        )));
    }
    Ok(())
}

#[derive(Module, Debug)]
pub struct StackedRnnModel<B: Backend> {
    pub embedding: Embedding<B>,
    pub rnn_bottom: BiEncoder<B>,
    pub mult_bottom: Linear<B>,
    pub rnn_top: BiEncoder<B>,
    pub dropout: Dropout,
    pub decoder: Decoder<B>,
    pub ntoken: usize,
    pub reset_top_state: bool,
}

impl<B: Backend> StackedRnnModel<B> {
    pub fn forward(&self, input: Tensor<B, 2, Int>, hidden: HiddenState<B>) -> (Tensor<B, 3>, HiddenState<B>) {
        let emb = self.embedding.forward(input);
        let (gate, bottom_state) = self.bottom_stage(emb.clone(), hidden);
        let fused = Self::fuse(emb, gate);

        let (top_start, returned) = if self.reset_top_state {
            let [_, batch_size, _] = fused.dims();
            let zeros = self.rnn_top.zero_state(batch_size, &fused.device());
            (zeros, Some(bottom_state))
        } else {
            (bottom_state, None)
        };

        let (output, top_state) = self.rnn_top.forward(fused, top_start);
        let output = self.dropout.forward(output);
        let logits = self.decoder.forward(output, &self.embedding);
        (logits, returned.unwrap_or(top_state))
    }

    /// Bottom encoder, dropout, and the tanh gate.
    /// emb: [seq, batch, ninp] → gate: [seq, batch, nhid], values in (-1, 1)
    pub fn bottom_stage(&self, emb: Tensor<B, 3>, hidden: HiddenState<B>) -> (Tensor<B, 3>, HiddenState<B>) {
        let (output, hidden) = self.rnn_bottom.forward(emb, hidden);
        let output = self.dropout.forward(output);
        let gate = self.mult_bottom.forward(output).tanh();
        (gate, hidden)
    }

    /// Per-position concatenation [emb ‖ gate] in one batched op.
    pub fn fuse(emb: Tensor<B, 3>, gate: Tensor<B, 3>) -> Tensor<B, 3> {
        Tensor::cat(vec![emb, gate], 2)
    }

    /// Zeroed state for the bottom encoder, which consumes the caller's
    /// state. In carry mode both encoders are equally wide.
    pub fn init_hidden(&self, batch_size: usize) -> HiddenState<B> {
        self.rnn_bottom.zero_state(batch_size, &self.embedding.weight.device())
    }

    pub fn decoder_weight(&self) -> Tensor<B, 2> {
        self.decoder.weight(&self.embedding)
    }

    pub fn is_tied(&self) -> bool {
        self.decoder.is_tied()
    }

    /// Write the bottom encoder back into the model it is shared with,
    /// after an optimizer step on this model.
    pub fn sync_bottom_into(&self, base: RnnModel<B>) -> error::Result<RnnModel<B>> {
        let bottom = &self.rnn_bottom;
        check_bottom(base.encoder(), bottom.d_input, bottom.d_hidden, bottom.num_layers())?;
        Ok(base.with_encoder(bottom.clone()))
    }

    /// Take the bottom encoder from the model it is shared with, after
    /// an optimizer step on that model.
    pub fn sync_bottom_from(mut self, base: &RnnModel<B>) -> error::Result<Self> {
        let bottom = &self.rnn_bottom;
        check_bottom(base.encoder(), bottom.d_input, bottom.d_hidden, bottom.num_layers())?;
        let prob = bottom.dropout.prob;
        self.rnn_bottom = base.encoder().clone().with_dropout(prob);
        Ok(self)
    }
}

impl<B: Backend> SequenceTagger<B> for StackedRnnModel<B> {
    fn forward(&self, input: Tensor<B, 2, Int>, hidden: HiddenState<B>) -> (Tensor<B, 3>, HiddenState<B>) {
        StackedRnnModel::forward(self, input, hidden)
    }

    fn init_hidden(&self, batch_size: usize) -> HiddenState<B> {
        StackedRnnModel::init_hidden(self, batch_size)
    }

    fn vocab_size(&self) -> usize {
        self.ntoken
    }

    fn describe(&self) -> String {
        let [_, ninp] = self.embedding.weight.dims();
        format!(
            "StackedRnnModel(cell={}, ntoken={}, ninp={}, bottom_nhid={}, nhid={}, nlayers={}, tied={}, top_state={})",
            self.rnn_top.cell(),
            self.ntoken,
            ninp,
            self.rnn_bottom.d_hidden,
            self.rnn_top.d_hidden,
            self.rnn_top.num_layers(),
            self.is_tied(),
            if self.reset_top_state { "reset" } else { "carry" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{Autodiff, NdArray},
        module::ParamId,
        optim::{GradientsParams, Optimizer, SgdConfig},
    };

    use crate::ml::model::RnnModelConfig;

    type TestBackend = NdArray;
    type TestAutodiffBackend = Autodiff<NdArray>;

    fn tokens<B: Backend>(seq_len: usize, batch: usize, ntoken: usize, device: &B::Device) -> Tensor<B, 2, Int> {
        let ids: Vec<i32> = (0..seq_len * batch).map(|i| ((i * 7) % ntoken) as i32).collect();
        Tensor::<B, 1, Int>::from_ints(ids.as_slice(), device).reshape([seq_len, batch])
    }

    fn values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<f32> {
        tensor.into_data().to_vec::<f32>().unwrap()
    }

    fn first_weight<B: Backend>(encoder: &BiEncoder<B>) -> Vec<f32> {
        values(encoder.layers[0].forward.input_gate.input_transform.weight.val())
    }

    fn encoder_ids<B: Backend>(encoder: &BiEncoder<B>) -> Vec<ParamId> {
        encoder
            .layers
            .iter()
            .flat_map(|layer| [&layer.forward, &layer.reverse])
            .flat_map(|lstm| [&lstm.input_gate, &lstm.forget_gate, &lstm.output_gate, &lstm.cell_gate])
            .flat_map(|gate| [&gate.input_transform, &gate.hidden_transform])
            .flat_map(|linear| {
                let mut ids = vec![linear.weight.id.clone()];
                ids.extend(linear.bias.as_ref().map(|bias| bias.id.clone()));
                ids
            })
            .collect()
    }

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let model = StackedRnnModelConfig::new(40, 6, 8, 2)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(6), None, &device)
            .unwrap();

        let (logits, hidden) = model.forward(tokens(4, 3, 40, &device), model.init_hidden(3));
        assert_eq!(logits.dims(), [4, 3, 40]);
        assert_eq!(hidden.cell.dims(), [4, 3, 4]);
        assert_eq!(hidden.hidden.dims(), [4, 3, 4]);
    }

    #[test]
    fn test_top_encoder_reads_fused_width() {
        let device = Default::default();
        let model = StackedRnnModelConfig::new(10, 5, 4, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(5), None, &device)
            .unwrap();
        assert_eq!(model.rnn_top.d_input, 9);
        let weight = model.rnn_top.layers[0].forward.input_gate.input_transform.weight.val();
        assert_eq!(weight.dims(), [9, 2]);
    }

    #[test]
    fn test_gate_is_bounded_and_fused_after_embedding() {
        let device = Default::default();
        let model = StackedRnnModelConfig::new(15, 3, 4, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(3), None, &device)
            .unwrap();

        let emb = model.embedding.forward(tokens(6, 2, 15, &device));
        let (gate, _) = model.bottom_stage(emb.clone(), model.init_hidden(2));
        assert_eq!(gate.dims(), [6, 2, 4]);
        assert!(values(gate.clone()).iter().all(|v| *v > -1.0 && *v < 1.0));

        let fused = StackedRnnModel::fuse(emb.clone(), gate.clone());
        assert_eq!(fused.dims(), [6, 2, 7]);
        assert_eq!(values(fused.clone().narrow(2, 0, 3)), values(emb));
        assert_eq!(values(fused.narrow(2, 3, 4)), values(gate));
    }

    #[test]
    fn test_bottom_parameters_are_shared() {
        let device = Default::default();
        let base = RnnModelConfig::new(20, 4, 6, 2)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), &device)
            .unwrap();
        let stacked = StackedRnnModelConfig::new(20, 4, 6, 2)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), Some(&base), &device)
            .unwrap();

        assert_eq!(encoder_ids(&stacked.rnn_bottom), encoder_ids(base.encoder()));
        let shared = &stacked.rnn_bottom.layers[1].reverse.cell_gate.hidden_transform.weight;
        let source = &base.encoder().layers[1].reverse.cell_gate.hidden_transform.weight;
        assert_eq!(values(shared.val()), values(source.val()));

        // The top encoder is never shared.
        let top = encoder_ids(&stacked.rnn_top);
        assert!(encoder_ids(base.encoder()).iter().all(|id| !top.contains(id)));
    }

    #[test]
    fn test_fresh_bottom_is_not_shared() {
        let device = Default::default();
        let base = RnnModelConfig::new(20, 4, 6, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), &device)
            .unwrap();
        let stacked = StackedRnnModelConfig::new(20, 4, 6, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), None, &device)
            .unwrap();
        let bottom = encoder_ids(&stacked.rnn_bottom);
        assert!(encoder_ids(base.encoder()).iter().all(|id| !bottom.contains(id)));
    }

    #[test]
    fn test_shared_bottom_follows_stacked_update() {
        let device = Default::default();
        let base = RnnModelConfig::new(16, 4, 4, 2)
            .with_dropout(0.0)
            .init::<TestAutodiffBackend>(&PretrainedEmbeddings::empty(4), &device)
            .unwrap();
        let stacked = StackedRnnModelConfig::new(16, 4, 4, 2)
            .with_dropout(0.0)
            .init::<TestAutodiffBackend>(&PretrainedEmbeddings::empty(4), Some(&base), &device)
            .unwrap();
        let before = first_weight(base.encoder());

        let (logits, _) = stacked.forward(tokens(3, 2, 16, &device), stacked.init_hidden(2));
        let grads = GradientsParams::from_grads(logits.sum().backward(), &stacked);
        let mut optim = SgdConfig::new().init();
        let stacked = optim.step(0.5, stacked, grads);

        let after = first_weight(&stacked.rnn_bottom);
        assert_ne!(before, after);

        let base = stacked.sync_bottom_into(base).unwrap();
        assert_eq!(first_weight(base.encoder()), after);
        assert_eq!(encoder_ids(base.encoder()), encoder_ids(&stacked.rnn_bottom));
        assert_eq!(base.encoder.dropout.prob, 0.0);
    }

    #[test]
    fn test_stacked_bottom_follows_base_update() {
        let device = Default::default();
        let base = RnnModelConfig::new(16, 4, 4, 1)
            .with_dropout(0.0)
            .init::<TestAutodiffBackend>(&PretrainedEmbeddings::empty(4), &device)
            .unwrap();
        let stacked = StackedRnnModelConfig::new(16, 4, 4, 1)
            .with_dropout(0.0)
            .init::<TestAutodiffBackend>(&PretrainedEmbeddings::empty(4), Some(&base), &device)
            .unwrap();

        let (logits, _) = base.forward(tokens(3, 2, 16, &device), base.init_hidden(2));
        let grads = GradientsParams::from_grads(logits.sum().backward(), &base);
        let mut optim = SgdConfig::new().init();
        let base = optim.step(0.5, base, grads);
        assert_ne!(first_weight(&stacked.rnn_bottom), first_weight(base.encoder()));

        let stacked = stacked.sync_bottom_from(&base).unwrap();
        assert_eq!(first_weight(&stacked.rnn_bottom), first_weight(base.encoder()));
        assert_eq!(encoder_ids(&stacked.rnn_bottom), encoder_ids(base.encoder()));
    }

    #[test]
    fn test_sync_rejects_unrelated_model() {
        let device = Default::default();
        let other = RnnModelConfig::new(20, 4, 8, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), &device)
            .unwrap();
        let stacked = StackedRnnModelConfig::new(20, 4, 6, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), None, &device)
            .unwrap();
        let err = stacked.sync_bottom_into(other).unwrap_err();
        assert!(matches!(err, ModelError::IncompatibleBottom(_)));
    }

    #[test]
    fn test_rejects_bottom_with_other_layer_count() {
        let device = Default::default();
        let base = RnnModelConfig::new(20, 4, 6, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), &device)
            .unwrap();
        let err = StackedRnnModelConfig::new(20, 4, 6, 2)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), Some(&base), &device)
            .unwrap_err();
        assert!(matches!(err, ModelError::IncompatibleBottom(ref msg) if msg.contains("layers")));
    }

    #[test]
    fn test_rejects_bottom_with_other_hidden_width() {
        let device = Default::default();
        let base = RnnModelConfig::new(20, 4, 8, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), &device)
            .unwrap();
        let err = StackedRnnModelConfig::new(20, 4, 6, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), Some(&base), &device)
            .unwrap_err();
        assert!(matches!(err, ModelError::IncompatibleBottom(ref msg) if msg.contains("hidden width 8")));
    }

    #[test]
    fn test_rejects_bottom_with_other_input_width() {
        let device = Default::default();
        let base = RnnModelConfig::new(20, 5, 6, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(5), &device)
            .unwrap();
        let err = StackedRnnModelConfig::new(20, 4, 6, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), Some(&base), &device)
            .unwrap_err();
        assert!(matches!(err, ModelError::IncompatibleBottom(ref msg) if msg.contains("input width 5")));
    }

    #[test]
    fn test_pretrained_rows_copied_exactly() {
        let device = Default::default();
        let rows = vec![vec![0.5, -0.5, 2.0, 3.0], vec![7.0, 8.0, -9.0, 1.5]];
        let pretrained = PretrainedEmbeddings::from_rows(4, rows).unwrap();
        let model = StackedRnnModelConfig::new(6, 4, 4, 1)
            .init::<TestBackend>(&pretrained, None, &device)
            .unwrap();

        let embedding = values(model.embedding.weight.val());
        assert_eq!(&embedding[..8], pretrained.as_flat());
        assert!(embedding[8..].iter().all(|v| (-0.1..=0.1).contains(v)));
    }

    #[test]
    fn test_carry_requires_equal_widths() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let err = StackedRnnModelConfig::new(20, 4, 6, 1)
            .with_bottom_nhid(Some(8))
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), None, &device)
            .unwrap_err();
        assert_eq!(err, ModelError::StateWidthMismatch { bottom: 8, top: 6 });
    }

    #[test]
    fn test_reset_returns_bottom_state() {
        let device = Default::default();
        let model = StackedRnnModelConfig::new(20, 4, 6, 2)
            .with_bottom_nhid(Some(10))
            .with_reset_top_state(true)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), None, &device)
            .unwrap();

        let hidden = model.init_hidden(3);
        assert_eq!(hidden.dims(), [4, 3, 5]);
        let (logits, hidden) = model.forward(tokens(5, 3, 20, &device), hidden);
        assert_eq!(logits.dims(), [5, 3, 20]);
        assert_eq!(hidden.dims(), [4, 3, 5]);

        // The returned state continues the next call.
        let (logits, _) = model.forward(tokens(2, 3, 20, &device), hidden);
        assert_eq!(logits.dims(), [2, 3, 20]);
    }

    #[test]
    fn test_carry_and_reset_differ() {
        let device = Default::default();
        let carry = StackedRnnModelConfig::new(12, 4, 4, 1)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), None, &device)
            .unwrap();
        let mut reset = carry.clone();
        reset.reset_top_state = true;

        let input = tokens(4, 1, 12, &device);
        let (a, _) = carry.forward(input.clone(), carry.init_hidden(1));
        let (b, _) = reset.forward(input, reset.init_hidden(1));
        assert_ne!(values(a), values(b));
    }

    #[test]
    fn test_tied_stacked_model() {
        let device = Default::default();
        let model = StackedRnnModelConfig::new(10, 6, 6, 1)
            .with_tie_weights(true)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(6), None, &device)
            .unwrap();
        assert_eq!(values(model.decoder_weight()), values(model.embedding.weight.val()));

        let err = StackedRnnModelConfig::new(10, 4, 6, 1)
            .with_tie_weights(true)
            .init::<TestBackend>(&PretrainedEmbeddings::empty(4), None, &device)
            .unwrap_err();
        assert_eq!(err, ModelError::TiedWidthMismatch { nhid: 6, ninp: 4 });
    }
}

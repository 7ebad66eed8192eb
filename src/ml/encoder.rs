// ============================================================
// Bidirectional Recurrent Encoder
// ============================================================
// A stack of Burn BiLstm layers. Each layer runs one LSTM
// forward and one backward over the sequence and concatenates
// the two outputs, so a layer of total width d_hidden uses two
// cells of d_hidden / 2 each.
//
//   input  [seq_len, batch, d_input]
//     └── layer 0 ── dropout ── layer 1 ── ... ── layer n-1
//   output [seq_len, batch, d_hidden]
//
// Dropout sits between layers only, never after the last one.
// The models are sequence-first; BiLstm is batch-first, so the
// encoder swaps the two leading axes on the way in and out.

use burn::{
    nn::{BiLstm, BiLstmConfig, Dropout, DropoutConfig},
    prelude::*,
};

use crate::domain::cell::CellKind;
use crate::error::{self, ModelError};
use crate::ml::init::fan_in_initializer;
use crate::ml::state::HiddenState;

#[derive(Config, Debug)]
pub struct BiEncoderConfig {
    /// Width of each input position
    pub d_input:    usize,
    /// Width of each output position, forward and reverse halves together
    pub d_hidden:   usize,
    pub num_layers: usize,
    #[config(default = "CellKind::Lstm")]
    pub cell:       CellKind,
    #[config(default = 0.5)]
    pub dropout:    f64,
}

impl BiEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<BiEncoder<B>> {
        if self.num_layers == 0 {
            return Err(ModelError::ZeroLayers);
        }
        if self.d_hidden % 2 != 0 {
            return Err(ModelError::OddHiddenWidth(self.d_hidden));
        }
        let d_direction = self.d_hidden / 2;

        let layers = (0..self.num_layers)
            .map(|index| {
                let d_input = if index == 0 { self.d_input } else { self.d_hidden };
                match self.cell {
                    CellKind::Lstm => BiLstmConfig::new(d_input, d_direction, true)
                        .with_initializer(fan_in_initializer(d_direction))
                        .init(device),
                }
            })
            .collect();

        Ok(BiEncoder {
            layers,
            dropout: DropoutConfig::new(self.dropout).init(),
            d_input: self.d_input,
            d_hidden: self.d_hidden,
        })
    }
}

#[derive(Module, Debug)]
pub struct BiEncoder<B: Backend> {
    pub layers: Vec<BiLstm<B>>,
    pub dropout: Dropout,
    pub d_input: usize,
    pub d_hidden: usize,
}

impl<B: Backend> BiEncoder<B> {
    /// input: [seq_len, batch, d_input] → output: [seq_len, batch, d_hidden]
    pub fn forward(&self, input: Tensor<B, 3>, state: HiddenState<B>) -> (Tensor<B, 3>, HiddenState<B>) {
        let mut x = input.swap_dims(0, 1);
        let mut next_states = Vec::with_capacity(self.layers.len());

        for (index, layer) in self.layers.iter().enumerate() {
            if index > 0 {
                x = self.dropout.forward(x);
            }
            let (output, next) = layer.forward(x, Some(state.layer(index)));
            x = output;
            next_states.push(next);
        }

        (x.swap_dims(0, 1), HiddenState::from_layers(next_states))
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Every layer is a BiLstm.
    pub fn cell(&self) -> CellKind {
        CellKind::Lstm
    }

    /// Width of one direction; the last axis of the hidden state.
    pub fn d_direction(&self) -> usize {
        self.d_hidden / 2
    }

    pub fn zero_state(&self, batch_size: usize, device: &B::Device) -> HiddenState<B> {
        HiddenState::zeros(self.num_layers(), batch_size, self.d_direction(), device)
    }

    /// Replace the inter-layer dropout, keeping every parameter as is.
    pub fn with_dropout(mut self, prob: f64) -> Self {
        self.dropout = DropoutConfig::new(prob).init();
        self
    }
}

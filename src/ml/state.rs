// ============================================================
// Recurrent Hidden State
// ============================================================
// The (cell, hidden) pair carried between forward calls.
// Both tensors have shape [2 * nlayers, batch, d_direction]
// where d_direction is half the encoder width.
//
// Row layout is layer-major, direction-minor:
//
//   row 2*l     → layer l, forward direction
//   row 2*l + 1 → layer l, reverse direction
//
// which is exactly the [2, batch, d] slice Burn's BiLstm
// expects for a single layer.

use burn::{nn::LstmState, prelude::*};

#[derive(Debug, Clone)]
pub struct HiddenState<B: Backend> {
    /// Cell memory - shape: [2 * nlayers, batch, d_direction]
    pub cell: Tensor<B, 3>,
    /// Hidden output - shape: [2 * nlayers, batch, d_direction]
    pub hidden: Tensor<B, 3>,
}

impl<B: Backend> HiddenState<B> {
    pub fn zeros(nlayers: usize, batch_size: usize, d_direction: usize, device: &B::Device) -> Self {
        let shape = [nlayers * 2, batch_size, d_direction];
        Self {
            cell: Tensor::zeros(shape, device),
            hidden: Tensor::zeros(shape, device),
        }
    }

    /// [2 * nlayers, batch, d_direction]
    pub fn dims(&self) -> [usize; 3] {
        self.hidden.dims()
    }

    /// Both directions of one layer, as Burn's bidirectional LSTM takes them.
    pub fn layer(&self, index: usize) -> LstmState<B, 3> {
        LstmState::new(
            self.cell.clone().narrow(0, index * 2, 2),
            self.hidden.clone().narrow(0, index * 2, 2),
        )
    }

    /// Reassemble the full state from per-layer states, lowest layer first.
    pub fn from_layers(layers: Vec<LstmState<B, 3>>) -> Self {
        let (cells, hiddens): (Vec<_>, Vec<_>) = layers
            .into_iter()
            .map(|state| (state.cell, state.hidden))
            .unzip();
        Self {
            cell: Tensor::cat(cells, 0),
            hidden: Tensor::cat(hiddens, 0),
        }
    }
}

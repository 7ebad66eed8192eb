// ============================================================
// Output Decoder
// ============================================================
// Projects every encoder output position to ntoken logits.
//
// Two variants:
//   Projection - an ordinary Linear(nhid, ntoken), weights drawn
//                from U(-0.1, 0.1), bias zero.
//   Tied       - only a bias is owned here. The weight IS the
//                embedding table: logits = x · Eᵀ + b. There is a
//                single parameter, so an update to the embedding
//                is an update to the decoder.
//
// References: Press & Wolf (2016), Inan et al. (2016)

use burn::{
    module::Param,
    nn::{Embedding, Linear, LinearConfig},
    prelude::*,
};

use crate::ml::init::{uniform_init, zeros_init, INIT_RANGE};

#[derive(Module, Debug)]
pub enum Decoder<B: Backend> {
    Projection(Linear<B>),
    Tied(Param<Tensor<B, 1>>),
}

impl<B: Backend> Decoder<B> {
    pub fn projection(d_input: usize, ntoken: usize, device: &B::Device) -> Self {
        let mut linear = LinearConfig::new(d_input, ntoken).init(device);
        uniform_init(&mut linear.weight, -INIT_RANGE, INIT_RANGE);
        if let Some(bias) = linear.bias.as_mut() {
            zeros_init(bias);
        }
        Decoder::Projection(linear)
    }

    pub fn tied(ntoken: usize, device: &B::Device) -> Self {
        Decoder::Tied(Param::from_tensor(Tensor::zeros([ntoken], device)))
    }

    /// [seq_len, batch, d_input] → [seq_len, batch, ntoken]
    pub fn forward(&self, x: Tensor<B, 3>, embedding: &Embedding<B>) -> Tensor<B, 3> {
        match self {
            Decoder::Projection(linear) => linear.forward(x),
            Decoder::Tied(bias) => {
                let weight = embedding.weight.val().transpose();
                x.matmul(weight.unsqueeze()) + bias.val().unsqueeze()
            }
        }
    }

    /// Decoder weight as [ntoken, d_input], the embedding table when tied.
    pub fn weight(&self, embedding: &Embedding<B>) -> Tensor<B, 2> {
        match self {
            Decoder::Projection(linear) => linear.weight.val().transpose(),
            Decoder::Tied(_) => embedding.weight.val(),
        }
    }

    pub fn bias(&self) -> Option<Tensor<B, 1>> {
        match self {
            Decoder::Projection(linear) => linear.bias.as_ref().map(|bias| bias.val()),
            Decoder::Tied(bias) => Some(bias.val()),
        }
    }

    pub fn is_tied(&self) -> bool {
        matches!(self, Decoder::Tied(_))
    }
}

// ============================================================
// Embedding Initialisation
// ============================================================
// Builds the token embedding table of shape [ntoken, ninp]:
//
//   rows [0, k)       copied verbatim from the pretrained vectors
//   rows [k, ntoken)  drawn from U(-0.1, 0.1)
//
// With no pretrained vectors the whole table is uniform.

use burn::{
    module::Param,
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
    tensor::Distribution,
};

use crate::domain::embeddings::PretrainedEmbeddings;
use crate::error::Result;
use crate::ml::init::{uniform_init, INIT_RANGE};

pub fn pretrained_embedding<B: Backend>(
    ntoken: usize,
    ninp: usize,
    pretrained: &PretrainedEmbeddings,
    device: &B::Device,
) -> Result<Embedding<B>> {
    let layout = pretrained.layout(ntoken, ninp)?;
    let mut embedding = EmbeddingConfig::new(ntoken, ninp).init(device);

    if layout.pretrained_count() == 0 {
        uniform_init(&mut embedding.weight, -INIT_RANGE, INIT_RANGE);
        tracing::debug!("Embedding {}x{}: all rows random", ntoken, ninp);
        return Ok(embedding);
    }

    let known = Tensor::<B, 2>::from_data(
        TensorData::new(
            pretrained.as_flat().to_vec(),
            [layout.pretrained_count(), ninp],
        ),
        device,
    );

    let weight = if layout.random_count() == 0 {
        known
    } else {
        let unknown = Tensor::<B, 2>::random(
            [layout.random_count(), ninp],
            Distribution::Uniform(-INIT_RANGE, INIT_RANGE),
            device,
        );
        Tensor::cat(vec![known, unknown], 0)
    };
    embedding.weight = Param::from_tensor(weight);

    tracing::debug!(
        "Embedding {}x{}: {} pretrained rows, {} random rows",
        ntoken,
        ninp,
        layout.pretrained_count(),
        layout.random_count(),
    );
    Ok(embedding)
}

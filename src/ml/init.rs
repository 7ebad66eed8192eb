use burn::{
    module::Param,
    nn::Initializer,
    prelude::{Backend, Tensor},
    tensor::Distribution,
};

/// Half-width of the uniform range used for embeddings and the decoder.
pub const INIT_RANGE: f64 = 0.1;

pub fn uniform_init<B: Backend, const D: usize>(param: &mut Param<Tensor<B, D>>, low: f64, high: f64) {
    let shape = param.shape();

    let device = &param.device();

    let uniform_tensor = Tensor::random(shape, Distribution::Uniform(low, high), device);

    *param = Param::from_tensor(uniform_tensor);
}

pub fn zeros_init<B: Backend, const D: usize>(param: &mut Param<Tensor<B, D>>) {
    let shape = param.shape();

    let device = &param.device();

    let zeros_tensor = Tensor::zeros(shape, device);

    *param = Param::from_tensor(zeros_tensor);
}

/// U(-1/sqrt(fan_in), 1/sqrt(fan_in)), the default range for recurrent
/// and dense layers that are not explicitly re-initialised.
pub fn fan_in_initializer(fan_in: usize) -> Initializer {
    let bound = 1.0 / (fan_in.max(1) as f64).sqrt();
    Initializer::Uniform {
        min: -bound,
        max: bound,
    }
}

//! Dense projection with a fixed ReLU6 activation.
//!
//! This is the one dense-layer shape the attention layer consumes:
//! `(tensor, d_input, d_output) → tensor`.

use burn::config::Config;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;

/// Projection configuration.
#[derive(Config, Debug)]
pub struct ProjectionConfig {
    /// Input feature dimension.
    pub d_input: usize,
    /// Output feature dimension.
    pub d_output: usize,
    /// Whether the linear map has a bias term.
    #[config(default = true)]
    pub bias: bool,
}

/// `relu6(x W + b)`.
#[derive(Module, Debug)]
pub struct Projection<B: Backend> {
    linear: Linear<B>,
    d_input: usize,
    d_output: usize,
}

impl ProjectionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Projection<B> {
        Projection {
            linear: LinearConfig::new(self.d_input, self.d_output)
                .with_bias(self.bias)
                .init(device),
            d_input: self.d_input,
            d_output: self.d_output,
        }
    }
}

impl<B: Backend> Projection<B> {
    /// Project the last dimension: [..., d_input] → [..., d_output].
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        relu6(self.linear.forward(input))
    }

    pub fn d_input(&self) -> usize {
        self.d_input
    }

    pub fn d_output(&self) -> usize {
        self.d_output
    }
}

/// `min(max(x, 0), 6)`.
pub fn relu6<B: Backend, const D: usize>(input: Tensor<B, D>) -> Tensor<B, D> {
    input.clamp(0.0, 6.0)
}

//! Tape-based autograd engine
//!
//! Provides automatic differentiation over N-dimensional tensors, plus the scoped
//! gradient-mode switch (`no_grad` / `enable_grad`) optimizers use for bookkeeping.

mod backward;
mod context;
mod ops;
mod tensor;

#[cfg(test)]
mod tests;

pub use backward::BackwardOp;
pub use context::{enable_grad, is_grad_enabled, no_grad, Context, GradModeGuard};
pub use ops::*;
pub use tensor::Tensor;

/// Perform backward pass on a tensor
pub fn backward(tensor: &mut Tensor, grad_output: Option<ndarray::ArrayD<f32>>) {
    if let Some(grad) = grad_output {
        tensor.set_grad(grad);
    } else {
        // Initialize with ones for scalar loss
        let ones = ndarray::ArrayD::ones(tensor.data().raw_dim());
        tensor.set_grad(ones);
    }

    if let Some(op) = tensor.backward_op() {
        op.backward();
    }
}

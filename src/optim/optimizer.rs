//! Optimizer trait

use crate::autograd::enable_grad;
use crate::error::{Error, Result};
use crate::Tensor;

/// Loss closure passed to [`Optimizer::step`]
///
/// Recomputes the loss (and the parameters' gradients) from the current parameter
/// values. Optimizers evaluate it with gradient recording enabled, before updating.
pub type Closure<'a> = dyn FnMut(&mut [Tensor]) -> Result<f32> + 'a;

/// Trait for optimization algorithms
pub trait Optimizer {
    /// Perform a single optimization step
    ///
    /// Returns the loss produced by `closure`, or `None` when no closure was given.
    fn step(&mut self, params: &mut [Tensor], closure: Option<&mut Closure<'_>>)
        -> Result<Option<f32>>;

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &mut [Tensor]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}

/// Evaluate an optional loss closure with gradient recording enabled
pub(crate) fn evaluate_closure(
    params: &mut [Tensor],
    closure: Option<&mut Closure<'_>>,
) -> Result<Option<f32>> {
    match closure {
        Some(closure) => {
            let _guard = enable_grad();
            closure(params).map(Some)
        }
        None => Ok(None),
    }
}

/// Reject gradients whose shape differs from their parameter's
///
/// Runs before any parameter is touched, so a bad gradient leaves every parameter as it was.
pub(crate) fn check_grads(params: &[Tensor]) -> Result<()> {
    for (index, param) in params.iter().enumerate() {
        let cell = param.grad_cell();
        let grad = cell.borrow();
        if let Some(grad) = grad.as_ref() {
            if grad.shape() != param.shape() {
                return Err(Error::InvalidGradient(format!(
                    "parameter {index} has shape {:?} but its gradient has shape {:?}",
                    param.shape(),
                    grad.shape()
                )));
            }
        }
    }
    Ok(())
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
    fn step(
        &mut self,
        params: &mut [Tensor],
        closure: Option<&mut Closure<'_>>,
    ) -> Result<Option<f32>> {
        (**self).step(params, closure)
    }

    fn zero_grad(&mut self, params: &mut [Tensor]) {
        (**self).zero_grad(params);
    }

    fn lr(&self) -> f32 {
        (**self).lr()
    }

    fn set_lr(&mut self, lr: f32) {
        (**self).set_lr(lr);
    }
}

impl<O: Optimizer + ?Sized> Optimizer for &mut O {
    fn step(
        &mut self,
        params: &mut [Tensor],
        closure: Option<&mut Closure<'_>>,
    ) -> Result<Option<f32>> {
        (**self).step(params, closure)
    }

    fn zero_grad(&mut self, params: &mut [Tensor]) {
        (**self).zero_grad(params);
    }

    fn lr(&self) -> f32 {
        (**self).lr()
    }

    fn set_lr(&mut self, lr: f32) {
        (**self).set_lr(lr);
    }
}

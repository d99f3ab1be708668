//! Stochastic Gradient Descent optimizer

use super::optimizer::{check_grads, evaluate_closure, Closure};
use super::Optimizer;
use crate::error::Result;
use crate::Tensor;
use ndarray::ArrayD;

/// SGD optimizer with optional momentum
pub struct SGD {
    lr: f32,
    momentum: f32,
    velocities: Vec<Option<ArrayD<f32>>>,
}

impl SGD {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self {
            lr,
            momentum,
            velocities: Vec::new(),
        }
    }

    /// Create an SGD optimizer with a velocity slot per parameter
    ///
    /// Matches the base-optimizer factory shape used by the spherical wrappers.
    pub fn for_params(params: &[Tensor], lr: f32, momentum: f32) -> Self {
        Self {
            lr,
            momentum,
            velocities: vec![None; params.len()],
        }
    }

    /// Momentum factor
    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    /// Initialize velocities if needed
    fn ensure_velocities(&mut self, params: &[Tensor]) {
        if self.velocities.len() != params.len() {
            self.velocities = vec![None; params.len()];
        }
    }
}

impl Optimizer for SGD {
    fn step(
        &mut self,
        params: &mut [Tensor],
        closure: Option<&mut Closure<'_>>,
    ) -> Result<Option<f32>> {
        let loss = evaluate_closure(params, closure)?;
        check_grads(params)?;
        self.ensure_velocities(params);

        for (i, param) in params.iter_mut().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };

            if self.momentum > 0.0 {
                // v = momentum * v - lr * grad
                let velocity = match &self.velocities[i] {
                    Some(v) => v * self.momentum - &grad * self.lr,
                    None => &grad * (-self.lr),
                };

                *param.data_mut() += &velocity;
                self.velocities[i] = Some(velocity);
            } else {
                // Simple SGD: param -= lr * grad
                param.data_mut().scaled_add(-self.lr, &grad);
            }
        }

        Ok(loss)
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

//! AdamW optimizer (Adam with decoupled Weight decay)

use super::optimizer::{check_grads, evaluate_closure, Closure};
use super::Optimizer;
use crate::error::Result;
use crate::Tensor;
use ndarray::ArrayD;

/// AdamW optimizer
///
/// Standard Adam with L2: θ_t = θ_{t-1} - lr * (m_t / (√v_t + ε) + λ * θ_{t-1})
/// AdamW: θ_t = (1 - lr * λ) * θ_{t-1} - lr * m_t / (√v_t + ε)
///
/// Under a spherical wrapper the decay shrinks the tensor toward the origin and the
/// projection restores its radius, so only the direction update survives a step.
pub struct AdamW {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    t: u64,
    m: Vec<Option<ArrayD<f32>>>,
    v: Vec<Option<ArrayD<f32>>>,
}

impl AdamW {
    /// Create a new AdamW optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32, weight_decay: f32) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon,
            weight_decay,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    /// Create AdamW with default parameters (weight_decay = 0.01)
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8, 0.01)
    }

    /// Create AdamW with default betas and one moment slot per parameter
    pub fn for_params(params: &[Tensor], lr: f32, weight_decay: f32) -> Self {
        let mut adamw = Self::new(lr, 0.9, 0.999, 1e-8, weight_decay);
        adamw.ensure_moments(params);
        adamw
    }

    fn ensure_moments(&mut self, params: &[Tensor]) {
        if self.m.len() != params.len() {
            self.m = vec![None; params.len()];
            self.v = vec![None; params.len()];
        }
    }
}

impl Optimizer for AdamW {
    fn step(
        &mut self,
        params: &mut [Tensor],
        closure: Option<&mut Closure<'_>>,
    ) -> Result<Option<f32>> {
        let loss = evaluate_closure(params, closure)?;
        check_grads(params)?;
        self.ensure_moments(params);
        self.t += 1;

        let lr_t = self.lr
            * ((1.0 - self.beta2.powi(self.t as i32)).sqrt()
                / (1.0 - self.beta1.powi(self.t as i32)));

        for (i, param) in params.iter_mut().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };

            let m_t = match &self.m[i] {
                Some(m) => m * self.beta1 + &grad * (1.0 - self.beta1),
                None => &grad * (1.0 - self.beta1),
            };

            let grad_sq = &grad * &grad;
            let v_t = match &self.v[i] {
                Some(v) => v * self.beta2 + &grad_sq * (1.0 - self.beta2),
                None => &grad_sq * (1.0 - self.beta2),
            };

            let adaptive_update = &m_t / &(v_t.mapv(f32::sqrt) + self.epsilon) * lr_t;

            // Decoupled: decay the parameter itself, not the gradient
            let weight_decay_factor = 1.0 - self.lr * self.weight_decay;
            let data = param.data_mut();
            *data *= weight_decay_factor;
            *data -= &adaptive_update;

            self.m[i] = Some(m_t);
            self.v[i] = Some(v_t);
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

//! Build optimizers from configuration

use super::schema::{OptimSpec, PostProcessSpec, SchedulerSpec, SphereSpec};
use crate::error::{Error, Result};
use crate::optim::{
    Adam, AdamW, Clamp, Closure, CosineAnnealingLR, Optimizer, RadiusRecords,
    SphericalOptimizer, StepPostProcessOptimizer, SGD,
};
use crate::Tensor;
use tracing::debug;

/// Build a base optimizer from configuration
///
/// The signature matches the base-optimizer factory the spherical wrappers accept, so
/// it can be passed straight to [`SphericalOptimizer::new`].
pub fn build_optimizer(params: &[Tensor], spec: &OptimSpec) -> Result<Box<dyn Optimizer>> {
    match spec.name.to_lowercase().as_str() {
        "sgd" => {
            let momentum = spec.param_or("momentum", 0.0);
            Ok(Box::new(SGD::for_params(params, spec.lr, momentum)))
        }
        "adam" => {
            let beta1 = spec.param_or("beta1", 0.9);
            let beta2 = spec.param_or("beta2", 0.999);
            let eps = spec.param_or("eps", 1e-8);

            Ok(Box::new(Adam::new(spec.lr, beta1, beta2, eps)))
        }
        "adamw" => {
            let beta1 = spec.param_or("beta1", 0.9);
            let beta2 = spec.param_or("beta2", 0.999);
            let eps = spec.param_or("eps", 1e-8);
            let weight_decay = spec.param_or("weight_decay", 0.01);

            Ok(Box::new(AdamW::new(
                spec.lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            )))
        }
        name => Err(Error::ConfigError(format!(
            "Unknown optimizer: {}. Supported: sgd, adam, adamw",
            name
        ))),
    }
}

/// Build a cosine schedule starting from the optimizer's configured rate
pub fn build_scheduler(optimizer: &OptimSpec, spec: &SchedulerSpec) -> Result<CosineAnnealingLR> {
    match spec.name.to_lowercase().as_str() {
        "cosine" => Ok(CosineAnnealingLR::new(optimizer.lr, spec.t_max, spec.lr_min)),
        name => Err(Error::ConfigError(format!(
            "Unknown scheduler: {}. Supported: cosine",
            name
        ))),
    }
}

/// Spherical optimizer built from a [`SphereSpec`]
pub enum SphereOptimizer {
    /// Projection only
    Plain(SphericalOptimizer<Box<dyn Optimizer>>),
    /// Clamp, then projection
    Clamped(StepPostProcessOptimizer<Box<dyn Optimizer>, Clamp>),
}

impl SphereOptimizer {
    /// Radii recorded at construction
    pub fn radii(&self) -> &RadiusRecords {
        match self {
            Self::Plain(opt) => opt.radii(),
            Self::Clamped(opt) => opt.radii(),
        }
    }
}

impl Optimizer for SphereOptimizer {
    fn step(
        &mut self,
        params: &mut [Tensor],
        closure: Option<&mut Closure<'_>>,
    ) -> Result<Option<f32>> {
        match self {
            Self::Plain(opt) => opt.step(params, closure),
            Self::Clamped(opt) => opt.step(params, closure),
        }
    }

    fn zero_grad(&mut self, params: &mut [Tensor]) {
        match self {
            Self::Plain(opt) => opt.zero_grad(params),
            Self::Clamped(opt) => opt.zero_grad(params),
        }
    }

    fn lr(&self) -> f32 {
        match self {
            Self::Plain(opt) => opt.lr(),
            Self::Clamped(opt) => opt.lr(),
        }
    }

    fn set_lr(&mut self, lr: f32) {
        match self {
            Self::Plain(opt) => opt.set_lr(lr),
            Self::Clamped(opt) => opt.set_lr(lr),
        }
    }
}

/// Build the spherical wrapper a [`SphereSpec`] describes around `params`
pub fn build_spherical(spec: &SphereSpec, params: &[Tensor]) -> Result<SphereOptimizer> {
    debug!(
        optimizer = %spec.optimizer.name,
        lr = spec.optimizer.lr,
        postprocess = ?spec.postprocess,
        "building spherical optimizer"
    );

    match &spec.postprocess {
        None => Ok(SphereOptimizer::Plain(SphericalOptimizer::new(
            build_optimizer,
            params,
            &spec.optimizer,
        )?)),
        Some(PostProcessSpec::Clamp { min, max }) => {
            Ok(SphereOptimizer::Clamped(StepPostProcessOptimizer::new(
                build_optimizer,
                params,
                Clamp::new(*min, *max)?,
                &spec.optimizer,
            )?))
        }
    }
}

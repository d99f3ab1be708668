//! Spherical wrapper with a post-processing hook
//!
//! Same as [`SphericalOptimizer`](super::SphericalOptimizer), except a caller-supplied
//! transform runs over the parameters between the base update and the projection.
//! Whatever the transform does is renormalized onto the original sphere afterwards.

use super::optimizer::Closure;
use super::spherical::RadiusRecords;
use super::Optimizer;
use crate::autograd::no_grad;
use crate::error::{Error, Result};
use crate::Tensor;
use tracing::trace;

/// In-place transform applied to all managed parameters after each base update
pub trait PostProcess {
    /// Mutate `params` in place
    fn apply(&mut self, params: &mut [Tensor]) -> Result<()>;
}

impl<F> PostProcess for F
where
    F: FnMut(&mut [Tensor]) -> Result<()>,
{
    fn apply(&mut self, params: &mut [Tensor]) -> Result<()> {
        self(params)
    }
}

/// Clamp every element into `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clamp {
    min: f32,
    max: f32,
}

impl Clamp {
    /// Fails when `min > max` or either bound is NaN
    pub fn new(min: f32, max: f32) -> Result<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(Error::InvalidParameter(format!(
                "clamp bounds must satisfy min <= max, got [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }
}

impl PostProcess for Clamp {
    fn apply(&mut self, params: &mut [Tensor]) -> Result<()> {
        for param in params {
            param.data_mut().mapv_inplace(|x| x.clamp(self.min, self.max));
        }
        Ok(())
    }
}

/// Spherical optimizer that runs a [`PostProcess`] before projecting
pub struct StepPostProcessOptimizer<O, P> {
    inner: O,
    postprocess: P,
    radii: RadiusRecords,
}

impl<O: Optimizer, P: PostProcess> StepPostProcessOptimizer<O, P> {
    /// Build the base optimizer with `factory` and record the radius of every parameter
    pub fn new<C, F>(factory: F, params: &[Tensor], postprocess: P, config: C) -> Result<Self>
    where
        F: FnOnce(&[Tensor], C) -> Result<O>,
    {
        let radii = RadiusRecords::record(params)?;
        let inner = factory(params, config)?;
        Ok(Self {
            inner,
            postprocess,
            radii,
        })
    }

    /// Wrap an already-built optimizer
    pub fn from_optimizer(inner: O, params: &[Tensor], postprocess: P) -> Result<Self> {
        let radii = RadiusRecords::record(params)?;
        Ok(Self {
            inner,
            postprocess,
            radii,
        })
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut O {
        &mut self.inner
    }

    pub fn postprocess(&self) -> &P {
        &self.postprocess
    }

    /// Radii recorded at construction
    pub fn radii(&self) -> &RadiusRecords {
        &self.radii
    }

    pub fn into_parts(self) -> (O, P) {
        (self.inner, self.postprocess)
    }
}

impl<O: Optimizer, P: PostProcess> Optimizer for StepPostProcessOptimizer<O, P> {
    fn step(
        &mut self,
        params: &mut [Tensor],
        closure: Option<&mut Closure<'_>>,
    ) -> Result<Option<f32>> {
        self.radii.check(params)?;

        let _guard = no_grad();
        let loss = self.inner.step(params, closure)?;
        self.postprocess.apply(params)?;
        self.radii.project(params)?;

        trace!(?loss, "post-processed spherical step");
        Ok(loss)
    }

    fn zero_grad(&mut self, params: &mut [Tensor]) {
        self.inner.zero_grad(params);
    }

    fn lr(&self) -> f32 {
        self.inner.lr()
    }

    fn set_lr(&mut self, lr: f32) {
        self.inner.set_lr(lr);
    }
}

//! Spherical projection wrapper
//!
//! Keeps every managed parameter on the sphere it started on. The first two axes of a
//! parameter are batch axes; the norm is taken over all remaining axes, so each batch
//! element keeps its own radius.
//!
//! After the wrapped optimizer's update, each parameter `x` becomes
//!
//! ```text
//! x ← x / sqrt(Σ_{axes ≥ 2} x² + ε) · r₀
//! ```
//!
//! where `r₀` is the same expression evaluated once at construction.
//!
//! # Example
//!
//! ```
//! use esfera::optim::{Optimizer, SphericalOptimizer, SGD};
//! use esfera::Tensor;
//!
//! let mut latent = vec![Tensor::from_shape_vec(&[1, 1, 3], vec![3.0, 4.0, 0.0], true)?];
//! let mut opt = SphericalOptimizer::new(
//!     |params, lr| Ok(SGD::for_params(params, lr, 0.0)),
//!     &latent,
//!     0.01,
//! )?;
//!
//! latent[0].set_grad(ndarray::ArrayD::from_elem(vec![1, 1, 3], 1.0));
//! opt.step(&mut latent, None)?;
//! # Ok::<(), esfera::Error>(())
//! ```

use super::optimizer::Closure;
use super::Optimizer;
use crate::autograd::no_grad;
use crate::error::{Error, Result};
use crate::Tensor;
use ndarray::{ArrayD, Axis};
use tracing::{debug, trace};

/// Added to the sum of squares before the square root, so all-zero slices do not
/// divide by zero
pub const RADIUS_EPSILON: f32 = 1e-9;

/// Leading axes treated as batch axes
pub const BATCH_AXES: usize = 2;

/// Euclidean norm over every axis from index 2 on, keeping reduced axes as size 1
///
/// The result broadcasts against `data`.
pub fn trailing_norm(data: &ArrayD<f32>) -> Result<ArrayD<f32>> {
    let ndim = data.ndim();
    if ndim <= BATCH_AXES {
        return Err(Error::InsufficientRank {
            index: 0,
            ndim,
            min: BATCH_AXES + 1,
        });
    }

    let mut acc = data.mapv(|x| x * x);
    for axis in (BATCH_AXES..ndim).rev() {
        acc = acc.sum_axis(Axis(axis)).insert_axis(Axis(axis));
    }
    acc.mapv_inplace(|s| (s + RADIUS_EPSILON).sqrt());

    Ok(acc)
}

/// Rescale `data` in place so its trailing norm equals `radius`
///
/// `radius` must have the keep-dim shape [`trailing_norm`] produces for `data`.
pub fn project_onto_sphere(data: &mut ArrayD<f32>, radius: &ArrayD<f32>) -> Result<()> {
    let norm = trailing_norm(data)?;
    if norm.shape() != radius.shape() {
        return Err(Error::ShapeMismatch {
            expected: radius.shape().to_vec(),
            got: norm.shape().to_vec(),
        });
    }

    *data /= &norm;
    *data *= radius;
    Ok(())
}

/// Construction-time radius of each managed parameter, indexed by position
///
/// Records are written once and never recomputed; they live exactly as long as the
/// optimizer that owns them.
#[derive(Debug, Clone)]
pub struct RadiusRecords {
    radii: Vec<ArrayD<f32>>,
    shapes: Vec<Vec<usize>>,
}

impl RadiusRecords {
    /// Record the current trailing norm of every parameter
    pub fn record(params: &[Tensor]) -> Result<Self> {
        if params.is_empty() {
            return Err(Error::EmptyParameters);
        }

        let _guard = no_grad();
        let mut radii = Vec::with_capacity(params.len());
        let mut shapes = Vec::with_capacity(params.len());

        for (index, param) in params.iter().enumerate() {
            let radius = trailing_norm(param.data()).map_err(|err| match err {
                Error::InsufficientRank { ndim, min, .. } => {
                    Error::InsufficientRank { index, ndim, min }
                }
                other => other,
            })?;
            radii.push(radius);
            shapes.push(param.shape().to_vec());
        }

        debug!(
            params = radii.len(),
            shapes = ?shapes,
            "recorded spherical radii"
        );

        Ok(Self { radii, shapes })
    }

    /// Radius of the parameter at `index`
    pub fn get(&self, index: usize) -> Option<&ArrayD<f32>> {
        self.radii.get(index)
    }

    /// Number of managed parameters
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    /// Always false for records built by [`RadiusRecords::record`]
    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    /// Iterate radii in parameter order
    pub fn iter(&self) -> impl Iterator<Item = &ArrayD<f32>> {
        self.radii.iter()
    }

    /// Check that `params` are the tensors these records were taken from
    pub fn check(&self, params: &[Tensor]) -> Result<()> {
        if params.len() != self.radii.len() {
            return Err(Error::ParameterCountMismatch {
                expected: self.radii.len(),
                got: params.len(),
            });
        }

        for (param, shape) in params.iter().zip(&self.shapes) {
            if param.shape() != shape.as_slice() {
                return Err(Error::ShapeMismatch {
                    expected: shape.clone(),
                    got: param.shape().to_vec(),
                });
            }
        }

        Ok(())
    }

    /// Project every parameter back onto its recorded sphere
    pub fn project(&self, params: &mut [Tensor]) -> Result<()> {
        self.check(params)?;

        let _guard = no_grad();
        for (param, radius) in params.iter_mut().zip(&self.radii) {
            project_onto_sphere(param.data_mut(), radius)?;
        }

        Ok(())
    }
}

/// Optimizer wrapper that renormalizes parameters onto their initial sphere after
/// every step of the wrapped optimizer
pub struct SphericalOptimizer<O> {
    inner: O,
    radii: RadiusRecords,
}

impl<O: Optimizer> SphericalOptimizer<O> {
    /// Build the base optimizer with `factory` and record the radius of every parameter
    ///
    /// `config` is forwarded to the factory untouched (a learning rate, a config
    /// struct, ...). Fails when `params` is empty or any parameter has fewer than
    /// three dimensions.
    pub fn new<C, F>(factory: F, params: &[Tensor], config: C) -> Result<Self>
    where
        F: FnOnce(&[Tensor], C) -> Result<O>,
    {
        let radii = RadiusRecords::record(params)?;
        let inner = factory(params, config)?;
        Ok(Self { inner, radii })
    }

    /// Wrap an already-built optimizer
    pub fn from_optimizer(inner: O, params: &[Tensor]) -> Result<Self> {
        let radii = RadiusRecords::record(params)?;
        Ok(Self { inner, radii })
    }

    /// The wrapped optimizer
    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Mutable access to the wrapped optimizer
    pub fn inner_mut(&mut self) -> &mut O {
        &mut self.inner
    }

    /// Radii recorded at construction
    pub fn radii(&self) -> &RadiusRecords {
        &self.radii
    }

    /// Unwrap the base optimizer, dropping the radius records
    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<O: Optimizer> Optimizer for SphericalOptimizer<O> {
    /// Delegate to the wrapped optimizer, then project onto the recorded spheres
    ///
    /// Returns the wrapped optimizer's result unchanged.
    fn step(
        &mut self,
        params: &mut [Tensor],
        closure: Option<&mut Closure<'_>>,
    ) -> Result<Option<f32>> {
        self.radii.check(params)?;

        let _guard = no_grad();
        let loss = self.inner.step(params, closure)?;
        self.radii.project(params)?;

        trace!(?loss, "spherical step");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::SGD;
    use approx::assert_abs_diff_eq;
    use ndarray::IxDyn;

    fn latent(shape: &[usize], values: Vec<f32>) -> Tensor {
        Tensor::from_shape_vec(shape, values, true).unwrap()
    }

    #[test]
    fn test_trailing_norm_keeps_dims() {
        let t = latent(&[2, 1, 2, 2], vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 3.0, 4.0]);
        let norm = trailing_norm(t.data()).unwrap();

        assert_eq!(norm.shape(), &[2, 1, 1, 1]);
        assert_abs_diff_eq!(norm[[0, 0, 0, 0]], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(norm[[1, 0, 0, 0]], 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_trailing_norm_of_zeros_is_epsilon_root() {
        let norm = trailing_norm(&ArrayD::zeros(IxDyn(&[1, 1, 4]))).unwrap();
        assert_abs_diff_eq!(norm[[0, 0, 0]], RADIUS_EPSILON.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_trailing_norm_rejects_two_dims() {
        let err = trailing_norm(&ArrayD::ones(IxDyn(&[2, 3]))).unwrap_err();
        assert!(matches!(err, Error::InsufficientRank { ndim: 2, min: 3, .. }));
    }

    #[test]
    fn test_project_onto_sphere_restores_radius() {
        let mut data = latent(&[1, 1, 3], vec![30.0, 40.0, 0.0]).data().clone();
        let radius = ArrayD::from_elem(IxDyn(&[1, 1, 1]), 5.0);

        project_onto_sphere(&mut data, &radius).unwrap();

        assert_abs_diff_eq!(data[[0, 0, 0]], 3.0, epsilon = 1e-5);
        assert_abs_diff_eq!(data[[0, 0, 1]], 4.0, epsilon = 1e-5);
        assert_abs_diff_eq!(data[[0, 0, 2]], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_project_onto_sphere_rejects_wrong_radius_shape() {
        let mut data = ArrayD::ones(IxDyn(&[2, 1, 3]));
        let radius = ArrayD::ones(IxDyn(&[1, 1, 1]));

        let err = project_onto_sphere(&mut data, &radius).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_records_reject_empty_params() {
        assert!(matches!(
            RadiusRecords::record(&[]).unwrap_err(),
            Error::EmptyParameters
        ));
    }

    #[test]
    fn test_records_report_offending_index() {
        let params = vec![latent(&[1, 1, 2], vec![1.0, 0.0]), Tensor::ones(&[4, 4], true)];
        let err = RadiusRecords::record(&params).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientRank { index: 1, ndim: 2, min: 3 }
        ));
    }

    #[test]
    fn test_step_projects_back_to_initial_radius() {
        let mut params = vec![latent(&[1, 1, 3], vec![3.0, 4.0, 0.0])];
        let mut opt =
            SphericalOptimizer::new(|p, lr| Ok(SGD::for_params(p, lr, 0.0)), &params, 1.0).unwrap();

        // Raw SGD step moves [3, 4, 0] to [30, 40, 0]
        params[0].set_grad(ArrayD::from_shape_vec(IxDyn(&[1, 1, 3]), vec![-27.0, -36.0, 0.0]).unwrap());
        let loss = opt.step(&mut params, None).unwrap();

        assert!(loss.is_none());
        let data = params[0].data();
        assert_abs_diff_eq!(data[[0, 0, 0]], 3.0, epsilon = 1e-5);
        assert_abs_diff_eq!(data[[0, 0, 1]], 4.0, epsilon = 1e-5);
        assert_abs_diff_eq!(data[[0, 0, 2]], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_step_forwards_closure_loss() {
        let mut params = vec![latent(&[1, 1, 2], vec![1.0, 0.0])];
        let mut opt = SphericalOptimizer::from_optimizer(SGD::new(0.1, 0.0), &params).unwrap();

        let mut closure = |params: &mut [Tensor]| -> Result<f32> {
            params[0].set_grad(ArrayD::from_elem(IxDyn(&[1, 1, 2]), 1.0));
            Ok(0.25)
        };

        assert_eq!(opt.step(&mut params, Some(&mut closure)).unwrap(), Some(0.25));
    }

    #[test]
    fn test_step_rejects_foreign_params() {
        let params = vec![latent(&[1, 1, 2], vec![1.0, 0.0])];
        let mut opt = SphericalOptimizer::from_optimizer(SGD::new(0.1, 0.0), &params).unwrap();

        let mut other = vec![latent(&[1, 1, 3], vec![1.0, 0.0, 0.0])];
        assert!(matches!(
            opt.step(&mut other, None).unwrap_err(),
            Error::ShapeMismatch { .. }
        ));

        let mut more = vec![params[0].clone(), params[0].clone()];
        assert!(matches!(
            opt.step(&mut more, None).unwrap_err(),
            Error::ParameterCountMismatch { expected: 1, got: 2 }
        ));
    }

    #[test]
    fn test_lr_forwards_to_inner() {
        let params = vec![latent(&[1, 1, 2], vec![1.0, 0.0])];
        let mut opt = SphericalOptimizer::from_optimizer(SGD::new(0.1, 0.0), &params).unwrap();

        opt.set_lr(0.5);
        assert_abs_diff_eq!(opt.inner().lr(), 0.5);
        assert_abs_diff_eq!(opt.lr(), 0.5);
    }

    #[test]
    fn test_radii_recorded_under_no_grad_and_unchanged_by_steps() {
        let mut params = vec![latent(&[2, 1, 2], vec![3.0, 4.0, 0.0, 2.0])];
        let mut opt = SphericalOptimizer::from_optimizer(SGD::new(0.3, 0.0), &params).unwrap();
        let before = opt.radii().get(0).unwrap().clone();

        for _ in 0..5 {
            params[0].set_grad(ArrayD::from_elem(IxDyn(&[2, 1, 2]), 1.0));
            opt.step(&mut params, None).unwrap();
        }

        assert_eq!(opt.radii().get(0).unwrap(), &before);
        assert_eq!(opt.radii().len(), 1);
    }
}

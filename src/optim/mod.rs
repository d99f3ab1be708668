//! Optimizers and the spherical projection wrappers built on top of them

mod adam;
mod adamw;
mod optimizer;
mod postprocess;
mod scheduler;
mod sgd;
mod spherical;


pub use adam::Adam;
pub use adamw::AdamW;
pub use optimizer::{Closure, Optimizer};
pub use postprocess::{Clamp, PostProcess, StepPostProcessOptimizer};
pub use scheduler::{CosineAnnealingLR, LRScheduler};
pub use sgd::SGD;
pub use spherical::{
    project_onto_sphere, trailing_norm, RadiusRecords, SphericalOptimizer, BATCH_AXES,
    RADIUS_EPSILON,
};

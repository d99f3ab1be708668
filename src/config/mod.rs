//! Declarative YAML configuration
//!
//! Describes the base optimizer a spherical wrapper forwards its settings to, plus an
//! optional post-process and learning rate schedule.
//!
//! # Example
//!
//! ```yaml
//! optimizer:
//!   name: adam
//!   lr: 0.1
//!   beta1: 0.9
//!
//! postprocess:
//!   kind: clamp
//!   min: -3.0
//!   max: 3.0
//!
//! scheduler:
//!   name: cosine
//!   t_max: 500
//! ```

mod builder;
mod load;
mod schema;
mod validate;



pub use builder::{build_optimizer, build_scheduler, build_spherical, SphereOptimizer};
pub use load::{load_config, parse_config, to_yaml};
pub use schema::{OptimSpec, PostProcessSpec, SchedulerSpec, SphereSpec};
pub use validate::{validate_config, ValidationError, OPTIMIZERS};

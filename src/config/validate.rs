//! Configuration validation

use super::schema::{PostProcessSpec, SphereSpec};

/// Validation error type
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid learning rate: {0} (must be finite and > 0.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid optimizer: {0} (must be one of: adam, adamw, sgd)")]
    InvalidOptimizer(String),

    #[error("Invalid momentum: {0} (must be in [0.0, 1.0))")]
    InvalidMomentum(f32),

    #[error("Invalid {name}: {value} (must be in [0.0, 1.0))")]
    InvalidBeta { name: &'static str, value: f32 },

    #[error("Invalid epsilon: {0} (must be finite and > 0.0)")]
    InvalidEpsilon(f32),

    #[error("Invalid weight decay: {0} (must be finite and >= 0.0)")]
    InvalidWeightDecay(f32),

    #[error("Invalid optimizer parameter {key}: {value} (must be a number)")]
    NonNumericParameter { key: String, value: String },

    #[error("Invalid clamp bounds: [{min}, {max}] (min must be <= max)")]
    InvalidClampBounds { min: f32, max: f32 },

    #[error("Invalid scheduler: {0} (must be: cosine)")]
    InvalidScheduler(String),

    #[error("Invalid scheduler length: {0} (must be > 0)")]
    InvalidSchedulerSteps(usize),
}

/// Known optimizer names
pub const OPTIMIZERS: [&str; 3] = ["adam", "adamw", "sgd"];

/// Validate a spherical optimizer config
///
/// Checks:
/// - Numeric values are in valid ranges
/// - Names match allowed values
/// - Optimizer parameters are numbers
pub fn validate_config(spec: &SphereSpec) -> Result<(), ValidationError> {
    let optimizer = &spec.optimizer;

    if !optimizer.lr.is_finite() || optimizer.lr <= 0.0 {
        return Err(ValidationError::InvalidLearningRate(optimizer.lr));
    }

    let name = optimizer.name.to_lowercase();
    if !OPTIMIZERS.contains(&name.as_str()) {
        return Err(ValidationError::InvalidOptimizer(optimizer.name.clone()));
    }

    let mut keys: Vec<&String> = optimizer.params.keys().collect();
    keys.sort();
    for key in keys {
        let value = &optimizer.params[key];
        if !value.is_number() {
            return Err(ValidationError::NonNumericParameter {
                key: key.clone(),
                value: value.to_string(),
            });
        }
    }

    if name == "adam" || name == "adamw" {
        for beta in ["beta1", "beta2"] {
            let value = optimizer.param_or(beta, 0.9);
            if !(0.0..1.0).contains(&value) {
                return Err(ValidationError::InvalidBeta { name: beta, value });
            }
        }

        let eps = optimizer.param_or("eps", 1e-8);
        if !eps.is_finite() || eps <= 0.0 {
            return Err(ValidationError::InvalidEpsilon(eps));
        }
    }

    if name == "adamw" {
        let weight_decay = optimizer.param_or("weight_decay", 0.01);
        if !weight_decay.is_finite() || weight_decay < 0.0 {
            return Err(ValidationError::InvalidWeightDecay(weight_decay));
        }
    }

    if name == "sgd" {
        let momentum = optimizer.param_or("momentum", 0.0);
        if !(0.0..1.0).contains(&momentum) {
            return Err(ValidationError::InvalidMomentum(momentum));
        }
    }

    if let Some(PostProcessSpec::Clamp { min, max }) = &spec.postprocess {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(ValidationError::InvalidClampBounds {
                min: *min,
                max: *max,
            });
        }
    }

    if let Some(scheduler) = &spec.scheduler {
        if scheduler.name.to_lowercase() != "cosine" {
            return Err(ValidationError::InvalidScheduler(scheduler.name.clone()));
        }
        if scheduler.t_max == 0 {
            return Err(ValidationError::InvalidSchedulerSteps(scheduler.t_max));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{OptimSpec, SchedulerSpec};

    fn spec(optimizer: OptimSpec) -> SphereSpec {
        SphereSpec {
            optimizer,
            postprocess: None,
            scheduler: None,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&spec(OptimSpec::new("Adam", 0.01))).is_ok());
    }

    #[test]
    fn test_rejects_zero_and_nan_lr() {
        assert_eq!(
            validate_config(&spec(OptimSpec::new("sgd", 0.0))),
            Err(ValidationError::InvalidLearningRate(0.0))
        );
        assert!(matches!(
            validate_config(&spec(OptimSpec::new("sgd", f32::NAN))),
            Err(ValidationError::InvalidLearningRate(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_optimizer() {
        assert_eq!(
            validate_config(&spec(OptimSpec::new("lbfgs", 0.1))),
            Err(ValidationError::InvalidOptimizer("lbfgs".to_string()))
        );
    }

    #[test]
    fn test_rejects_momentum_out_of_range() {
        let optimizer = OptimSpec::new("sgd", 0.1).with_param("momentum", 1.5);
        assert_eq!(
            validate_config(&spec(optimizer)),
            Err(ValidationError::InvalidMomentum(1.5))
        );
    }

    #[test]
    fn test_rejects_inverted_clamp() {
        let mut s = spec(OptimSpec::new("adam", 0.1));
        s.postprocess = Some(PostProcessSpec::Clamp { min: 1.0, max: 0.0 });
        assert_eq!(
            validate_config(&s),
            Err(ValidationError::InvalidClampBounds { min: 1.0, max: 0.0 })
        );
    }

    #[test]
    fn test_rejects_bad_scheduler() {
        let mut s = spec(OptimSpec::new("adam", 0.1));
        s.scheduler = Some(SchedulerSpec {
            name: "cosine".into(),
            t_max: 0,
            lr_min: 0.0,
        });
        assert_eq!(
            validate_config(&s),
            Err(ValidationError::InvalidSchedulerSteps(0))
        );

        s.scheduler = Some(SchedulerSpec {
            name: "step".into(),
            t_max: 10,
            lr_min: 0.0,
        });
        assert!(matches!(
            validate_config(&s),
            Err(ValidationError::InvalidScheduler(_))
        ));
    }

    #[test]
    fn test_rejects_adam_beta_of_one() {
        let optimizer = OptimSpec::new("adam", 0.1).with_param("beta1", 1.0);
        assert_eq!(
            validate_config(&spec(optimizer)),
            Err(ValidationError::InvalidBeta {
                name: "beta1",
                value: 1.0
            })
        );

        let optimizer = OptimSpec::new("adamw", 0.1).with_param("beta2", -0.1);
        assert!(matches!(
            validate_config(&spec(optimizer)),
            Err(ValidationError::InvalidBeta { name: "beta2", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_epsilon() {
        let optimizer = OptimSpec::new("adam", 0.1).with_param("eps", 0.0);
        assert_eq!(
            validate_config(&spec(optimizer)),
            Err(ValidationError::InvalidEpsilon(0.0))
        );
    }

    #[test]
    fn test_rejects_negative_weight_decay() {
        let optimizer = OptimSpec::new("adamw", 0.1).with_param("weight_decay", -0.5);
        assert_eq!(
            validate_config(&spec(optimizer)),
            Err(ValidationError::InvalidWeightDecay(-0.5))
        );
    }

    #[test]
    fn test_accepts_adam_defaults_and_edges() {
        let optimizer = OptimSpec::new("adamw", 0.1)
            .with_param("beta1", 0.0)
            .with_param("beta2", 0.999)
            .with_param("weight_decay", 0.0);
        assert!(validate_config(&spec(optimizer)).is_ok());
    }

    #[test]
    fn test_rejects_quoted_momentum() {
        let mut optimizer = OptimSpec::new("sgd", 0.1);
        optimizer
            .params
            .insert("momentum".to_string(), serde_json::json!("1.5"));
        assert_eq!(
            validate_config(&spec(optimizer)),
            Err(ValidationError::NonNumericParameter {
                key: "momentum".to_string(),
                value: "\"1.5\"".to_string(),
            })
        );
    }
}

//! YAML schema definitions for spherical optimizer configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete spherical optimizer config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphereSpec {
    /// Base optimizer configuration (forwarded to the base optimizer)
    pub optimizer: OptimSpec,

    /// Optional post-process run between the base update and the projection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postprocess: Option<PostProcessSpec>,

    /// Optional learning rate schedule for the base optimizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerSpec>,
}

/// Base optimizer config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimSpec {
    /// Optimizer name: "adam" | "adamw" | "sgd"
    pub name: String,

    /// Learning rate
    pub lr: f32,

    /// Optimizer-specific parameters (beta1, beta2, eps, momentum, weight_decay)
    #[serde(flatten)]
    pub params: HashMap<String, serde_json::Value>,
}

impl OptimSpec {
    /// Spec with no optimizer-specific parameters
    pub fn new(name: impl Into<String>, lr: f32) -> Self {
        Self {
            name: name.into(),
            lr,
            params: HashMap::new(),
        }
    }

    /// Add an optimizer-specific parameter
    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), serde_json::json!(value));
        self
    }

    /// Numeric parameter, or `default` when absent or not a number
    pub fn param_or(&self, key: &str, default: f32) -> f32 {
        self.params
            .get(key)
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .unwrap_or(default)
    }
}

/// Post-process applied after each base update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostProcessSpec {
    /// Clamp every element into `[min, max]`
    Clamp { min: f32, max: f32 },
}

/// Learning rate schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSpec {
    /// Scheduler name: "cosine"
    pub name: String,

    /// Steps until the minimum rate is reached
    pub t_max: usize,

    /// Minimum learning rate
    #[serde(default)]
    pub lr_min: f32,
}

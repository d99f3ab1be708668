//! # Esfera: Spherical Projecting Optimizers
//!
//! Esfera wraps any gradient-based optimizer so that, after every step, each parameter
//! tensor is rescaled back onto the hypersphere it started on. Norms are taken over
//! every axis after the first two, so each `[batch, channel]` slice keeps its own radius.
//!
//! ## Architecture
//!
//! - **autograd**: Minimal reverse-mode autodiff over n-dimensional tensors
//! - **optim**: Base optimizers (SGD, Adam, AdamW), the spherical wrappers, and schedules
//! - **config**: Declarative YAML configuration

pub mod autograd;
pub mod config;
pub mod optim;

pub mod error;

// Re-export commonly used types
pub use autograd::{backward, enable_grad, no_grad, Context, Tensor};
pub use error::{Error, Result};

//! Execution context and gradient-recording mode
//!
//! Gradient recording is a per-thread switch. Ops consult [`is_grad_enabled`] before
//! attaching a backward operation, so bookkeeping done inside a [`no_grad`] scope never
//! becomes part of a computational graph.

use std::cell::Cell;

thread_local! {
    static GRAD_ENABLED: Cell<bool> = Cell::new(true);
}

/// Whether ops on this thread currently record backward operations
pub fn is_grad_enabled() -> bool {
    GRAD_ENABLED.with(Cell::get)
}

fn set_grad_enabled(enabled: bool) -> bool {
    GRAD_ENABLED.with(|flag| flag.replace(enabled))
}

/// Scope guard restoring the previous gradient mode on drop
#[must_use = "gradient mode is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct GradModeGuard {
    previous: bool,
}

impl Drop for GradModeGuard {
    fn drop(&mut self) {
        set_grad_enabled(self.previous);
    }
}

/// Disable gradient recording until the returned guard is dropped
///
/// ```
/// use esfera::autograd::{is_grad_enabled, no_grad};
///
/// {
///     let _guard = no_grad();
///     assert!(!is_grad_enabled());
/// }
/// assert!(is_grad_enabled());
/// ```
pub fn no_grad() -> GradModeGuard {
    GradModeGuard {
        previous: set_grad_enabled(false),
    }
}

/// Re-enable gradient recording until the returned guard is dropped
///
/// Used by optimizers to evaluate a loss closure from inside a `no_grad` step.
pub fn enable_grad() -> GradModeGuard {
    GradModeGuard {
        previous: set_grad_enabled(true),
    }
}

/// Context for managing the computational graph
pub struct Context {
    training: bool,
}

impl Context {
    /// Create a new context
    pub fn new() -> Self {
        Self { training: true }
    }

    /// Set training mode
    pub fn train(&mut self) {
        self.training = true;
    }

    /// Set evaluation mode
    pub fn eval(&mut self) {
        self.training = false;
    }

    /// Check if in training mode
    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Run `f` without recording gradients
    pub fn without_grad<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = no_grad();
        f()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

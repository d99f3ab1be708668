//! Backward operation trait

/// Trait for backward pass operations
pub trait BackwardOp {
    /// Propagate the result gradient to the inputs, then recurse into them
    fn backward(&self);
}

//! Autograd operations with backward passes
//!
//! Every op checks [`is_grad_enabled`] so results built inside a `no_grad` scope carry
//! neither `requires_grad` nor a backward op.

use super::{is_grad_enabled, BackwardOp, Tensor};
use ndarray::{ArrayD, IxDyn};
use std::cell::RefCell;
use std::rc::Rc;

type GradCell = Rc<RefCell<Option<ArrayD<f32>>>>;

fn tracks(inputs: &[&Tensor]) -> bool {
    is_grad_enabled() && inputs.iter().any(|t| t.requires_grad())
}

fn recurse(inputs: &[&Tensor]) {
    for input in inputs {
        if let Some(op) = input.backward_op() {
            op.backward();
        }
    }
}

/// Add two tensors
///
/// # Panics
///
/// Panics if the shapes of `a` and `b` cannot be broadcast together.
pub fn add(a: &Tensor, b: &Tensor) -> Tensor {
    let data = a.data() + b.data();
    let requires_grad = tracks(&[a, b]);

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(AddBackward {
            a: a.clone(),
            b: b.clone(),
            sign: 1.0,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

/// Subtract `b` from `a` element-wise
///
/// # Panics
///
/// Panics if the shapes of `a` and `b` cannot be broadcast together.
pub fn sub(a: &Tensor, b: &Tensor) -> Tensor {
    let data = a.data() - b.data();
    let requires_grad = tracks(&[a, b]);

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(AddBackward {
            a: a.clone(),
            b: b.clone(),
            sign: -1.0,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

/// Shared by `add` (sign = 1) and `sub` (sign = -1)
struct AddBackward {
    a: Tensor,
    b: Tensor,
    sign: f32,
    result_grad: GradCell,
}

impl BackwardOp for AddBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                self.a.accumulate_grad(grad.clone());
            }
            if self.b.requires_grad() {
                self.b.accumulate_grad(grad * self.sign);
            }

            recurse(&[&self.a, &self.b]);
        }
    }
}

/// Multiply two tensors element-wise
///
/// # Panics
///
/// Panics if the shapes of `a` and `b` cannot be broadcast together.
pub fn mul(a: &Tensor, b: &Tensor) -> Tensor {
    let data = a.data() * b.data();
    let requires_grad = tracks(&[a, b]);

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(MulBackward {
            a: a.clone(),
            b: b.clone(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct MulBackward {
    a: Tensor,
    b: Tensor,
    result_grad: GradCell,
}

impl BackwardOp for MulBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // ∂L/∂a = ∂L/∂out * b
                self.a.accumulate_grad(grad * self.b.data());
            }
            if self.b.requires_grad() {
                // ∂L/∂b = ∂L/∂out * a
                self.b.accumulate_grad(grad * self.a.data());
            }

            recurse(&[&self.a, &self.b]);
        }
    }
}

/// Scale tensor by a scalar
pub fn scale(a: &Tensor, factor: f32) -> Tensor {
    let data = a.data() * factor;
    let requires_grad = tracks(&[a]);

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(ScaleBackward {
            a: a.clone(),
            factor,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct ScaleBackward {
    a: Tensor,
    factor: f32,
    result_grad: GradCell,
}

impl BackwardOp for ScaleBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                self.a.accumulate_grad(grad * self.factor);
            }

            recurse(&[&self.a]);
        }
    }
}

/// Sum all elements into a one-element tensor
pub fn sum(a: &Tensor) -> Tensor {
    let data = ArrayD::from_elem(IxDyn(&[1]), a.data().sum());
    let requires_grad = tracks(&[a]);

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(SumBackward {
            a: a.clone(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct SumBackward {
    a: Tensor,
    result_grad: GradCell,
}

impl BackwardOp for SumBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // ∂L/∂a = ∂L/∂sum * 1 (broadcast)
                let grad_val = grad.iter().next().copied().unwrap_or(0.0);
                self.a
                    .accumulate_grad(ArrayD::from_elem(self.a.data().raw_dim(), grad_val));
            }

            recurse(&[&self.a]);
        }
    }
}

/// Mean squared error between `pred` and `target`, as a one-element tensor
///
/// # Panics
///
/// Panics if the shapes of `pred` and `target` cannot be broadcast together.
pub fn mse_loss(pred: &Tensor, target: &Tensor) -> Tensor {
    let diff = pred.data() - target.data();
    let n = diff.len().max(1) as f32;
    let loss = diff.mapv(|d| d * d).sum() / n;
    let requires_grad = tracks(&[pred, target]);

    let mut result = Tensor::new(ArrayD::from_elem(IxDyn(&[1]), loss), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(MseBackward {
            pred: pred.clone(),
            target: target.clone(),
            diff,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct MseBackward {
    pred: Tensor,
    target: Tensor,
    diff: ArrayD<f32>,
    result_grad: GradCell,
}

impl BackwardOp for MseBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let upstream = grad.iter().next().copied().unwrap_or(0.0);
            let n = self.diff.len().max(1) as f32;
            // ∂L/∂pred = 2 (pred - target) / n
            let grad_pred = &self.diff * (2.0 * upstream / n);

            if self.target.requires_grad() {
                self.target.accumulate_grad(-&grad_pred);
            }
            if self.pred.requires_grad() {
                self.pred.accumulate_grad(grad_pred);
            }

            recurse(&[&self.pred, &self.target]);
        }
    }
}

//! Tests for autograd operations with gradient checking

use super::*;
use approx::assert_abs_diff_eq;
use ndarray::{ArrayD, IxDyn};
use proptest::prelude::*;

/// Finite difference gradient checker
///
/// Computes numerical gradient using central difference:
/// f'(x) ≈ (f(x + h) - f(x - h)) / (2h)
fn finite_difference<F>(f: F, x: &[f32], epsilon: f32) -> Vec<f32>
where
    F: Fn(&[f32]) -> f32,
{
    let mut grad = vec![0.0; x.len()];
    let mut x_plus = x.to_vec();
    let mut x_minus = x.to_vec();

    for i in 0..x.len() {
        x_plus[i] = x[i] + epsilon;
        x_minus[i] = x[i] - epsilon;

        grad[i] = (f(&x_plus) - f(&x_minus)) / (2.0 * epsilon);

        x_plus[i] = x[i];
        x_minus[i] = x[i];
    }

    grad
}

fn ones(n: usize) -> ArrayD<f32> {
    ArrayD::ones(IxDyn(&[n]))
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_tensor_creation() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
        assert_eq!(t.len(), 3);
        assert_eq!(t.shape(), &[3]);
        assert!(t.requires_grad());
        assert!(t.grad().is_none());
    }

    #[test]
    fn test_tensor_from_shape_vec() {
        let t = Tensor::from_shape_vec(&[1, 2, 3], vec![0.0; 6], true).unwrap();
        assert_eq!(t.ndim(), 3);
        assert_eq!(t.shape(), &[1, 2, 3]);
    }

    #[test]
    fn test_tensor_from_shape_vec_mismatch() {
        let err = Tensor::from_shape_vec(&[2, 2, 2], vec![0.0; 5], false).unwrap_err();
        assert!(matches!(err, crate::Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_tensor_grad_accumulation() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);

        t.accumulate_grad(ones(3));
        assert_eq!(t.grad().unwrap()[[0]], 1.0);

        t.accumulate_grad(ones(3));
        assert_eq!(t.grad().unwrap()[[0]], 2.0);
    }

    #[test]
    fn test_add_backward() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
        let b = Tensor::from_vec(vec![4.0, 5.0, 6.0], true);
        let mut c = add(&a, &b);

        assert_abs_diff_eq!(c.data()[[1]], 7.0);

        backward(&mut c, Some(ones(3)));

        assert_abs_diff_eq!(a.grad().unwrap()[[0]], 1.0);
        assert_abs_diff_eq!(b.grad().unwrap()[[0]], 1.0);
    }

    #[test]
    fn test_sub_backward() {
        let a = Tensor::from_vec(vec![5.0, 5.0], true);
        let b = Tensor::from_vec(vec![2.0, 1.0], true);
        let mut c = sub(&a, &b);

        assert_abs_diff_eq!(c.data()[[0]], 3.0);
        assert_abs_diff_eq!(c.data()[[1]], 4.0);

        backward(&mut c, Some(ones(2)));

        assert_abs_diff_eq!(a.grad().unwrap()[[0]], 1.0);
        assert_abs_diff_eq!(b.grad().unwrap()[[0]], -1.0);
    }

    #[test]
    fn test_mul_backward() {
        let a = Tensor::from_vec(vec![2.0, 3.0], true);
        let b = Tensor::from_vec(vec![5.0, 7.0], true);
        let mut c = mul(&a, &b);

        backward(&mut c, Some(ones(2)));

        let grad_a = a.grad().unwrap();
        let grad_b = b.grad().unwrap();

        // ∂(a*b)/∂a = b
        assert_abs_diff_eq!(grad_a[[0]], 5.0);
        assert_abs_diff_eq!(grad_a[[1]], 7.0);

        // ∂(a*b)/∂b = a
        assert_abs_diff_eq!(grad_b[[0]], 2.0);
        assert_abs_diff_eq!(grad_b[[1]], 3.0);
    }

    #[test]
    fn test_scale_and_sum_backward() {
        let a = Tensor::from_shape_vec(&[1, 1, 3], vec![1.0, 2.0, 3.0], true).unwrap();
        let mut s = sum(&scale(&a, 3.0));

        assert_abs_diff_eq!(s.data()[[0]], 18.0);

        backward(&mut s, None);

        let grad = a.grad().unwrap();
        assert_eq!(grad.shape(), &[1, 1, 3]);
        for &g in grad.iter() {
            assert_abs_diff_eq!(g, 3.0);
        }
    }

    #[test]
    fn test_mse_loss_backward() {
        let pred = Tensor::from_vec(vec![1.0, 3.0], true);
        let target = Tensor::from_vec(vec![0.0, 0.0], false);
        let mut loss = mse_loss(&pred, &target);

        // (1 + 9) / 2
        assert_abs_diff_eq!(loss.data()[[0]], 5.0);

        backward(&mut loss, None);

        let grad = pred.grad().unwrap();
        assert_abs_diff_eq!(grad[[0]], 1.0);
        assert_abs_diff_eq!(grad[[1]], 3.0);
        assert!(target.grad().is_none());
    }

    #[test]
    fn test_no_grad_skips_graph() {
        let a = Tensor::from_vec(vec![1.0, 2.0], true);

        let c = {
            let _guard = no_grad();
            mul(&a, &a)
        };

        assert!(!c.requires_grad());
        assert!(c.backward_op().is_none());
        assert!(is_grad_enabled());
    }

    #[test]
    fn test_enable_grad_inside_no_grad() {
        let a = Tensor::from_vec(vec![1.0], true);
        let _outer = no_grad();
        {
            let _inner = enable_grad();
            assert!(add(&a, &a).requires_grad());
        }
        assert!(!is_grad_enabled());
        assert!(!add(&a, &a).requires_grad());
    }

    #[test]
    fn test_context_without_grad() {
        let ctx = Context::new();
        let recorded = ctx.without_grad(is_grad_enabled);
        assert!(!recorded);
        assert!(is_grad_enabled());
        assert!(ctx.is_training());
    }

    #[test]
    #[should_panic]
    fn test_add_incompatible_shapes_panics() {
        let a = Tensor::ones(&[1, 1, 3], true);
        let b = Tensor::ones(&[1, 1, 2], true);
        let _ = add(&a, &b);
    }

    #[test]
    #[should_panic]
    fn test_mse_loss_incompatible_shapes_panics() {
        let pred = Tensor::ones(&[2, 1, 3], true);
        let target = Tensor::ones(&[3, 1, 3], false);
        let _ = mse_loss(&pred, &target);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_mul_backward_gradient_check(
        xy in prop::collection::vec((-5.0f32..5.0, -5.0f32..5.0), 2..20)
    ) {
        let (x, y): (Vec<f32>, Vec<f32>) = xy.into_iter().unzip();

        let a = Tensor::from_vec(x.clone(), true);
        let b = Tensor::from_vec(y.clone(), true);
        let mut c = sum(&mul(&a, &b));

        backward(&mut c, None);

        let analytical_a = a.grad().unwrap();

        let numerical_a = finite_difference(
            |x_val| {
                let t_a = Tensor::from_vec(x_val.to_vec(), false);
                let t_b = Tensor::from_vec(y.clone(), false);
                mul(&t_a, &t_b).data().sum()
            },
            &x,
            1e-2,
        );

        for i in 0..x.len() {
            let diff = (analytical_a[[i]] - numerical_a[i]).abs();
            prop_assert!(diff < 0.1, "Gradient mismatch at index {}: analytical={}, numerical={}",
                        i, analytical_a[[i]], numerical_a[i]);
        }
    }

    #[test]
    fn prop_mse_backward_gradient_check(
        xy in prop::collection::vec((-5.0f32..5.0, -5.0f32..5.0), 1..16)
    ) {
        let (x, y): (Vec<f32>, Vec<f32>) = xy.into_iter().unzip();

        let pred = Tensor::from_vec(x.clone(), true);
        let target = Tensor::from_vec(y.clone(), false);
        let mut loss = mse_loss(&pred, &target);

        backward(&mut loss, None);

        let analytical = pred.grad().unwrap();

        let numerical = finite_difference(
            |x_val| {
                let p = Tensor::from_vec(x_val.to_vec(), false);
                let t = Tensor::from_vec(y.clone(), false);
                mse_loss(&p, &t).data()[[0]]
            },
            &x,
            1e-2,
        );

        for i in 0..x.len() {
            let diff = (analytical[[i]] - numerical[i]).abs();
            prop_assert!(diff < 0.1, "MSE gradient mismatch at index {}: analytical={}, numerical={}",
                        i, analytical[[i]], numerical[i]);
        }
    }
}

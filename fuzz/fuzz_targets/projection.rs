#![no_main]

use arbitrary::Arbitrary;
use esfera::optim::{Optimizer, SphericalOptimizer, SGD};
use esfera::Tensor;
use libfuzzer_sys::fuzz_target;
use ndarray::{ArrayD, IxDyn};

/// Fuzz target for spherical projection
///
/// Construction and stepping must never panic, whatever shapes and values come in.
/// Rank errors are fine; panics are not.

#[derive(Arbitrary, Debug)]
struct ProjectionFuzzInput {
    dims: Vec<u8>,      // Shape, each axis 1..=8
    values: Vec<u8>,    // Raw bytes for parameter values
    grads: Vec<u8>,     // Raw bytes for gradients
    lr: u8,             // Learning rate selector
    step_shape: bool,   // Step with a mismatched shape
}

fn bytes_to_f32(bytes: &[u8], size: usize) -> Vec<f32> {
    // Map 0..255 to -10.0..10.0 range, repeat to fill
    (0..size)
        .map(|i| {
            let b = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(0);
            ((b as f32) / 255.0) * 20.0 - 10.0
        })
        .collect()
}

fuzz_target!(|input: ProjectionFuzzInput| {
    let shape: Vec<usize> = input.dims.iter().take(5).map(|&d| (d as usize % 8) + 1).collect();
    let size: usize = shape.iter().product();

    let Ok(param) = Tensor::from_shape_vec(&shape, bytes_to_f32(&input.values, size), true) else {
        return;
    };
    let mut params = vec![param];
    let lr = input.lr as f32 / 64.0;

    let Ok(mut opt) = SphericalOptimizer::new(
        |p: &[Tensor], lr: f32| Ok(SGD::for_params(p, lr, 0.0)),
        &params,
        lr,
    ) else {
        // Rank below three is rejected at construction
        assert!(shape.len() < 3);
        return;
    };

    if input.step_shape {
        let mut wrong = shape.clone();
        wrong[0] += 1;
        let mut other = vec![Tensor::ones(&wrong, true)];
        assert!(opt.step(&mut other, None).is_err());
    }

    if let Ok(grad) = ArrayD::from_shape_vec(IxDyn(&shape), bytes_to_f32(&input.grads, size)) {
        params[0].set_grad(grad);
    }
    assert!(opt.step(&mut params, None).is_ok());

    // Invariant: finite inputs stay finite
    assert!(params[0].data().iter().all(|x| x.is_finite()));
});

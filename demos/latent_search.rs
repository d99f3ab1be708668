//! Example: Latent Search on a Sphere
//!
//! Searches for a latent code whose "generator" output matches a target, while the
//! code itself stays on the hypersphere it was sampled on. The generator here is a
//! fixed element-wise scaling so the whole search runs through the autograd engine.
//!
//! 1. Plain spherical Adam with a cosine learning rate schedule
//! 2. The same search loaded from YAML, with a clamp post-process

use esfera::autograd::{backward, mse_loss, mul};
use esfera::config::{build_scheduler, build_spherical, parse_config};
use esfera::optim::{
    trailing_norm, Adam, CosineAnnealingLR, LRScheduler, Optimizer, SphericalOptimizer,
};
use esfera::{Result, Tensor};

const SHAPE: [usize; 3] = [2, 4, 8];
const STEPS: usize = 200;

fn main() -> Result<()> {
    println!("=== Spherical Latent Search ===\n");

    println!("1. SPHERICAL ADAM + COSINE SCHEDULE\n");
    spherical_adam_example()?;

    println!("\n2. YAML CONFIGURED SEARCH WITH CLAMP\n");
    configured_example()?;

    println!("\n=== Examples Complete ===\n");
    Ok(())
}

fn sample(seed: f32) -> Result<Tensor> {
    let n: usize = SHAPE.iter().product();
    let values = (0..n).map(|i| ((i as f32 + seed) * 0.73).sin()).collect();
    Tensor::from_shape_vec(&SHAPE, values, true)
}

fn problem() -> Result<(Tensor, Tensor)> {
    let n: usize = SHAPE.iter().product();
    let gain = Tensor::from_shape_vec(
        &SHAPE,
        (0..n).map(|i| 1.0 + (i % 3) as f32).collect(),
        false,
    )?;
    let target = Tensor::from_shape_vec(
        &SHAPE,
        (0..n).map(|i| ((i as f32) * 0.41).cos()).collect(),
        false,
    )?;
    Ok((gain, target))
}

fn report(label: &str, params: &[Tensor]) -> Result<()> {
    let norms = trailing_norm(params[0].data())?;
    let norms: Vec<String> = norms.iter().map(|n| format!("{:.4}", n)).collect();
    println!("  {} norms: [{}]", label, norms.join(", "));
    Ok(())
}

fn spherical_adam_example() -> Result<()> {
    let (gain, target) = problem()?;
    let mut params = vec![sample(0.0)?];
    report("initial", &params)?;

    let mut optimizer = SphericalOptimizer::new(
        |p: &[Tensor], lr: f32| Ok(Adam::for_params(p, lr)),
        &params,
        0.05,
    )?;
    let mut scheduler = CosineAnnealingLR::new(0.05, STEPS, 0.001);

    let mut closure = |params: &mut [Tensor]| -> Result<f32> {
        params[0].zero_grad();
        let output = mul(&params[0], &gain);
        let mut loss = mse_loss(&output, &target);
        backward(&mut loss, None);
        Ok(loss.data()[[0]])
    };

    for step in 0..STEPS {
        scheduler.apply(&mut optimizer);
        let loss = optimizer.step(&mut params, Some(&mut closure))?;
        scheduler.step();

        if step % 50 == 0 {
            println!(
                "  step {:>3}  lr {:.4}  loss {:.5}",
                step,
                optimizer.lr(),
                loss.unwrap_or(f32::NAN)
            );
        }
    }

    report("final", &params)?;
    Ok(())
}

fn configured_example() -> Result<()> {
    let yaml = r#"
optimizer:
  name: adam
  lr: 0.05
  beta1: 0.9
  beta2: 0.999

postprocess:
  kind: clamp
  min: -0.5
  max: 0.5

scheduler:
  name: cosine
  t_max: 200
  lr_min: 0.001
"#;

    let spec = parse_config(yaml)?;
    println!("Configuration:");
    println!("  Optimizer: {} (lr {})", spec.optimizer.name, spec.optimizer.lr);
    println!("  Post-process: {:?}", spec.postprocess);

    let (gain, target) = problem()?;
    let mut params = vec![sample(3.0)?];
    report("initial", &params)?;

    let mut optimizer = build_spherical(&spec, &params)?;
    let mut scheduler = match &spec.scheduler {
        Some(schedule) => Some(build_scheduler(&spec.optimizer, schedule)?),
        None => None,
    };

    let mut closure = |params: &mut [Tensor]| -> Result<f32> {
        params[0].zero_grad();
        let output = mul(&params[0], &gain);
        let mut loss = mse_loss(&output, &target);
        backward(&mut loss, None);
        Ok(loss.data()[[0]])
    };

    let mut last = None;
    for _ in 0..STEPS {
        if let Some(scheduler) = &scheduler {
            scheduler.apply(&mut optimizer);
        }
        last = optimizer.step(&mut params, Some(&mut closure))?;
        if let Some(scheduler) = scheduler.as_mut() {
            scheduler.step();
        }
    }

    println!("  final loss {:.5}", last.unwrap_or(f32::NAN));
    report("final", &params)?;
    Ok(())
}

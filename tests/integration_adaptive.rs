//! Adaptive stop (§8 scenario 5): every pixel's sample count must land
//! inside `[min_samples, max_samples]`, and the render must finish with
//! every pixel reporting convergence.

mod common;

use pearray::config::{IntegratorKind, RenderSettings};
use pearray::integrator::DirectIntegrator;
use pearray::render::RenderContext;

#[test]
fn adaptive_stop_bounds_every_pixel_sample_count() {
    const SIZE: u32 = 8;
    let scene = common::uniform_environment_scene(SIZE, SIZE);

    let mut settings = RenderSettings::default().with_integrator(IntegratorKind::Direct);
    settings.adaptive.enabled = true;
    settings.adaptive.target_quality = 0.01;
    settings.adaptive.min_samples = 8;
    settings.adaptive.max_samples = 64;

    let mut ctx = RenderContext::new(scene, settings.clone(), Box::new(DirectIntegrator::new()), SIZE, SIZE).unwrap();
    ctx.run().unwrap();

    let output = ctx.output();
    for y in 0..SIZE {
        for x in 0..SIZE {
            let n = output.sample_count((x, y));
            assert!(
                n >= u64::from(settings.adaptive.min_samples) && n <= u64::from(settings.adaptive.max_samples),
                "pixel ({x},{y}) took {n} samples, outside [{}, {}]",
                settings.adaptive.min_samples,
                settings.adaptive.max_samples
            );
            assert!(output.is_pixel_finished((x, y)));
        }
    }

    assert_eq!(output.finished_pixel_count(), u64::from(SIZE) * u64::from(SIZE));
}

//! Furnace test (§8 scenario 1): a diffuse white sphere inside a
//! constant-radiance environment should converge to the environment's own
//! radiance everywhere, on the sphere and off it alike.

mod common;

use pearray::config::{IntegratorKind, RenderSettings};
use pearray::integrator::DirectIntegrator;
use pearray::render::RenderContext;

#[test]
fn furnace_sphere_and_background_converge_to_environment_radiance() {
    const SIZE: u32 = 16;
    let scene = common::furnace_scene(SIZE, SIZE);

    let mut settings = RenderSettings::default()
        .with_integrator(IntegratorKind::Direct)
        .with_seed(7);
    settings.samples_per_pixel = 128;
    settings.direct.light_samples = 2;

    let mut ctx = RenderContext::new(scene, settings, Box::new(DirectIntegrator::new()), SIZE, SIZE).unwrap();
    ctx.run().unwrap();

    let output = ctx.output();
    for y in 0..SIZE {
        for x in 0..SIZE {
            let spectral = output.spectral((x, y));
            for channel in spectral.as_array() {
                assert!(
                    (channel - 1.0).abs() < 0.15,
                    "pixel ({x},{y}) channel {channel} deviates from furnace equilibrium"
                );
            }
            assert!(output.feedback((x, y)).is_empty(), "pixel ({x},{y}) reported a numerical fault");
        }
    }
}

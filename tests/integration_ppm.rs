//! Specular-focus gather (§8 scenario 3): a diffuse floor sitting behind a
//! mirror sphere is only reachable, for most camera directions, through a
//! specular bounce the photon map has to pick up — next-event estimation
//! alone cannot see the light through an opaque mirror.

mod common;

use pearray::config::{IntegratorKind, RenderSettings};
use pearray::integrator::PpmIntegrator;
use pearray::render::RenderContext;

#[test]
fn ppm_lights_a_floor_hidden_behind_a_mirror_via_the_photon_map() {
    const SIZE: u32 = 12;
    let scene = common::specular_focus_scene(SIZE, SIZE);

    let mut settings = RenderSettings::default().with_integrator(IntegratorKind::Ppm).with_seed(11);
    settings.ppm.pass_count = 4;
    settings.ppm.photons_per_pass = 20_000;
    settings.ppm.initial_radius_sqr = 0.05;

    let mut ctx = RenderContext::new(scene, settings, Box::new(PpmIntegrator::new()), SIZE, SIZE).unwrap();
    ctx.run().unwrap();

    let output = ctx.output();
    let mut total = 0.0f32;
    let mut lit_pixels = 0u32;
    for y in 0..SIZE {
        for x in 0..SIZE {
            assert!(output.feedback((x, y)).is_empty(), "pixel ({x},{y}) reported a numerical fault");
            let spectral = output.spectral((x, y));
            for channel in spectral.as_array() {
                assert!(channel.is_finite() && channel >= 0.0, "pixel ({x},{y}) produced a non-physical radiance {channel}");
            }
            let avg = spectral.average();
            total += avg;
            if avg > 1e-4 {
                lit_pixels += 1;
            }
        }
    }

    assert!(lit_pixels > 0, "no pixel received any indirect radiance through the mirror bounce");
    assert!(total > 0.0, "image came back entirely black");
}

//! Bidirectional vs. direct agreement (§8 scenario 4): on a scene with no
//! specular surfaces, the bidirectional integrator's light-subpath
//! connections and direct lighting's next-event estimation are both
//! unbiased estimators of the same one-bounce quantity, so their converged
//! images should agree within sampling noise.

mod common;

use pearray::config::{IntegratorKind, RenderSettings};
use pearray::integrator::{BidirectionalIntegrator, DirectIntegrator};
use pearray::render::RenderContext;

#[test]
fn bidirectional_agrees_with_direct_on_a_diffuse_only_scene() {
    const SIZE: u32 = 12;

    let direct_scene = common::furnace_scene(SIZE, SIZE);
    let mut direct_settings = RenderSettings::default().with_integrator(IntegratorKind::Direct).with_seed(3);
    direct_settings.samples_per_pixel = 96;
    direct_settings.direct.light_samples = 2;
    let mut direct_ctx =
        RenderContext::new(direct_scene, direct_settings, Box::new(DirectIntegrator::new()), SIZE, SIZE).unwrap();
    direct_ctx.run().unwrap();
    let direct_output = direct_ctx.output();

    let bidir_scene = common::furnace_scene(SIZE, SIZE);
    let mut bidir_settings = RenderSettings::default().with_integrator(IntegratorKind::Bidirectional).with_seed(3);
    bidir_settings.samples_per_pixel = 96;
    bidir_settings.bidirectional.max_light_depth = 1;
    bidir_settings.bidirectional.max_camera_depth = 1;
    let mut bidir_ctx =
        RenderContext::new(bidir_scene, bidir_settings, Box::new(BidirectionalIntegrator::new()), SIZE, SIZE).unwrap();
    bidir_ctx.run().unwrap();
    let bidir_output = bidir_ctx.output();

    for y in 0..SIZE {
        for x in 0..SIZE {
            let direct_avg = direct_output.spectral((x, y)).average();
            let bidir_avg = bidir_output.spectral((x, y)).average();
            assert!(
                (direct_avg - bidir_avg).abs() < 0.2,
                "pixel ({x},{y}) disagreed: direct={direct_avg}, bidirectional={bidir_avg}"
            );
        }
    }
}

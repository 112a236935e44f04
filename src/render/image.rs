//! Output image writing (§6 "Output files"), grounded on the spec's
//! explicit scope line: "Output image writing is stubbed behind an
//! `ImageWriter` trait with an EXR-shaped in-memory implementation for
//! tests; a real OpenImageIO binding is out of scope."
//!
//! [`ImageWriter`] only knows about named, fixed-arity float channels —
//! the same shape an EXR file stores (§6 "Channels are tagged"). This
//! crate implements one writer, [`InMemoryImage`], sufficient for tests and
//! for an embedder that wants to hand the pixels to its own encoder;
//! wiring a real OpenImageIO/`exr` crate binding is the CLI binary's
//! business, not the engine's (§1).

use crate::render::output::OutputFramebuffer;
use crate::error::Result;
use slotmap::Key;

/// One named channel's float data, row-major, `width * height * arity`
/// values (§6 "parametric-coefficient outputs carry ... channel names
/// `coeff.A`, `coeff.B`, `coeff.C`"; arity is 1 for scalar AOVs, 3 for
/// vector ones, 4 for the raw spectral quartet).
#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    pub arity: u8,
    pub data: Vec<f32>,
}

/// Receives one fully-assembled image (§6 "Output files"). Implementations
/// decide how/where to persist it; the engine only calls [`Self::write`]
/// once, after a render finishes or is cancelled.
pub trait ImageWriter {
    fn write(&mut self, width: u32, height: u32, channels: Vec<Channel>) -> Result<()>;
}

/// Collects every channel in memory instead of touching the filesystem —
/// the "EXR-shaped in-memory implementation for tests" the spec calls for.
#[derive(Debug, Default)]
pub struct InMemoryImage {
    pub width: u32,
    pub height: u32,
    pub channels: Vec<Channel>,
}

impl ImageWriter for InMemoryImage {
    fn write(&mut self, width: u32, height: u32, channels: Vec<Channel>) -> Result<()> {
        self.width = width;
        self.height = height;
        self.channels = channels;
        Ok(())
    }
}

impl InMemoryImage {
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }
}

/// Assembles the mandatory spectral/sample-count/quality channels plus
/// whatever feedback bits are set, reading every pixel of `output`
/// (§4.7 "One mandatory spectral channel ... mandatory auxiliary channels
/// include sample-count ... and variance/quality"). The raw hero-wavelength
/// quartet is exposed as four channels named `spectral.0`..`spectral.3`
/// rather than converted to display RGB, since that conversion needs the
/// CIE standard observer integral this crate's spectral core does not
/// implement (§1, out of scope: image I/O).
pub fn collect_channels(output: &OutputFramebuffer) -> Vec<Channel> {
    let w = output.width();
    let h = output.height();
    let n = (w * h) as usize;

    let mut spectral = vec![vec![0.0f32; n]; 4];
    let mut sample_count = vec![0.0f32; n];
    let mut quality = vec![0.0f32; n];
    let mut feedback = vec![0.0f32; n];
    let mut position = vec![0.0f32; n * 3];
    let mut normal = vec![0.0f32; n * 3];
    let mut normal_g = vec![0.0f32; n * 3];
    let mut tangent = vec![0.0f32; n * 3];
    let mut bitangent = vec![0.0f32; n * 3];
    let mut view = vec![0.0f32; n * 3];
    let mut uvw = vec![0.0f32; n * 3];
    let mut time = vec![0.0f32; n];
    let mut depth = vec![0.0f32; n];
    // -1 means "no hit ever landed here"; a real id encodes as its
    // slotmap `KeyData` ffi form, which is never zero.
    let mut material_id = vec![-1.0f32; n];
    let mut entity_id = vec![-1.0f32; n];

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            let s = output.spectral((x, y)).as_array();
            for (k, slot) in spectral.iter_mut().enumerate() {
                slot[idx] = s[k];
            }
            sample_count[idx] = output.sample_count((x, y)) as f32;
            quality[idx] = output.quality((x, y));
            feedback[idx] = f32::from(output.feedback((x, y)).bits());

            let write_vec3 = |buf: &mut [f32], v: glam::Vec3| {
                buf[idx * 3] = v.x;
                buf[idx * 3 + 1] = v.y;
                buf[idx * 3 + 2] = v.z;
            };
            write_vec3(&mut position, output.position((x, y)));
            write_vec3(&mut normal, output.normal((x, y)));
            write_vec3(&mut normal_g, output.normal_g((x, y)));
            write_vec3(&mut tangent, output.tangent((x, y)));
            write_vec3(&mut bitangent, output.bitangent((x, y)));
            write_vec3(&mut view, output.view((x, y)));
            write_vec3(&mut uvw, output.uvw((x, y)));
            time[idx] = output.time((x, y));
            depth[idx] = output.depth((x, y));
            if let Some(id) = output.material_id((x, y)) {
                material_id[idx] = id.data().as_ffi() as f32;
            }
            if let Some(id) = output.entity_id((x, y)) {
                entity_id[idx] = id.data().as_ffi() as f32;
            }
        }
    }

    let mut channels: Vec<Channel> = spectral
        .into_iter()
        .enumerate()
        .map(|(i, data)| Channel { name: format!("spectral.{i}"), arity: 1, data })
        .collect();
    channels.push(Channel { name: "sample_count".into(), arity: 1, data: sample_count });
    channels.push(Channel { name: "quality".into(), arity: 1, data: quality });
    channels.push(Channel { name: "feedback".into(), arity: 1, data: feedback });
    channels.push(Channel { name: "position".into(), arity: 3, data: position });
    channels.push(Channel { name: "normal".into(), arity: 3, data: normal });
    channels.push(Channel { name: "normal_g".into(), arity: 3, data: normal_g });
    channels.push(Channel { name: "tangent".into(), arity: 3, data: tangent });
    channels.push(Channel { name: "bitangent".into(), arity: 3, data: bitangent });
    channels.push(Channel { name: "view".into(), arity: 3, data: view });
    channels.push(Channel { name: "uvw".into(), arity: 3, data: uvw });
    channels.push(Channel { name: "time".into(), arity: 1, data: time });
    channels.push(Channel { name: "depth".into(), arity: 1, data: depth });
    channels.push(Channel { name: "material_id".into(), arity: 1, data: material_id });
    channels.push(Channel { name: "entity_id".into(), arity: 1, data: entity_id });
    channels
}

/// Runs [`collect_channels`] and hands the result to `writer` in one call
/// — the shape `src/bin/pearray.rs` uses after [`crate::RenderContext::run`]
/// returns.
pub fn write_output(output: &OutputFramebuffer, writer: &mut dyn ImageWriter) -> Result<()> {
    let channels = collect_channels(output);
    writer.write(output.width(), output.height(), channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::{Derivative2, ShadingContext, ShadingFlags};
    use crate::spectral::SpectralBlob;
    use glam::Vec3;

    fn closure() -> ShadingContext {
        ShadingContext {
            p: Vec3::ZERO,
            dpdu: Vec3::X,
            dpdv: Vec3::Y,
            dpdx: Vec3::ZERO,
            dpdy: Vec3::ZERO,
            n: Vec3::Z,
            ng: Vec3::Z,
            nx: Vec3::X,
            ny: Vec3::Y,
            v: Vec3::Z,
            n_dot_v: 1.0,
            ng_dot_v: 1.0,
            uvw: Vec3::ZERO,
            duvw: Derivative2::default(),
            primitive_id: 0,
            entity_id: None,
            material_id: None,
            emission_id: None,
            flags: ShadingFlags::empty(),
            wavelengths: [550.0; 4],
            wavelength_index: 0,
            time: 0.0,
            depth: 0,
        }
    }

    #[test]
    fn collected_channels_cover_mandatory_aovs() {
        let fb = OutputFramebuffer::new(2, 2, 1, None);
        fb.push((0, 0), SpectralBlob::splat(0.5), &closure());

        let channels = collect_channels(&fb);
        let names: Vec<_> = channels.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"spectral.0"));
        assert!(names.contains(&"sample_count"));
        assert!(names.contains(&"quality"));
        assert!(names.contains(&"feedback"));
    }

    #[test]
    fn in_memory_image_round_trips_written_channels() {
        let fb = OutputFramebuffer::new(1, 1, 1, None);
        fb.push((0, 0), SpectralBlob::splat(1.0), &closure());

        let mut image = InMemoryImage::default();
        write_output(&fb, &mut image).unwrap();
        assert_eq!(image.width, 1);
        assert_eq!(image.height, 1);
        assert!((image.channel("spectral.0").unwrap().data[0] - 1.0).abs() < 1e-5);
    }
}

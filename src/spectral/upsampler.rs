//! Parametric spectral upsampling (§4.1, component A).
//!
//! Converts an (r, g, b) reflectance or illuminant into the three Jakob-Hanika
//! coefficients that let [`compute`] evaluate a smooth spectral curve at any
//! wavelength. The table format and the trilinear-lookup/binary-search
//! procedure mirror `PR::SpectralUpsampler` in the original implementation
//! bit for bit, since the spec leaves the exact rescaling and edge-case
//! behavior to "what the source does".

use crate::error::{PearRayError, Result};
use crate::spectral::blob::ParametricBlob;

const MAGIC: &[u8; 4] = b"SPEC";
const COEFFS_N: usize = 3;

/// A loaded `{resolution} x {resolution} x {resolution}` coefficient table,
/// one entry per (largest-channel, z, y, x) cell, three floats each.
pub struct SpectralUpsampler {
    resolution: u32,
    scale: Vec<f32>,
    data: Vec<f32>,
}

impl SpectralUpsampler {
    /// Parses the little-endian binary table described in §6: a 4-byte
    /// `"SPEC"` tag, a `u32` resolution, `resolution` scale floats, then
    /// `resolution^3 * 3 * 3` data floats.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 {
            return Err(PearRayError::UpsamplerTable("truncated header".into()));
        }
        if &bytes[0..4] != MAGIC {
            return Err(PearRayError::UpsamplerTable(
                "magic tag mismatch, expected 'SPEC'".into(),
            ));
        }
        let resolution = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let res = resolution as usize;
        let scale_len = res;
        let data_len = res * res * res * 3 * COEFFS_N;

        let scale_bytes_start = 8;
        let scale_bytes_end = scale_bytes_start + scale_len * 4;
        let data_bytes_end = scale_bytes_end + data_len * 4;
        if bytes.len() < data_bytes_end {
            return Err(PearRayError::UpsamplerTable(
                "file shorter than resolution implies".into(),
            ));
        }

        let scale = read_f32_le(&bytes[scale_bytes_start..scale_bytes_end]);
        let data = read_f32_le(&bytes[scale_bytes_end..data_bytes_end]);

        Ok(Self {
            resolution,
            scale,
            data,
        })
    }

    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Converts an (r, g, b) triple into parametric coefficients (§4.1
    /// `prepare`).
    ///
    /// Edge cases: an all-zero input returns `(0, 0, -50)`, which
    /// approximates a zero spectrum through [`compute`]; any remapped
    /// channel at or beyond 1.0 is clamped to the last cell.
    #[must_use]
    pub fn prepare(&self, r: f32, g: f32, b: f32) -> ParametricBlob {
        if r <= 0.0 && g <= 0.0 && b <= 0.0 {
            return ParametricBlob::new(0.0, 0.0, -50.0);
        }

        let arr = [r, g, b];
        let res = self.resolution - 1;
        let res_u = res as usize;
        let dx = COEFFS_N;
        let dy = COEFFS_N * res_u;
        let dz = COEFFS_N * res_u * res_u;

        let mut largest = 0usize;
        for j in 1..3 {
            if arr[largest] < arr[j] {
                largest = j;
            }
        }

        let z = arr[largest];
        let scale = (res as f32 - 1.0) / z;
        let x = arr[(largest + 1) % 3] * scale;
        let y = arr[(largest + 2) % 3] * scale;

        let xi = (x as u32).min(res.saturating_sub(2)) as usize;
        let yi = (y as u32).min(res.saturating_sub(2)) as usize;
        let zi = find_interval(&self.scale, res_u, z);

        let off = ((largest * res_u + zi) * res_u + yi) * res_u + xi;
        let off = off * COEFFS_N;

        let x1 = x - xi as f32;
        let x0 = 1.0 - x1;
        let y1 = y - yi as f32;
        let y0 = 1.0 - y1;
        let z1 = (z - self.scale[zi]) / (self.scale[zi + 1] - self.scale[zi]);
        let z0 = 1.0 - z1;

        let mut coeffs = [0.0f32; COEFFS_N];
        for (j, coeff) in coeffs.iter_mut().enumerate() {
            let idx = off + j;
            let lo_y = self.data[idx] * x0 + self.data[idx + dx] * x1;
            let hi_y = self.data[idx + dy] * x0 + self.data[idx + dx + dy] * x1;
            let lo_z = lo_y * y0 + hi_y * y1;

            let lo_y2 = self.data[idx + dz] * x0 + self.data[idx + dx + dz] * x1;
            let hi_y2 = self.data[idx + dy + dz] * x0 + self.data[idx + dx + dy + dz] * x1;
            let hi_z = lo_y2 * y0 + hi_y2 * y1;

            *coeff = lo_z * z0 + hi_z * z1;
        }

        ParametricBlob::new(coeffs[0], coeffs[1], coeffs[2])
    }
}

/// Binary search for the interval in `scale[0..size)` containing `x`,
/// matching `PR::find_interval`'s branchless interval search.
fn find_interval(values: &[f32], size: usize, x: f32) -> usize {
    let last_interval = size.saturating_sub(2);
    let mut left = 0usize;
    let mut size = last_interval;

    while size > 0 {
        let half = size >> 1;
        let middle = left + half + 1;
        if values[middle] < x {
            left = middle;
            size -= half + 1;
        } else {
            size = half;
        }
    }

    left.min(last_interval)
}

/// Evaluates the parametric curve at a batch of wavelengths (§4.1
/// `compute`): `0.5 + 0.5 * x / sqrt(1 + x^2)` with
/// `x = (a * lambda + b) * lambda + c`.
#[must_use]
pub fn compute(coeffs: ParametricBlob, wavelengths: &[f32]) -> Vec<f32> {
    wavelengths
        .iter()
        .map(|&lambda| compute_single(coeffs, lambda))
        .collect()
}

/// Single-wavelength form of [`compute`].
#[must_use]
pub fn compute_single(coeffs: ParametricBlob, wavelength: f32) -> f32 {
    let x = (coeffs.a * wavelength + coeffs.b) * wavelength + coeffs.c;
    let y = 1.0 / (x * x + 1.0).sqrt();
    0.5 * x * y + 0.5
}

fn read_f32_le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_table(resolution: u32) -> Vec<u8> {
        // Builds a trivial linear table so compute/prepare round-trips are
        // checkable without shipping a real CIE-fit binary in the test tree.
        let res = resolution as usize;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&resolution.to_le_bytes());
        for i in 0..res {
            bytes.extend_from_slice(&(i as f32 / (res - 1) as f32).to_le_bytes());
        }
        for _ in 0..(res * res * res * 3 * COEFFS_N) {
            bytes.extend_from_slice(&0.0f32.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = synthetic_table(8);
        bytes[0] = b'X';
        assert!(SpectralUpsampler::load(&bytes).is_err());
    }

    #[test]
    fn zero_input_is_the_documented_fallback() {
        let table = SpectralUpsampler::load(&synthetic_table(8)).unwrap();
        let coeffs = table.prepare(0.0, 0.0, 0.0);
        assert_eq!(coeffs, ParametricBlob::new(0.0, 0.0, -50.0));
    }

    #[test]
    fn compute_is_bounded_in_zero_one() {
        let coeffs = ParametricBlob::new(0.001, -0.2, 0.5);
        for lambda in [380.0, 500.0, 620.0, 730.0] {
            let v = compute_single(coeffs, lambda);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn all_zero_coeffs_evaluate_to_half() {
        let coeffs = ParametricBlob::new(0.0, 0.0, 0.0);
        assert!((compute_single(coeffs, 550.0) - 0.5).abs() < 1e-6);
    }
}

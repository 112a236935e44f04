//! Multiple importance sampling weighting (§4.3, component D).
//!
//! Both heuristics operate on a running `(weight, pdf)` accumulator so that
//! strategies can be folded in one at a time without revisiting earlier
//! ones — mirroring `PR::MSI::power`/`PR::MSI::balance` in the original
//! implementation, which update `out_pdf` in place as each strategy's
//! sample is folded in.

use crate::spectral::SpectralBlob;

/// Running MIS accumulator: the combined weight estimate so far and the
/// summed (squared, for the power heuristic) pdf mass folded in so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct MisAccumulator {
    pub weight: SpectralBlob,
    pub pdf: f32,
}

impl MisAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds in one more strategy's `(contribution, pdf)` pair using the
    /// power heuristic with exponent `beta` (default 2). If `pdf` is
    /// infinite the strategy is a Dirac (specular) lobe: its weight becomes
    /// 1 and every previously accumulated strategy is zeroed out, matching
    /// "the other strategies contribute 0" in §4.3.
    pub fn accumulate_power(&mut self, contribution: SpectralBlob, pdf: f32, beta: f32) {
        if pdf.is_infinite() {
            self.weight = contribution;
            self.pdf = f32::INFINITY;
            return;
        }
        if self.pdf.is_infinite() {
            return;
        }
        let w = power_weight(self.pdf, pdf, beta);
        self.weight = self.weight.lerp(contribution, w);
        self.pdf += pdf;
    }

    /// Folds in one more strategy's `(contribution, pdf)` pair using the
    /// balance heuristic.
    pub fn accumulate_balance(&mut self, contribution: SpectralBlob, pdf: f32) {
        if pdf.is_infinite() {
            self.weight = contribution;
            self.pdf = f32::INFINITY;
            return;
        }
        if self.pdf.is_infinite() {
            return;
        }
        let w = balance_weight(self.pdf, pdf);
        self.weight = self.weight.lerp(contribution, w);
        self.pdf += pdf;
    }
}

/// Power heuristic weight for folding an incoming strategy of pdf `in_pdf`
/// against an accumulated outgoing pdf mass `out_pdf`, exponent `beta`
/// (`beta = 2` is the conventional default).
#[must_use]
pub fn power_weight(out_pdf: f32, in_pdf: f32, beta: f32) -> f32 {
    debug_assert!(out_pdf >= 0.0 && in_pdf >= 0.0);
    if out_pdf < in_pdf {
        let r = out_pdf / in_pdf;
        1.0 / (1.0 + r.powf(beta))
    } else if in_pdf < out_pdf {
        let r = in_pdf / out_pdf;
        1.0 - 1.0 / (1.0 + r.powf(beta))
    } else {
        0.5
    }
}

/// Balance heuristic weight, `beta = 1` special case of the power
/// heuristic but computed directly to avoid a `powf` call.
#[must_use]
pub fn balance_weight(out_pdf: f32, in_pdf: f32) -> f32 {
    debug_assert!(out_pdf >= 0.0 && in_pdf >= 0.0);
    if out_pdf < in_pdf {
        1.0 / (1.0 + out_pdf / in_pdf)
    } else if in_pdf < out_pdf {
        1.0 - 1.0 / (1.0 + in_pdf / out_pdf)
    } else {
        0.5
    }
}

/// Converts an area-measure pdf to solid-angle measure.
#[must_use]
pub fn to_solid_angle(pdf_area: f32, dist_sqr: f32, abs_cosine: f32) -> f32 {
    debug_assert!(abs_cosine >= 0.0);
    pdf_area * abs_cosine / dist_sqr
}

/// Converts a solid-angle-measure pdf to area measure.
#[must_use]
pub fn to_area(pdf_solid_angle: f32, dist_sqr: f32, abs_cosine: f32) -> f32 {
    debug_assert!(abs_cosine >= 0.0);
    pdf_solid_angle * dist_sqr / abs_cosine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_pdfs_split_evenly() {
        assert!((power_weight(1.0, 1.0, 2.0) - 0.5).abs() < 1e-6);
        assert!((balance_weight(1.0, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn specular_strategy_dominates_accumulator() {
        let mut acc = MisAccumulator::new();
        acc.accumulate_power(SpectralBlob::splat(0.2), 3.0, 2.0);
        acc.accumulate_power(SpectralBlob::splat(0.9), f32::INFINITY, 2.0);
        assert_eq!(acc.weight, SpectralBlob::splat(0.9));
        assert!(acc.pdf.is_infinite());
    }

    #[test]
    fn power_and_balance_agree_on_weight_direction() {
        // A strategy with a much larger pdf should dominate under both
        // heuristics, power more aggressively so.
        let power = power_weight(1.0, 9.0, 2.0);
        let balance = balance_weight(1.0, 9.0);
        assert!(power < balance);
    }

    #[test]
    fn solid_angle_area_round_trip() {
        let pdf_area = 2.0;
        let dist_sqr = 4.0;
        let cosine = 0.5;
        let sa = to_solid_angle(pdf_area, dist_sqr, cosine);
        let back = to_area(sa, dist_sqr, cosine);
        assert!((back - pdf_area).abs() < 1e-5);
    }
}

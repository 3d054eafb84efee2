// ============================================================================
// FALLOFF CURVES — per-family distance → intensity functions
// ============================================================================
//
// Distances are signed, in frame pixels: > 0 outside the shape, < 0 inside.
// Every curve returns a value in [0, 1] and maps non-finite distances (an
// unseeded field texel) to 0.
// ============================================================================

use super::composite::{EffectProgram, PassSample, PassShader};
use crate::params::{GlowParams, OutlineParams, Pass, PassParams, RangeParams};

/// Spans narrower than this collapse to a hard step.
const SPAN_EPSILON: f32 = 1e-6;

/// 1 at `min`, falling linearly to 0 at `max`; 0 outside `[min, max]`.
pub fn range_falloff(distance: f32, min: f32, max: f32) -> f32 {
    if !(distance >= min && distance <= max) {
        return 0.0;
    }
    let span = max - min;
    if span <= SPAN_EPSILON {
        return 1.0;
    }
    (1.0 - (distance - min) / span).clamp(0.0, 1.0)
}

/// 1 at the edge, decaying to 0 at `width`.  Higher sharpness keeps the
/// plateau flat for longer and steepens the final drop.
///
/// `distance` must be non-negative (the caller clamps the far side to 0).
pub fn glow_falloff(distance: f32, width: f32, sharpness_inverse: f32) -> f32 {
    if width <= 0.0 || !(distance < width) {
        return 0.0;
    }
    ((1.0 - distance / width) * sharpness_inverse).clamp(0.0, 1.0)
}

/// A `width`-wide band centred `offset` pixels from the edge.
pub fn outline_falloff(distance: f32, offset: f32, width: f32, sharpness_inverse: f32) -> f32 {
    glow_falloff((distance - offset).abs(), width * 0.5, sharpness_inverse)
}

fn with_alpha(color: [f32; 4], weight: f32) -> [f32; 4] {
    [color[0], color[1], color[2], color[3] * weight]
}

// ============================================================================
// DEFAULT SHADERS
// ============================================================================

/// Edge highlight and both shadows.
#[derive(Default)]
pub struct RangeShader;

impl RangeShader {
    fn weight(pass: Pass, p: &RangeParams, sample: &PassSample) -> f32 {
        let d = sample.distance;
        match pass {
            Pass::InnerShadow => range_falloff(-d, p.range_min, p.range_max) * sample.coverage(),
            Pass::OuterShadow => range_falloff(d, p.range_min, p.range_max) * (1.0 - sample.coverage()),
            _ => range_falloff(d, p.range_min, p.range_max),
        }
    }
}

impl PassShader for RangeShader {
    fn shade(&self, pass: Pass, params: &PassParams, sample: &PassSample) -> [f32; 4] {
        match params {
            PassParams::Range(p) => with_alpha(p.color, Self::weight(pass, p, sample)),
            _ => [0.0; 4],
        }
    }
}

/// Inner and outer glow.
#[derive(Default)]
pub struct GlowShader;

impl GlowShader {
    fn weight(pass: Pass, p: &GlowParams, sample: &PassSample) -> f32 {
        let d = sample.distance;
        match pass {
            Pass::InnerGlow => glow_falloff((-d).max(0.0), p.width, p.sharpness_inverse) * sample.coverage(),
            _ => glow_falloff(d.max(0.0), p.width, p.sharpness_inverse) * (1.0 - sample.coverage()),
        }
    }
}

impl PassShader for GlowShader {
    fn shade(&self, pass: Pass, params: &PassParams, sample: &PassSample) -> [f32; 4] {
        match params {
            PassParams::Glow(p) => with_alpha(p.color, Self::weight(pass, p, sample)),
            _ => [0.0; 4],
        }
    }
}

#[derive(Default)]
pub struct OutlineShader;

impl OutlineShader {
    fn weight(p: &OutlineParams, sample: &PassSample) -> f32 {
        outline_falloff(sample.distance, p.offset, p.width, p.sharpness_inverse)
    }
}

impl PassShader for OutlineShader {
    fn shade(&self, _pass: Pass, params: &PassParams, sample: &PassSample) -> [f32; 4] {
        match params {
            PassParams::Outline(p) => with_alpha(p.color, Self::weight(p, sample)),
            _ => [0.0; 4],
        }
    }
}

/// The built-in consumer program: every technique backed by the curves above.
#[derive(Default)]
pub struct FalloffProgram {
    range: RangeShader,
    glow: GlowShader,
    outline: OutlineShader,
}

impl FalloffProgram {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EffectProgram for FalloffProgram {
    fn technique(&self, pass: Pass) -> Option<&dyn PassShader> {
        Some(match pass {
            Pass::Taa | Pass::OuterShadow | Pass::InnerShadow => &self.range,
            Pass::OuterGlow | Pass::InnerGlow => &self.glow,
            Pass::Outline => &self.outline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::sharpness_pair;

    #[test]
    fn range_is_zero_outside_and_monotone_inside() {
        assert_eq!(range_falloff(-0.1, 0.0, 4.0), 0.0);
        assert_eq!(range_falloff(4.1, 0.0, 4.0), 0.0);
        assert_eq!(range_falloff(f32::INFINITY, 0.0, 4.0), 0.0);
        assert_eq!(range_falloff(f32::NAN, 0.0, 4.0), 0.0);
        let mut last = f32::INFINITY;
        for i in 0..=40 {
            let v = range_falloff(i as f32 * 0.1, 0.0, 4.0);
            assert!(v <= last);
            last = v;
        }
        assert_eq!(range_falloff(0.0, 0.0, 4.0), 1.0);
        assert_eq!(range_falloff(2.0, 2.0, 2.0), 1.0);
    }

    #[test]
    fn glow_peaks_at_edge_and_ends_at_width() {
        let (_, inv) = sharpness_pair(0.0);
        assert_eq!(glow_falloff(0.0, 4.0, inv), 1.0);
        assert_eq!(glow_falloff(4.0, 4.0, inv), 0.0);
        assert_eq!(glow_falloff(5.0, 4.0, inv), 0.0);
        assert_eq!(glow_falloff(f32::INFINITY, 4.0, inv), 0.0);
        assert_eq!(glow_falloff(1.0, 0.0, inv), 0.0);
    }

    #[test]
    fn glow_steepens_with_sharpness() {
        let d = 3.0;
        let mut last = 0.0;
        for percent in [0.0, 25.0, 50.0, 75.0, 99.0, 100.0] {
            let (_, inv) = sharpness_pair(percent);
            let v = glow_falloff(d, 4.0, inv);
            assert!(v >= last, "sharpness {}%: {} < {}", percent, v, last);
            assert!(v <= 1.0);
            last = v;
        }
    }

    #[test]
    fn outline_is_a_band_around_the_offset() {
        let (_, inv) = sharpness_pair(50.0);
        assert_eq!(outline_falloff(0.5, 0.0, 4.0, inv), 1.0);
        assert_eq!(outline_falloff(-0.5, 0.0, 4.0, inv), 1.0);
        assert!((outline_falloff(1.5, 0.0, 4.0, inv) - 0.5).abs() < 1e-5);
        assert_eq!(outline_falloff(2.5, 0.0, 4.0, inv), 0.0);
        assert_eq!(outline_falloff(3.0, 3.0, 4.0, inv), 1.0);
        assert_eq!(outline_falloff(0.0, 3.0, 4.0, inv), 0.0);
    }

    #[test]
    fn glows_are_masked_by_coverage() {
        let program = FalloffProgram::new();
        let params = PassParams::Glow(GlowParams {
            enabled: true,
            color: [1.0, 1.0, 1.0, 1.0],
            width: 4.0,
            sharpness: 0.0,
            sharpness_inverse: 1.0,
        });
        let inside = PassSample {
            distance: -1.0,
            source: [0.0, 0.0, 1.0, 1.0],
            threshold: 0.5,
        };
        let outside = PassSample {
            distance: 1.0,
            source: [0.0; 4],
            threshold: 0.5,
        };
        let outer = program.technique(Pass::OuterGlow).unwrap();
        let inner = program.technique(Pass::InnerGlow).unwrap();
        assert_eq!(outer.shade(Pass::OuterGlow, &params, &inside)[3], 0.0);
        assert_eq!(outer.shade(Pass::OuterGlow, &params, &outside)[3], 0.75);
        assert_eq!(inner.shade(Pass::InnerGlow, &params, &inside)[3], 0.75);
        assert_eq!(inner.shade(Pass::InnerGlow, &params, &outside)[3], 0.0);
    }
}

// ============================================================================
// EFFECT PARAMETER STORE — render-ready numbers derived from FilterSettings
// ============================================================================
//
// Rebuilt wholesale on construction, on reload and on every settings change;
// the compositing stack only ever reads the result.  Pure data: no GPU work,
// no logging, same input → same output.

use crate::settings::{FilterSettings, GlowSettings, OutlineSettings, RangeSettings};

/// Alphas below this are treated as "effect off".
pub const ALPHA_EPSILON: f64 = f64::EPSILON;

/// Largest stored sharpness; keeps `1 / (1 - sharpness)` finite.
pub const SHARPNESS_LIMIT: f32 = 1.0 - f32::EPSILON;

/// Smallest field scale the store hands out (0.1 %, the property-sheet minimum).
pub const MIN_FIELD_SCALE: f64 = 0.001;

/// The passes of the compositing stack, in draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    Taa,
    OuterShadow,
    InnerShadow,
    OuterGlow,
    InnerGlow,
    Outline,
}

impl Pass {
    pub const ORDER: [Pass; 6] = [
        Pass::Taa,
        Pass::OuterShadow,
        Pass::InnerShadow,
        Pass::OuterGlow,
        Pass::InnerGlow,
        Pass::Outline,
    ];

    /// Entry point name inside the consumer program.
    pub fn technique(self) -> &'static str {
        match self {
            Pass::Taa => "TAA",
            Pass::OuterShadow => "ShadowOuter",
            Pass::InnerShadow => "ShadowInner",
            Pass::OuterGlow => "GlowOuter",
            Pass::InnerGlow => "GlowInner",
            Pass::Outline => "Outline",
        }
    }
}

/// Range family: edge highlight and both shadows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeParams {
    pub enabled: bool,
    /// Straight RGBA; alpha comes from the percentage control.
    pub color: [f32; 4],
    pub range_min: f32,
    pub range_max: f32,
    /// Pixel offset; divided by the frame size at render time.
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Width/sharpness family: inner and outer glow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowParams {
    pub enabled: bool,
    pub color: [f32; 4],
    pub width: f32,
    pub sharpness: f32,
    pub sharpness_inverse: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlineParams {
    pub enabled: bool,
    pub color: [f32; 4],
    pub width: f32,
    pub offset: f32,
    pub sharpness: f32,
    pub sharpness_inverse: f32,
}

/// Parameters of a single pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PassParams {
    Range(RangeParams),
    Glow(GlowParams),
    Outline(OutlineParams),
}

impl PassParams {
    pub fn enabled(&self) -> bool {
        match self {
            PassParams::Range(p) => p.enabled,
            PassParams::Glow(p) => p.enabled,
            PassParams::Outline(p) => p.enabled,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectParams {
    pub taa: RangeParams,
    pub outer_shadow: RangeParams,
    pub inner_shadow: RangeParams,
    pub outer_glow: GlowParams,
    pub inner_glow: GlowParams,
    pub outline: OutlineParams,
    /// Field resolution relative to the frame (1.0 = same size).
    pub scale: f64,
    /// Alpha cutoff in [0, 1] for "inside the shape".
    pub threshold: f32,
}

impl EffectParams {
    /// Derive every pass's parameters from the raw settings record.
    pub fn rebuild(settings: &FilterSettings) -> Self {
        let scale = settings.scale / 100.0;
        let threshold = (settings.threshold / 100.0) as f32;
        Self {
            taa: range_params(&settings.taa),
            outer_shadow: range_params(&settings.outer_shadow),
            inner_shadow: range_params(&settings.inner_shadow),
            outer_glow: glow_params(&settings.outer_glow),
            inner_glow: glow_params(&settings.inner_glow),
            outline: outline_params(&settings.outline),
            scale: if scale.is_finite() { scale.max(MIN_FIELD_SCALE) } else { 1.0 },
            threshold: if threshold.is_finite() { threshold.clamp(0.0, 1.0) } else { 0.5 },
        }
    }

    pub fn get(&self, pass: Pass) -> PassParams {
        match pass {
            Pass::Taa => PassParams::Range(self.taa),
            Pass::OuterShadow => PassParams::Range(self.outer_shadow),
            Pass::InnerShadow => PassParams::Range(self.inner_shadow),
            Pass::OuterGlow => PassParams::Glow(self.outer_glow),
            Pass::InnerGlow => PassParams::Glow(self.inner_glow),
            Pass::Outline => PassParams::Outline(self.outline),
        }
    }

    /// Enabled passes in draw order.
    pub fn enabled_passes(&self) -> impl Iterator<Item = (Pass, PassParams)> + '_ {
        Pass::ORDER
            .into_iter()
            .map(|pass| (pass, self.get(pass)))
            .filter(|(_, params)| params.enabled())
    }
}

impl Default for EffectParams {
    fn default() -> Self {
        Self::rebuild(&FilterSettings::default())
    }
}

fn is_enabled(toggle: bool, alpha_percent: f64) -> bool {
    toggle && alpha_percent >= ALPHA_EPSILON
}

/// Packed 0xAABBGGRR color + separate alpha percentage → straight RGBA.
pub fn decode_color(packed: u32, alpha_percent: f64) -> [f32; 4] {
    let alpha = (alpha_percent / 100.0) as f32;
    [
        (packed & 0xFF) as f32 / 255.0,
        ((packed >> 8) & 0xFF) as f32 / 255.0,
        ((packed >> 16) & 0xFF) as f32 / 255.0,
        if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 0.0 },
    ]
}

/// Percent sharpness → (clamped sharpness, 1 / (1 - sharpness)).
/// The clamp is applied before the inverse is taken.
pub fn sharpness_pair(percent: f64) -> (f32, f32) {
    let raw = (percent / 100.0) as f32;
    let sharpness = if raw.is_finite() { raw.clamp(0.0, SHARPNESS_LIMIT) } else { 0.0 };
    (sharpness, 1.0 / (1.0 - sharpness))
}

fn range_params(s: &RangeSettings) -> RangeParams {
    RangeParams {
        enabled: is_enabled(s.enabled, s.alpha),
        color: decode_color(s.color, s.alpha),
        range_min: s.range_min as f32,
        range_max: s.range_max as f32,
        offset_x: s.offset_x as f32,
        offset_y: s.offset_y as f32,
    }
}

fn glow_params(s: &GlowSettings) -> GlowParams {
    let (sharpness, sharpness_inverse) = sharpness_pair(s.sharpness);
    GlowParams {
        enabled: is_enabled(s.enabled, s.alpha),
        color: decode_color(s.color, s.alpha),
        width: s.width as f32,
        sharpness,
        sharpness_inverse,
    }
}

fn outline_params(s: &OutlineSettings) -> OutlineParams {
    let (sharpness, sharpness_inverse) = sharpness_pair(s.sharpness);
    OutlineParams {
        enabled: is_enabled(s.enabled, s.alpha),
        color: decode_color(s.color, s.alpha),
        width: s.width as f32,
        offset: s.offset as f32,
        sharpness,
        sharpness_inverse,
    }
}

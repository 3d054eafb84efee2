// ============================================================================
// COMPOSITING STACK — base pass + six edge effects over one distance field
// ============================================================================
//
// Draw order is fixed: base, edge highlight, outer shadow, inner shadow,
// outer glow, inner glow, outline.  Disabled passes issue no draw at all.
//
// Blend for every effect pass (straight-alpha source over, additive alpha):
//   rgb = src.rgb · src.a + dst.rgb · (1 − src.a)
//   a   = src.a + dst.a
// The accumulator is float; alpha is clamped once when the result is stored.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::error::FilterError;
use crate::field::{FieldImage, sample_distance};
use crate::params::{EffectParams, Pass, PassParams};
use crate::render::{CONSUMER_PROGRAM, ColorTarget, FieldTarget};

/// What a pass shader sees for one output pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassSample {
    /// Signed distance to the edge in frame pixels (> 0 outside).
    pub distance: f32,
    /// Source pixel, straight RGBA in [0, 1].
    pub source: [f32; 4],
    /// Binarization threshold the field was built with.
    pub threshold: f32,
}

impl PassSample {
    /// 1 where the source pixel counts as inside the shape, else 0.
    pub fn coverage(&self) -> f32 {
        if self.source[3] > self.threshold { 1.0 } else { 0.0 }
    }
}

/// One technique of the consumer program.
pub trait PassShader: Sync {
    /// Straight-alpha RGBA contribution of `pass` at one pixel.
    fn shade(&self, pass: Pass, params: &PassParams, sample: &PassSample) -> [f32; 4];
}

/// The consumer program: a named technique per pass.
pub trait EffectProgram {
    fn technique(&self, pass: Pass) -> Option<&dyn PassShader>;
}

pub struct CompositeStack {
    accum: FieldTarget,
}

impl CompositeStack {
    pub fn new() -> Self {
        Self {
            accum: FieldTarget::new("composite"),
        }
    }

    /// Layer every enabled effect over `source` and store the result in `output`.
    ///
    /// On error `output` is left in an unspecified state; the caller falls
    /// back to the uncomposited source.
    pub fn run(
        &mut self,
        source: &RgbaImage,
        field: &FieldImage,
        params: &EffectParams,
        program: Option<&dyn EffectProgram>,
        output: &mut ColorTarget,
    ) -> Result<(), FilterError> {
        let (w, h) = source.dimensions();
        let accum = self.accum.render(w, h)?;

        // Base pass.
        for (dst, src) in accum.iter_mut().zip(source.as_raw()) {
            *dst = *src as f32 / 255.0;
        }

        let (fw, fh) = field.dimensions();
        if fw == 0 || fh == 0 {
            return Err(FilterError::TextureUnavailable("field"));
        }
        let unscale = 0.5 * (w as f32 / fw as f32 + h as f32 / fh as f32);

        for (pass, pass_params) in params.enabled_passes() {
            let program = program.ok_or_else(|| FilterError::ProgramLoad {
                name: CONSUMER_PROGRAM.to_string(),
                reason: "not loaded".to_string(),
            })?;
            let shader = program
                .technique(pass)
                .ok_or(FilterError::MissingPass(pass.technique()))?;
            draw_pass(
                accum,
                source,
                field,
                shader,
                pass,
                &pass_params,
                params.threshold,
                unscale,
            );
        }

        let out = output.render(w, h)?;
        for (dst, src) in out.iter_mut().zip(accum.iter()) {
            *dst = (src * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        Ok(())
    }
}

impl Default for CompositeStack {
    fn default() -> Self {
        Self::new()
    }
}

/// One full-frame draw of `shader` into the accumulator.
fn draw_pass(
    accum: &mut FieldImage,
    source: &RgbaImage,
    field: &FieldImage,
    shader: &dyn PassShader,
    pass: Pass,
    params: &PassParams,
    threshold: f32,
    unscale: f32,
) {
    let (w, h) = source.dimensions();
    let stride = w as usize * 4;
    let src_raw = source.as_raw();
    let (shift_u, shift_v) = match params {
        PassParams::Range(p) => (p.offset_x / w as f32, p.offset_y / h as f32),
        _ => (0.0, 0.0),
    };

    accum.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        let v = (y as f32 + 0.5) / h as f32;
        for x in 0..w as usize {
            let pi = x * 4;
            let u = (x as f32 + 0.5) / w as f32;
            let si = y * stride + pi;
            let sample = PassSample {
                distance: sample_distance(field, u + shift_u, v + shift_v) * unscale,
                source: [
                    src_raw[si] as f32 / 255.0,
                    src_raw[si + 1] as f32 / 255.0,
                    src_raw[si + 2] as f32 / 255.0,
                    src_raw[si + 3] as f32 / 255.0,
                ],
                threshold,
            };
            let c = shader.shade(pass, params, &sample);
            let a = c[3];
            if !(a > 0.0) {
                continue;
            }
            let dst = &mut row[pi..pi + 4];
            for ch in 0..3 {
                dst[ch] = c[ch] * a + dst[ch] * (1.0 - a);
            }
            dst[3] += a;
        }
    });
}

// ============================================================================
// JUMP FLOOD — CPU propagation program for the temporal distance field
// ============================================================================
//
// One call = one jump-flood round.  Each field pixel gathers candidate seeds
// from
//   • its 8 direct neighbours, if they lie on the other side of the edge
//   • the feedback field, sampled at ±step and ±1 around it (own texel
//     included)
// and keeps the nearest one.  Inherited seeds are re-validated against the
// current mask, so a moving shape never keeps stale seeds.  Because the own
// texel is always a candidate, the error of a static frame never grows from
// one round to the next.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use super::{FieldImage, FieldInput, FieldProgram, SEEDED, SEED_U, SEED_V, texel_nearest};
use crate::error::FilterError;

/// Rows per rayon task.
const ROWS_PER_TASK: usize = 8;

#[derive(Default)]
pub struct JumpFloodProgram {
    mask: Vec<bool>,
}

impl JumpFloodProgram {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sample `image` at the centre of field pixel (x, y) and compare its alpha
/// against `threshold`.
fn classify(image: &RgbaImage, size: (u32, u32), threshold: f32, mask: &mut Vec<bool>) {
    let (fw, fh) = (size.0 as usize, size.1 as usize);
    let (iw, ih) = image.dimensions();
    let raw = image.as_raw();
    let stride = iw as usize * 4;

    mask.clear();
    mask.resize(fw * fh, false);
    mask.par_chunks_mut(fw).enumerate().for_each(|(y, row)| {
        let sy = (((y as f32 + 0.5) / fh as f32 * ih as f32) as u32).min(ih - 1) as usize;
        for (x, inside) in row.iter_mut().enumerate() {
            let sx = (((x as f32 + 0.5) / fw as f32 * iw as f32) as u32).min(iw - 1) as usize;
            let alpha = raw[sy * stride + sx * 4 + 3] as f32 / 255.0;
            *inside = alpha > threshold;
        }
    });
}

impl FieldProgram for JumpFloodProgram {
    fn propagate(&mut self, input: &FieldInput<'_>, target: &mut FieldImage) -> Result<(), FilterError> {
        let (iw, ih) = input.image.dimensions();
        if iw == 0 || ih == 0 {
            return Err(FilterError::TextureUnavailable("source"));
        }
        if target.dimensions() != input.size || input.size.0 == 0 || input.size.1 == 0 {
            return Err(FilterError::MissingTarget);
        }

        classify(input.image, input.size, input.threshold, &mut self.mask);

        let (fw, fh) = (input.size.0 as i64, input.size.1 as i64);
        let step = input.step.max(1) as i64;
        let mask = &self.mask;
        let feedback = input.feedback;
        let inside_at = |x: i64, y: i64| mask[(y * fw + x) as usize];

        let mut offsets: Vec<(i64, i64)> = Vec::with_capacity(18);
        for s in [step, 1] {
            for oy in [-s, 0, s] {
                for ox in [-s, 0, s] {
                    if !offsets.contains(&(ox, oy)) {
                        offsets.push((ox, oy));
                    }
                }
            }
        }

        let row_len = fw as usize * 4;
        target
            .par_chunks_mut(row_len * ROWS_PER_TASK)
            .enumerate()
            .for_each(|(chunk, rows)| {
                for (r, row) in rows.chunks_mut(row_len).enumerate() {
                    let y = (chunk * ROWS_PER_TASK + r) as i64;
                    for x in 0..fw {
                        let inside = inside_at(x, y);
                        let cx = x as f32 + 0.5;
                        let cy = y as f32 + 0.5;
                        // (squared distance, seed pixel)
                        let mut best: Option<(f32, i64, i64)> = None;
                        let mut consider = |sx: i64, sy: i64| {
                            let dx = sx as f32 + 0.5 - cx;
                            let dy = sy as f32 + 0.5 - cy;
                            let d2 = dx * dx + dy * dy;
                            if best.is_none_or(|(b, _, _)| d2 < b) {
                                best = Some((d2, sx, sy));
                            }
                        };

                        for ny in (y - 1).max(0)..=(y + 1).min(fh - 1) {
                            for nx in (x - 1).max(0)..=(x + 1).min(fw - 1) {
                                if inside_at(nx, ny) != inside {
                                    consider(nx, ny);
                                }
                            }
                        }

                        for &(ox, oy) in &offsets {
                            let (px, py) = (x + ox, y + oy);
                            if px < 0 || py < 0 || px >= fw || py >= fh {
                                continue;
                            }
                            let texel = texel_nearest(
                                feedback,
                                (px as f32 + 0.5) / fw as f32,
                                (py as f32 + 0.5) / fh as f32,
                            );
                            if texel[SEEDED] < 0.5 {
                                continue;
                            }
                            let sx = ((texel[SEED_U] * fw as f32).floor() as i64).clamp(0, fw - 1);
                            let sy = ((texel[SEED_V] * fh as f32).floor() as i64).clamp(0, fh - 1);
                            if inside_at(sx, sy) != inside {
                                consider(sx, sy);
                            }
                        }

                        let out = &mut row[x as usize * 4..x as usize * 4 + 4];
                        match best {
                            Some((d2, sx, sy)) => {
                                let distance = d2.sqrt() - 0.5;
                                out[0] = if inside { -distance } else { distance };
                                out[1] = (sx as f32 + 0.5) / fw as f32;
                                out[2] = (sy as f32 + 0.5) / fh as f32;
                                out[3] = 1.0;
                            }
                            None => {
                                out[0] = if inside { f32::NEG_INFINITY } else { f32::INFINITY };
                                out[1] = 0.0;
                                out[2] = 0.0;
                                out[3] = 0.0;
                            }
                        }
                    }
                }
            });
        Ok(())
    }
}

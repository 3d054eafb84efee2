// ============================================================================
// DISTANCE FIELD — ping-pong buffers and the temporal field generator
// ============================================================================
//
// Architecture:
//   mod.rs        — texel layout, FieldBuffers, DistanceFieldGenerator, sampling
//   jump_flood.rs — CPU implementation of the propagation program
//
// A field texel is `[distance, seed_u, seed_v, seeded]`:
//   distance — signed distance in field pixels, > 0 outside the shape, < 0
//              inside, ±∞ while the nearest opposite pixel is still unknown
//   seed_uv  — centre of the nearest pixel on the other side of the edge
//   seeded   — 1.0 if seed_uv is valid, else 0.0
//
// The field is temporal: every frame the program reads the previous field as
// feedback, so the estimate tightens over successive frames.  A new instance
// starts from a cleared 1×1 field and needs a few frames to converge.
// ============================================================================

pub mod jump_flood;

use image::{Rgba32FImage, RgbaImage};

use crate::error::FilterError;
use crate::render::{FieldTarget, PRODUCER_PROGRAM};

pub use jump_flood::JumpFloodProgram;

pub type FieldImage = Rgba32FImage;

/// Texel channel holding the signed distance.
pub const DISTANCE: usize = 0;
pub const SEED_U: usize = 1;
pub const SEED_V: usize = 2;
pub const SEEDED: usize = 3;

/// Largest field dimension; larger scales are capped.
pub const MAX_FIELD_DIM: u32 = 16384;

// ============================================================================
// FIELD PROGRAM
// ============================================================================

/// Everything the propagation program reads for one frame.
pub struct FieldInput<'a> {
    /// Captured source frame; only its alpha channel is used.
    pub image: &'a RgbaImage,
    /// Working resolution of the field being produced.
    pub size: (u32, u32),
    /// The previous field (any size).
    pub feedback: &'a FieldImage,
    /// Alpha above this counts as inside the shape.
    pub threshold: f32,
    /// Jump distance in field pixels for this frame.
    pub step: u32,
}

/// The per-pixel propagation step that turns (mask, feedback) into a new field.
///
/// `target` is already sized to `input.size` and cleared.
pub trait FieldProgram {
    fn propagate(&mut self, input: &FieldInput<'_>, target: &mut FieldImage) -> Result<(), FilterError>;
}

// ============================================================================
// PING-PONG BUFFERS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    A,
    B,
}

/// Two field targets; one is the current field (`read`), the other is the
/// one being written.  Roles alternate by `swap`, never by copy.
pub struct FieldBuffers {
    a: FieldTarget,
    b: FieldTarget,
    current: Slot,
}

impl FieldBuffers {
    pub fn new() -> Self {
        Self {
            a: FieldTarget::new("field_a"),
            b: FieldTarget::new("field_b"),
            current: Slot::A,
        }
    }

    /// The current field.
    pub fn read(&self) -> &FieldTarget {
        match self.current {
            Slot::A => &self.a,
            Slot::B => &self.b,
        }
    }

    /// `(read, write)`: the current field and the target for the next one.
    pub fn split(&mut self) -> (&FieldTarget, &mut FieldTarget) {
        match self.current {
            Slot::A => (&self.a, &mut self.b),
            Slot::B => (&self.b, &mut self.a),
        }
    }

    /// Make the freshly written target the current field.
    pub fn swap(&mut self) {
        self.current = match self.current {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        };
    }

    /// Drop the backing pixels of both targets (device loss).
    pub fn release(&mut self) {
        self.a.release();
        self.b.release();
    }
}

impl Default for FieldBuffers {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// GENERATOR
// ============================================================================

/// Field resolution for a frame: `⌈w·scale⌉ × ⌈h·scale⌉`, never below 1×1.
pub fn working_size(frame_width: u32, frame_height: u32, scale: f64) -> (u32, u32) {
    let dim = |d: u32| -> u32 {
        let scaled = (d as f64 * scale).ceil();
        if scaled.is_finite() && scaled >= 1.0 {
            (scaled as u32).min(MAX_FIELD_DIM)
        } else {
            1
        }
    };
    (dim(frame_width), dim(frame_height))
}

/// Jump distance for the `frame`-th advance: halves every frame from half the
/// field's power-of-two extent down to 1, then starts over.
pub fn jump_step(width: u32, height: u32, frame: u64) -> u32 {
    let extent = width.max(height).max(1).next_power_of_two();
    let levels = extent.trailing_zeros().max(1) as u64;
    let index = (frame % levels) as u32;
    ((extent / 2) >> index).max(1)
}

pub struct DistanceFieldGenerator {
    buffers: FieldBuffers,
    program: Option<Box<dyn FieldProgram>>,
    frame: u64,
}

impl DistanceFieldGenerator {
    pub fn new(program: Option<Box<dyn FieldProgram>>) -> Self {
        Self {
            buffers: FieldBuffers::new(),
            program,
            frame: 0,
        }
    }

    /// Produce the next field estimate from `mask` and swap it in.
    pub fn advance(
        &mut self,
        mask: &RgbaImage,
        frame_width: u32,
        frame_height: u32,
        scale: f64,
        threshold: f32,
    ) -> Result<&FieldImage, FilterError> {
        let program = self.program.as_mut().ok_or_else(|| FilterError::ProgramLoad {
            name: PRODUCER_PROGRAM.to_string(),
            reason: "not loaded".to_string(),
        })?;

        let size = working_size(frame_width, frame_height, scale);
        let step = jump_step(size.0, size.1, self.frame);

        let (read, write) = self.buffers.split();
        let feedback = read.texture().ok_or(FilterError::TextureUnavailable(read.label()))?;
        let target = write.render(size.0, size.1)?;
        program.propagate(
            &FieldInput {
                image: mask,
                size,
                feedback,
                threshold,
                step,
            },
            target,
        )?;

        self.buffers.swap();
        self.frame += 1;
        let read = self.buffers.read();
        read.texture().ok_or(FilterError::TextureUnavailable(read.label()))
    }

    /// The current field, if any.
    pub fn field(&self) -> Option<&FieldImage> {
        self.buffers.read().texture()
    }

    /// Number of completed advances.
    pub fn frames(&self) -> u64 {
        self.frame
    }

    /// Drop both field buffers.  Every later advance fails with
    /// `TextureUnavailable`; only a new generator starts a fresh field.
    pub fn release(&mut self) {
        self.buffers.release();
    }
}

// ============================================================================
// SAMPLING
// ============================================================================

/// Nearest texel at normalized `(u, v)`, clamped to the edge.
pub fn texel_nearest(field: &FieldImage, u: f32, v: f32) -> [f32; 4] {
    let (w, h) = field.dimensions();
    let x = ((u * w as f32).floor().max(0.0) as u32).min(w - 1);
    let y = ((v * h as f32).floor().max(0.0) as u32).min(h - 1);
    field.get_pixel(x, y).0
}

/// Signed distance (field pixels) at normalized `(u, v)`, bilinearly filtered.
/// Falls back to the nearest texel where a neighbour is still unseeded.
pub fn sample_distance(field: &FieldImage, u: f32, v: f32) -> f32 {
    let (w, h) = field.dimensions();
    let fx = u * w as f32 - 0.5;
    let fy = v * h as f32 - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;

    let clamp_x = |x: f32| (x.max(0.0) as u32).min(w - 1);
    let clamp_y = |y: f32| (y.max(0.0) as u32).min(h - 1);
    let (xa, xb) = (clamp_x(x0), clamp_x(x0 + 1.0));
    let (ya, yb) = (clamp_y(y0), clamp_y(y0 + 1.0));

    let d = |x: u32, y: u32| field.get_pixel(x, y).0[DISTANCE];
    let (d00, d10, d01, d11) = (d(xa, ya), d(xb, ya), d(xa, yb), d(xb, yb));
    if !(d00.is_finite() && d10.is_finite() && d01.is_finite() && d11.is_finite()) {
        return texel_nearest(field, u, v)[DISTANCE];
    }
    let top = d00 + (d10 - d00) * tx;
    let bottom = d01 + (d11 - d01) * tx;
    top + (bottom - top) * ty
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn working_size_never_drops_below_one() {
        assert_eq!(working_size(200, 100, 1.0), (200, 100));
        assert_eq!(working_size(200, 100, 0.5), (100, 50));
        assert_eq!(working_size(201, 101, 0.5), (101, 51));
        assert_eq!(working_size(200, 100, 0.0001), (1, 1));
        assert_eq!(working_size(200, 100, 0.0), (1, 1));
        assert_eq!(working_size(200, 100, f64::NAN), (1, 1));
        assert_eq!(working_size(100_000, 10, 1.0), (MAX_FIELD_DIM, 10));
    }

    #[test]
    fn jump_steps_cycle_down_to_one() {
        let steps: Vec<u32> = (0..8).map(|f| jump_step(64, 40, f)).collect();
        assert_eq!(steps, vec![32, 16, 8, 4, 2, 1, 32, 16]);
        assert_eq!(jump_step(1, 1, 0), 1);
        assert_eq!(jump_step(1, 1, 7), 1);
        assert_eq!(jump_step(2, 1, 3), 1);
    }

    #[test]
    fn swap_alternates_roles() {
        let mut buffers = FieldBuffers::new();
        {
            let (_, write) = buffers.split();
            write.render(3, 2).unwrap();
        }
        assert_eq!(buffers.read().size(), (1, 1));
        buffers.swap();
        assert_eq!(buffers.read().size(), (3, 2));
        buffers.swap();
        assert_eq!(buffers.read().size(), (1, 1));
    }

    #[test]
    fn bilinear_sampling_interpolates_and_falls_back() {
        let mut field = FieldImage::new(2, 1);
        field.put_pixel(0, 0, Rgba([1.0, 0.0, 0.0, 1.0]));
        field.put_pixel(1, 0, Rgba([3.0, 0.0, 0.0, 1.0]));
        assert!((sample_distance(&field, 0.5, 0.5) - 2.0).abs() < 1e-5);
        assert!((sample_distance(&field, 0.25, 0.5) - 1.0).abs() < 1e-5);

        field.put_pixel(1, 0, Rgba([f32::INFINITY, 0.0, 0.0, 0.0]));
        assert_eq!(sample_distance(&field, 0.2, 0.5), 1.0);
        assert_eq!(sample_distance(&field, 0.8, 0.5), f32::INFINITY);
    }

    #[test]
    fn advance_without_program_fails() {
        let mut generator = DistanceFieldGenerator::new(None);
        let mask = RgbaImage::new(4, 4);
        assert!(matches!(
            generator.advance(&mask, 4, 4, 1.0, 0.5),
            Err(FilterError::ProgramLoad { .. })
        ));
        assert_eq!(generator.frames(), 0);
    }

    #[test]
    fn advance_fails_once_buffers_are_released() {
        let mut generator = DistanceFieldGenerator::new(Some(Box::new(JumpFloodProgram::new())));
        let mask = RgbaImage::from_fn(8, 8, |x, _| image::Rgba([0, 0, 0, if x < 4 { 255 } else { 0 }]));
        let field = generator.advance(&mask, 8, 8, 1.0, 0.5).unwrap();
        assert_eq!(field.get_pixel(4, 0).0[DISTANCE], 0.5);
        generator.release();
        assert!(generator.field().is_none());

        for _ in 0..2 {
            assert!(matches!(
                generator.advance(&mask, 8, 8, 1.0, 0.5),
                Err(FilterError::TextureUnavailable(_))
            ));
        }
        assert!(generator.field().is_none());
        assert_eq!(generator.frames(), 1);
    }
}

// ============================================================================
// RENDER TARGET — owned pixel storage that is resized in place
// ============================================================================

use image::{ImageBuffer, Pixel, Primitive, Rgba};

use crate::error::FilterError;

/// An offscreen target owned by one filter instance.
///
/// Created as a cleared 1×1 target.  `render` resizes it in place, reusing the
/// allocation whenever the pixel count allows, and clears it to transparent.
/// The storage is released when the target is dropped.
pub struct RenderTarget<P: Pixel> {
    label: &'static str,
    image: ImageBuffer<P, Vec<P::Subpixel>>,
}

/// 8-bit RGBA target (source capture, composited output).
pub type ColorTarget = RenderTarget<Rgba<u8>>;
/// 32-bit float RGBA target (distance field, blend accumulator).
pub type FieldTarget = RenderTarget<Rgba<f32>>;

impl<P: Pixel> RenderTarget<P> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            image: ImageBuffer::new(1, 1),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Bind the target at `width`×`height`, cleared to transparent.
    pub fn render(&mut self, width: u32, height: u32) -> Result<&mut ImageBuffer<P, Vec<P::Subpixel>>, FilterError> {
        if width == 0 || height == 0 {
            return Err(FilterError::MissingTarget);
        }
        let zero = <P::Subpixel as Primitive>::DEFAULT_MIN_VALUE;
        if self.image.dimensions() != (width, height) {
            let len = width as usize * height as usize * P::CHANNEL_COUNT as usize;
            let mut raw = std::mem::replace(&mut self.image, ImageBuffer::new(0, 0)).into_raw();
            raw.clear();
            raw.resize(len, zero);
            self.image = ImageBuffer::from_raw(width, height, raw)
                .ok_or(FilterError::TextureUnavailable(self.label))?;
        } else {
            let data: &mut [P::Subpixel] = &mut self.image;
            data.fill(zero);
        }
        Ok(&mut self.image)
    }

    /// The target's contents, or `None` if it has no backing pixels.
    pub fn texture(&self) -> Option<&ImageBuffer<P, Vec<P::Subpixel>>> {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 { None } else { Some(&self.image) }
    }

    /// Drop the backing pixels (e.g. after the device was lost).  The next
    /// `render` call allocates again.
    pub fn release(&mut self) {
        self.image = ImageBuffer::new(0, 0);
    }
}

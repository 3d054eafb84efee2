// ============================================================================
// HOST — what a filter instance needs from the application embedding it
// ============================================================================
//
// The host owns the frame the filter is attached to.  It renders that frame
// into the filter's capture target, displays whatever the filter presents,
// and passes the frame through untouched when asked to bypass.
// ============================================================================

use image::RgbaImage;

use crate::error::FilterError;

/// The final draw effect used to blit a texture into a target
/// (the host's "effect override").
pub trait FinalEffect {
    fn draw(&self, texture: &RgbaImage, target: &mut RgbaImage);
}

/// Straight copy, anchored at the top-left corner.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultEffect;

impl FinalEffect for DefaultEffect {
    fn draw(&self, texture: &RgbaImage, target: &mut RgbaImage) {
        image::imageops::replace(target, texture, 0, 0);
    }
}

pub trait Host {
    /// Size of the frame the filter is attached to, or `None` when the
    /// filter has no target or parent.
    fn target_size(&self) -> Option<(u32, u32)>;

    /// Render the unfiltered frame into `target` (already sized and cleared).
    fn capture_source(&mut self, effect: &dyn FinalEffect, target: &mut RgbaImage) -> Result<(), FilterError>;

    /// Show this frame without the filter.
    fn bypass_filter(&mut self);

    /// Show the filtered frame.
    fn present(&mut self, image: &RgbaImage, effect: &dyn FinalEffect);
}

// ============================================================================
// IMAGE SEQUENCE HOST — frames come from still images (CLI, tests)
// ============================================================================

#[derive(Default)]
pub struct ImageSequenceHost {
    frame: Option<RgbaImage>,
    output: Option<RgbaImage>,
    bypassed: bool,
}

impl ImageSequenceHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `frame` the current frame and forget the previous result.
    pub fn set_frame(&mut self, frame: RgbaImage) {
        self.frame = Some(frame);
        self.output = None;
        self.bypassed = false;
    }

    /// The last presented (or bypassed) frame.
    pub fn output(&self) -> Option<&RgbaImage> {
        self.output.as_ref()
    }

    pub fn take_output(&mut self) -> Option<RgbaImage> {
        self.output.take()
    }

    /// Whether the filter asked to be bypassed since the frame was set.
    pub fn bypassed(&self) -> bool {
        self.bypassed
    }
}

impl Host for ImageSequenceHost {
    fn target_size(&self) -> Option<(u32, u32)> {
        self.frame
            .as_ref()
            .map(|f| f.dimensions())
            .filter(|&(w, h)| w > 0 && h > 0)
    }

    fn capture_source(&mut self, effect: &dyn FinalEffect, target: &mut RgbaImage) -> Result<(), FilterError> {
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| FilterError::Capture("no frame loaded".to_string()))?;
        effect.draw(frame, target);
        Ok(())
    }

    fn bypass_filter(&mut self) {
        self.bypassed = true;
        self.output = self.frame.clone();
    }

    fn present(&mut self, image: &RgbaImage, effect: &dyn FinalEffect) {
        let (w, h) = image.dimensions();
        let mut out = RgbaImage::new(w, h);
        effect.draw(image, &mut out);
        self.output = Some(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn sequence_host_captures_and_bypasses() {
        let mut host = ImageSequenceHost::new();
        assert_eq!(host.target_size(), None);
        let mut target = RgbaImage::new(2, 2);
        assert!(matches!(
            host.capture_source(&DefaultEffect, &mut target),
            Err(FilterError::Capture(_))
        ));

        let frame = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4]));
        host.set_frame(frame.clone());
        assert_eq!(host.target_size(), Some((2, 2)));
        host.capture_source(&DefaultEffect, &mut target).unwrap();
        assert_eq!(target, frame);

        host.bypass_filter();
        assert!(host.bypassed());
        assert_eq!(host.output(), Some(&frame));
    }
}

// ============================================================================
// FRAME CACHE — per-tick "already done" flags for capture and compositing
// ============================================================================
//
// The host may render a filter several times per tick (previews, projectors).
// Capture + field advance and compositing each run at most once per tick; the
// flags are cleared again by the next tick.  Both flags are only touched from
// the render thread, so no lock is needed here.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCache {
    source_captured: bool,
    output_composited: bool,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start of a new tick: everything has to be produced again.
    pub fn reset(&mut self) {
        self.source_captured = false;
        self.output_composited = false;
    }

    pub fn source_captured(&self) -> bool {
        self.source_captured
    }

    pub fn output_composited(&self) -> bool {
        self.output_composited
    }

    pub fn mark_source_captured(&mut self) {
        self.source_captured = true;
    }

    pub fn mark_output_composited(&mut self) {
        self.output_composited = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_both_flags() {
        let mut cache = FrameCache::new();
        cache.mark_source_captured();
        cache.mark_output_composited();
        assert!(cache.source_captured() && cache.output_composited());
        cache.reset();
        assert_eq!(cache, FrameCache::default());
    }
}

#![allow(dead_code)]
use std::{cell::Cell, rc::Rc};

use edgefx::{
    Backend, FilterError, FinalEffect, Host,
    field::{FieldImage, FieldInput, FieldProgram, JumpFloodProgram},
    ops::{EffectProgram, FalloffProgram, PassShader},
    params::Pass,
    render::{CONSUMER_PROGRAM, PRODUCER_PROGRAM},
};
use image::{Rgba, RgbaImage};

pub fn try_init_logger_for_default_harness() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `size`×`size` frame with an opaque blue square covering `lo..hi` on both axes.
pub fn square_frame(size: u32, lo: u32, hi: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
            Rgba([0, 0, 255, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

// ============================================================================
// Host
// ============================================================================

#[derive(Clone, Default)]
pub struct Counters {
    pub captures: Rc<Cell<usize>>,
    pub bypasses: Rc<Cell<usize>>,
    pub presents: Rc<Cell<usize>>,
    pub advances: Rc<Cell<usize>>,
}

pub struct MockHost {
    pub frame: RgbaImage,
    pub has_target: bool,
    pub output: Option<RgbaImage>,
    pub counters: Counters,
}

impl MockHost {
    pub fn new(frame: RgbaImage, counters: &Counters) -> Self {
        Self {
            frame,
            has_target: true,
            output: None,
            counters: counters.clone(),
        }
    }
}

impl Host for MockHost {
    fn target_size(&self) -> Option<(u32, u32)> {
        if self.has_target { Some(self.frame.dimensions()) } else { None }
    }

    fn capture_source(&mut self, effect: &dyn FinalEffect, target: &mut RgbaImage) -> Result<(), FilterError> {
        self.counters.captures.set(self.counters.captures.get() + 1);
        effect.draw(&self.frame, target);
        Ok(())
    }

    fn bypass_filter(&mut self) {
        self.counters.bypasses.set(self.counters.bypasses.get() + 1);
        self.output = Some(self.frame.clone());
    }

    fn present(&mut self, image: &RgbaImage, _effect: &dyn FinalEffect) {
        self.counters.presents.set(self.counters.presents.get() + 1);
        self.output = Some(image.clone());
    }
}

// ============================================================================
// Backend
// ============================================================================

struct CountingProducer {
    inner: JumpFloodProgram,
    advances: Rc<Cell<usize>>,
}

impl FieldProgram for CountingProducer {
    fn propagate(&mut self, input: &FieldInput<'_>, target: &mut FieldImage) -> Result<(), FilterError> {
        self.advances.set(self.advances.get() + 1);
        self.inner.propagate(input, target)
    }
}

/// The falloff program with one technique removed.
struct PartialConsumer {
    inner: FalloffProgram,
    missing: Pass,
}

impl EffectProgram for PartialConsumer {
    fn technique(&self, pass: Pass) -> Option<&dyn PassShader> {
        if pass == self.missing { None } else { self.inner.technique(pass) }
    }
}

#[derive(Default)]
pub struct MockBackend {
    pub counters: Counters,
    pub fail_producer: bool,
    pub fail_consumer: bool,
    pub missing_pass: Option<Pass>,
}

impl MockBackend {
    pub fn new(counters: &Counters) -> Self {
        Self {
            counters: counters.clone(),
            ..Self::default()
        }
    }
}

impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn load_producer(&self, name: &str) -> Result<Box<dyn FieldProgram>, FilterError> {
        if self.fail_producer || name != PRODUCER_PROGRAM {
            return Err(FilterError::ProgramLoad {
                name: name.to_string(),
                reason: "mock failure".to_string(),
            });
        }
        Ok(Box::new(CountingProducer {
            inner: JumpFloodProgram::new(),
            advances: self.counters.advances.clone(),
        }))
    }

    fn load_consumer(&self, name: &str) -> Result<Box<dyn EffectProgram>, FilterError> {
        if self.fail_consumer || name != CONSUMER_PROGRAM {
            return Err(FilterError::ProgramLoad {
                name: name.to_string(),
                reason: "mock failure".to_string(),
            });
        }
        Ok(match self.missing_pass {
            Some(missing) => Box::new(PartialConsumer {
                inner: FalloffProgram::new(),
                missing,
            }),
            None => Box::new(FalloffProgram::new()),
        })
    }
}

// ============================================================================
// FILTER INSTANCE — per-source state and the tick / render protocol
// ============================================================================
//
// Per render:
//   1. capture the source frame            ┐ once per tick
//   2. advance the distance field          ┘ (FrameCache::source_captured)
//   3. composite the enabled effects         once per tick (output_composited)
//   4. present the output texture
//
// Abort scopes:
//   no target / capture or field failure → host.bypass_filter()
//   compositing failure                  → the captured source is presented
// ============================================================================

use uuid::Uuid;

use crate::error::FilterError;
use crate::field::DistanceFieldGenerator;
use crate::frame::FrameCache;
use crate::host::{DefaultEffect, FinalEffect, Host};
use crate::ops::{CompositeStack, EffectProgram};
use crate::params::EffectParams;
use crate::render::{Backend, CONSUMER_PROGRAM, ColorTarget, PRODUCER_PROGRAM};
use crate::settings::{self, FilterSettings};

pub struct FilterInstance {
    id: Uuid,
    tag: String,
    settings: FilterSettings,
    params: EffectParams,
    cache: FrameCache,
    source_rt: ColorTarget,
    output_rt: ColorTarget,
    generator: DistanceFieldGenerator,
    stack: CompositeStack,
    consumer: Option<Box<dyn EffectProgram>>,
    /// Last per-frame failure, so a persistent one is only logged once.
    last_failure: Option<String>,
}

/// Create a filter instance and load its programs from `backend`.
///
/// A program that fails to load is logged and left out; the instance then
/// bypasses (producer) or passes the source through (consumer) every frame.
pub fn create(settings: &FilterSettings, backend: &dyn Backend) -> FilterInstance {
    let id = Uuid::new_v4();
    let tag = format!("<edgefx:{}>", &id.simple().to_string()[..8]);

    let producer = match backend.load_producer(PRODUCER_PROGRAM) {
        Ok(program) => Some(program),
        Err(e) => {
            log::error!("{} {}", tag, e);
            None
        }
    };
    let consumer = match backend.load_consumer(CONSUMER_PROGRAM) {
        Ok(program) => Some(program),
        Err(e) => {
            log::error!("{} {}", tag, e);
            None
        }
    };
    log::debug!("{} created on '{}' backend", tag, backend.name());

    FilterInstance {
        id,
        tag,
        settings: settings.clone(),
        params: EffectParams::rebuild(settings),
        cache: FrameCache::new(),
        source_rt: ColorTarget::new("source"),
        output_rt: ColorTarget::new("output"),
        generator: DistanceFieldGenerator::new(producer),
        stack: CompositeStack::new(),
        consumer,
        last_failure: None,
    }
}

/// Tear an instance down; every render target is released with it.
pub fn destroy(instance: FilterInstance) {
    log::debug!("{} destroyed after {} frames", instance.tag, instance.generator.frames());
    drop(instance);
}

impl FilterInstance {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    pub fn cache(&self) -> FrameCache {
        self.cache
    }

    pub fn generator(&self) -> &DistanceFieldGenerator {
        &self.generator
    }

    /// A new frame is available: forget this tick's capture and composite.
    pub fn on_tick(&mut self, host: &dyn Host, _delta_time: f32) {
        if host.target_size().is_some_and(|(w, h)| w > 0 && h > 0) {
            self.cache.reset();
        }
    }

    pub fn on_render(&mut self, host: &mut dyn Host, effect_override: Option<&dyn FinalEffect>) {
        let effect: &dyn FinalEffect = effect_override.unwrap_or(&DefaultEffect);

        let (width, height) = match host.target_size() {
            Some((w, h)) if w > 0 && h > 0 => (w, h),
            _ => {
                self.note_failure("target", &FilterError::MissingTarget);
                host.bypass_filter();
                return;
            }
        };

        if !self.cache.source_captured() {
            if let Err(e) = self.capture_and_advance(host, effect, width, height) {
                self.note_failure("field", &e);
                host.bypass_filter();
                return;
            }
            self.cache.mark_source_captured();
        }

        if !self.cache.output_composited() {
            match self.composite() {
                Ok(()) => self.note_success(),
                Err(e) => {
                    self.note_failure("composite", &e);
                    if let Err(e) = self.pass_source_through() {
                        self.note_failure("passthrough", &e);
                        self.output_rt.release();
                    }
                }
            }
            self.cache.mark_output_composited();
        }

        match self.output_rt.texture() {
            Some(texture) => host.present(texture, effect),
            None => host.bypass_filter(),
        }
    }

    /// Settings changed: rebuild the parameter store.  Safe before the first render.
    pub fn on_settings_update(&mut self, settings: &FilterSettings) {
        self.settings = settings.clone();
        self.params = EffectParams::rebuild(&self.settings);
        log::debug!(
            "{} settings updated, {} passes enabled",
            self.tag,
            self.params.enabled_passes().count()
        );
    }

    /// Settings reloaded from storage.
    pub fn load(&mut self, settings: &FilterSettings) {
        self.on_settings_update(settings);
    }

    /// Stored settings from an older version; nothing to convert.
    pub fn migrate(&self, settings: FilterSettings, version: u64) -> FilterSettings {
        settings::migrate(settings, version)
    }

    /// Drop every render target (e.g. after device loss).  The field
    /// buffers are gone for good, so every later render bypasses until the
    /// host destroys this instance and creates a new one.
    pub fn release_targets(&mut self) {
        self.source_rt.release();
        self.output_rt.release();
        self.generator.release();
    }

    fn capture_and_advance(
        &mut self,
        host: &mut dyn Host,
        effect: &dyn FinalEffect,
        width: u32,
        height: u32,
    ) -> Result<(), FilterError> {
        let target = self.source_rt.render(width, height)?;
        host.capture_source(effect, target)?;
        let source = self
            .source_rt
            .texture()
            .ok_or(FilterError::TextureUnavailable(self.source_rt.label()))?;
        self.generator
            .advance(source, width, height, self.params.scale, self.params.threshold)?;
        Ok(())
    }

    fn composite(&mut self) -> Result<(), FilterError> {
        let source = self
            .source_rt
            .texture()
            .ok_or(FilterError::TextureUnavailable(self.source_rt.label()))?;
        let field = self.generator.field().ok_or(FilterError::TextureUnavailable("field"))?;
        self.stack.run(
            source,
            field,
            &self.params,
            self.consumer.as_deref(),
            &mut self.output_rt,
        )
    }

    fn pass_source_through(&mut self) -> Result<(), FilterError> {
        let source = self
            .source_rt
            .texture()
            .ok_or(FilterError::TextureUnavailable(self.source_rt.label()))?;
        let (w, h) = source.dimensions();
        let out = self.output_rt.render(w, h)?;
        out.copy_from_slice(source.as_raw());
        Ok(())
    }

    fn note_failure(&mut self, stage: &str, error: &FilterError) {
        let message = format!("{}: {}", stage, error);
        if self.last_failure.as_deref() != Some(message.as_str()) {
            log::warn!("{} {}", self.tag, message);
            self.last_failure = Some(message);
        }
    }

    fn note_success(&mut self) {
        if let Some(previous) = self.last_failure.take() {
            log::info!("{} recovered after '{}'", self.tag, previous);
        }
    }
}

// ============================================================================
// OPS — distance-field consumers
// ============================================================================
//
//   falloff.rs   — analytic falloff curves and the default pass shaders
//   composite.rs — the ordered compositing stack and its blend equation
// ============================================================================

pub mod composite;
pub mod falloff;

pub use composite::{CompositeStack, EffectProgram, PassSample, PassShader};
pub use falloff::FalloffProgram;

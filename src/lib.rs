// ============================================================================
// edgefx — distance-field edge effects for alpha-masked video frames
// ============================================================================
//
// A filter instance turns each frame's alpha mask into a temporal distance
// field and layers shadows, glows, an outline and an edge highlight on top of
// the frame, driven by a flat settings record.
//
//   settings — persisted record, key/value overrides, preset files
//   params   — render-ready parameter store derived from the settings
//   frame    — per-tick capture / composite cache
//   render   — render targets and the graphics backend seam
//   field    — ping-pong distance field and its CPU jump-flood program
//   ops      — falloff curves and the compositing stack
//   gpu      — wgpu producer for the distance field
//   host     — the embedding application's side of the contract
//   filter   — FilterInstance and its create/destroy functions
// ============================================================================

#![allow(clippy::too_many_arguments)]
#![allow(clippy::new_without_default)]

pub mod error;
pub mod field;
pub mod filter;
pub mod frame;
pub mod gpu;
pub mod host;
pub mod ops;
pub mod params;
pub mod render;
pub mod settings;

pub use error::FilterError;
pub use filter::{FilterInstance, create, destroy};
pub use host::{DefaultEffect, FinalEffect, Host, ImageSequenceHost};
pub use render::{Backend, CpuBackend};
pub use settings::FilterSettings;

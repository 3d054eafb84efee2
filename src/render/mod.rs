// ============================================================================
// RENDER MODULE — render targets and the graphics backend seam
// ============================================================================
//
// Architecture:
//   target.rs  — RAII render target with resize-in-place
//   backend.rs — Backend trait (program loading) + the CPU backend
// ============================================================================

pub mod backend;
pub mod target;

pub use backend::{Backend, CONSUMER_PROGRAM, CpuBackend, PRODUCER_PROGRAM};
pub use target::{ColorTarget, FieldTarget, RenderTarget};

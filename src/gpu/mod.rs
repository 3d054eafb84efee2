// ============================================================================
// GPU MODULE — wgpu producer for the distance field
// ============================================================================
//
// Architecture:
//   context.rs — wgpu Device, Queue, adapter init
//   shaders.rs — WGSL shader source (inline strings)
//   field.rs   — compute pipeline running one jump-flood round per frame
//
// Only the producer runs on the GPU; the effect passes stay on the CPU.
// ============================================================================

pub mod context;
pub mod field;
pub mod shaders;

use std::sync::Arc;

use crate::error::FilterError;
use crate::field::FieldProgram;
use crate::ops::{EffectProgram, FalloffProgram};
use crate::render::backend::unknown_program;
use crate::render::{Backend, CONSUMER_PROGRAM, PRODUCER_PROGRAM};

pub use context::GpuContext;
pub use field::GpuFieldProgram;

pub struct GpuBackend {
    ctx: Arc<GpuContext>,
}

impl GpuBackend {
    /// `None` when no adapter (hardware or software) is available.
    pub fn new(preferred_gpu: &str) -> Option<Self> {
        GpuContext::new(preferred_gpu).map(|ctx| Self { ctx: Arc::new(ctx) })
    }

    pub fn adapter_name(&self) -> &str {
        &self.ctx.adapter_name
    }
}

impl Backend for GpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn load_producer(&self, name: &str) -> Result<Box<dyn FieldProgram>, FilterError> {
        match name {
            PRODUCER_PROGRAM => Ok(Box::new(GpuFieldProgram::new(Arc::clone(&self.ctx)))),
            other => Err(unknown_program(other)),
        }
    }

    fn load_consumer(&self, name: &str) -> Result<Box<dyn EffectProgram>, FilterError> {
        match name {
            CONSUMER_PROGRAM => Ok(Box::new(FalloffProgram::new())),
            other => Err(unknown_program(other)),
        }
    }
}

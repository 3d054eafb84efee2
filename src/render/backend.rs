// ============================================================================
// BACKEND — where a filter instance gets its producer and consumer programs
// ============================================================================

use crate::error::FilterError;
use crate::field::{FieldProgram, JumpFloodProgram};
use crate::ops::{EffectProgram, FalloffProgram};

/// Name of the program that advances the distance field.
pub const PRODUCER_PROGRAM: &str = "sdf-producer";
/// Name of the program that renders the effect passes.
pub const CONSUMER_PROGRAM: &str = "sdf-consumer";

/// Graphics backend seen by a filter instance.
///
/// Programs are loaded once when the instance is created; a failed load is
/// not retried.
pub trait Backend {
    fn name(&self) -> &str;
    fn load_producer(&self, name: &str) -> Result<Box<dyn FieldProgram>, FilterError>;
    fn load_consumer(&self, name: &str) -> Result<Box<dyn EffectProgram>, FilterError>;
}

/// Both programs on the CPU (rayon).
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuBackend;

impl Backend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn load_producer(&self, name: &str) -> Result<Box<dyn FieldProgram>, FilterError> {
        match name {
            PRODUCER_PROGRAM => Ok(Box::new(JumpFloodProgram::new())),
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

pub(crate) fn unknown_program(name: &str) -> FilterError {
    FilterError::ProgramLoad {
        name: name.to_string(),
        reason: "no such program".to_string(),
    }
}

// ============================================================================
// FILTER ERRORS — one error type for every failure path of the stage
// ============================================================================
//
// Where an error surfaces decides what happens to the frame:
//   - capture / field generation  → the host is asked to bypass the filter
//   - compositing                 → the uncomposited capture is shown instead
//   - settings / presets          → reported to the caller, never per frame

use std::fmt;

#[derive(Debug)]
pub enum FilterError {
    /// The filter has no target/parent, or the target is zero-sized.
    MissingTarget,
    /// The host could not render the source into the capture target.
    Capture(String),
    /// A render target has no backing texture.
    TextureUnavailable(&'static str),
    /// A program could not be loaded from the backend.
    ProgramLoad { name: String, reason: String },
    /// A program was loaded but has no entry point for the requested pass.
    MissingPass(&'static str),
    Gpu(String),
    Io(std::io::Error),
    Serialize(String),
    InvalidSettings(String),
    Image(String),
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::MissingTarget => write!(f, "filter has no valid target"),
            FilterError::Capture(e) => write!(f, "failed to capture source: {}", e),
            FilterError::TextureUnavailable(which) => {
                write!(f, "render target '{}' has no texture", which)
            }
            FilterError::ProgramLoad { name, reason } => {
                write!(f, "failed to load program '{}': {}", name, reason)
            }
            FilterError::MissingPass(pass) => write!(f, "program has no pass '{}'", pass),
            FilterError::Gpu(e) => write!(f, "GPU error: {}", e),
            FilterError::Io(e) => write!(f, "I/O error: {}", e),
            FilterError::Serialize(e) => write!(f, "Serialization error: {}", e),
            FilterError::InvalidSettings(e) => write!(f, "Invalid settings: {}", e),
            FilterError::Image(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FilterError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FilterError {
    fn from(e: std::io::Error) -> Self {
        FilterError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for FilterError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        FilterError::Serialize(e.to_string())
    }
}

impl From<image::ImageError> for FilterError {
    fn from(e: image::ImageError) -> Self {
        FilterError::Image(e.to_string())
    }
}

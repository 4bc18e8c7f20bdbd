use crate::spec::validate::ValidationErrors;

/// Convenience result type used across adcanvas.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Per-primitive problems (unknown primitive kinds, failed image assets) are not errors: the
/// compositor recovers from them locally and records a [`crate::Diagnostic`] instead.
#[derive(thiserror::Error, Debug)]
pub enum CanvasError {
    /// The input specification is malformed. Carries every violated field path.
    #[error("validation error: {0}")]
    Validation(ValidationErrors),

    /// The scene could not be initialized or was handed to the compositor in the wrong state.
    #[error("scene error: {0}")]
    Scene(String),

    /// An operation was invoked before its precondition held (e.g. export before the scene is
    /// ready). This is a programming error in the caller and is never retried.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Rasterization or encoding failed.
    #[error("export error: {0}")]
    Export(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CanvasError {
    /// Build a [`CanvasError::Scene`] value.
    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }

    /// Build a [`CanvasError::Precondition`] value.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`CanvasError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`CanvasError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return the structured validation errors, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for CanvasError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

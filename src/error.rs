//! Error handling for Pipeworks
//!
//! Fitting operations report [`PipelineError`](crate::pipeline::PipelineError).
//! Everything around the core (configuration, scripts, files) reports
//! [`PipeworksError`], which can wrap a pipeline error.

use crate::pipeline::PipelineError;
use thiserror::Error;

/// Main error type for Pipeworks operations
#[derive(Error, Debug)]
pub enum PipeworksError {
    /// Errors raised by fittings or junctions
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Errors related to Rhai filter scripts
    #[error("Script error: {0}")]
    Script(String),

    /// Errors related to configuration loading/saving or topology building
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipeworksError>,
    },
}

impl PipeworksError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipeworksError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a script error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        PipeworksError::Script(err.to_string())
    }
}

impl From<Box<rhai::EvalAltResult>> for PipeworksError {
    fn from(err: Box<rhai::EvalAltResult>) -> Self {
        PipeworksError::from_rhai_error(err)
    }
}

impl From<rhai::ParseError> for PipeworksError {
    fn from(err: rhai::ParseError) -> Self {
        PipeworksError::Script(format!("Compilation error: {}", err))
    }
}

impl From<toml::de::Error> for PipeworksError {
    fn from(err: toml::de::Error) -> Self {
        PipeworksError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for PipeworksError {
    fn from(err: toml::ser::Error) -> Self {
        PipeworksError::Serialization(err.to_string())
    }
}

/// Result type alias for Pipeworks operations
pub type Result<T> = std::result::Result<T, PipeworksError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<PipeworksError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}

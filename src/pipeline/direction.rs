//! Direction a pipe is registered under in a junction.

use crate::pipeline::error::PipelineError;
use std::fmt;
use std::str::FromStr;

/// Whether a pipe carries messages into a module or out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipeDirection {
    Input,
    Output,
}

impl PipeDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            PipeDirection::Input => "input",
            PipeDirection::Output => "output",
        }
    }
}

impl fmt::Display for PipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipeDirection {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" => Ok(PipeDirection::Input),
            "output" => Ok(PipeDirection::Output),
            _ => Err(PipelineError::UnknownDirection(s.to_string())),
        }
    }
}

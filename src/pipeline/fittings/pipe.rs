//! Pipe: The plain single-output passthrough.

use crate::pipeline::error::PipelineResult;
use crate::pipeline::fitting::{Fitting, FittingRef, OutputSlot};
use crate::pipeline::message::PipeMessage;
use std::sync::Arc;

/// Writes every message straight to its output.
#[derive(Debug, Default)]
pub struct Pipe {
    output: OutputSlot,
}

impl Pipe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipe already connected to `output`.
    pub fn with_output(output: FittingRef) -> Self {
        let pipe = Self::new();
        // A fresh slot is empty, so this cannot conflict.
        let _ = pipe.output.connect(output);
        pipe
    }

    /// Convenience for the common `Arc<dyn Fitting>` case.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn is_connected(&self) -> bool {
        self.output.is_connected()
    }
}

impl Fitting for Pipe {
    fn connect(&self, output: FittingRef) -> PipelineResult<()> {
        self.output.connect(output)?;
        tracing::debug!("Pipe connected");
        Ok(())
    }

    fn disconnect(&self) -> Option<FittingRef> {
        self.output.disconnect()
    }

    fn write(&self, message: PipeMessage) -> PipelineResult<()> {
        tracing::trace!(message_type = %message.message_type(), "Pipe write");
        self.output.write(message)
    }
}

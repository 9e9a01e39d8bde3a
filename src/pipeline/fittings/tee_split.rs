//! TeeSplit: Fan-out to any number of outputs.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::fitting::{same_fitting, Fitting, FittingRef};
use crate::pipeline::message::PipeMessage;
use std::sync::{PoisonError, RwLock};

/// Writes each message to every connected output, in connection order.
#[derive(Default)]
pub struct TeeSplit {
    outputs: RwLock<Vec<FittingRef>>,
}

impl TeeSplit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outputs(outputs: impl IntoIterator<Item = FittingRef>) -> Self {
        Self {
            outputs: RwLock::new(outputs.into_iter().collect()),
        }
    }

    pub fn output_count(&self) -> usize {
        self.outputs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Remove `target` from the outputs, keeping the order of the rest.
    pub fn disconnect_fitting(&self, target: &FittingRef) -> Option<FittingRef> {
        let mut outputs = self.outputs.write().unwrap_or_else(PoisonError::into_inner);
        let index = outputs.iter().position(|o| same_fitting(o, target))?;
        tracing::debug!(index, "TeeSplit output removed");
        Some(outputs.remove(index))
    }
}

impl Fitting for TeeSplit {
    /// Always succeeds; outputs accumulate.
    fn connect(&self, output: FittingRef) -> PipelineResult<()> {
        self.outputs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(output);
        Ok(())
    }

    /// Detach the most recently connected output.
    fn disconnect(&self) -> Option<FittingRef> {
        self.outputs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
    }

    /// Deliver to every output. Fails if any output failed, but never skips one.
    /// With no outputs there is nothing to fail, so the write succeeds.
    fn write(&self, message: PipeMessage) -> PipelineResult<()> {
        let outputs = self
            .outputs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if outputs.is_empty() {
            tracing::trace!("TeeSplit write with no outputs");
            return Ok(());
        }

        let attempted = outputs.len();
        let failed = outputs
            .iter()
            .filter(|output| output.write(message.clone()).is_err())
            .count();

        if failed > 0 {
            tracing::warn!(failed, attempted, "TeeSplit delivery incomplete");
            return Err(PipelineError::Delivery { failed, attempted });
        }
        Ok(())
    }
}

impl std::fmt::Debug for TeeSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeeSplit")
            .field("outputs", &self.output_count())
            .finish()
    }
}

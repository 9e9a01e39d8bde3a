//! The fitting contract every pipeline node implements.
//!
//! Fittings form a one-way, synchronous call graph: `write` on a fitting
//! runs on the caller's thread and returns once every reachable fitting has
//! handled the message. A fitting owns its output reference(s) and never
//! knows who writes into it.
//!
//! Nothing checks for cycles at connect time. Connecting a fitting back into
//! its own upstream makes `write` recurse without bound; building an acyclic
//! graph is the caller's job.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::message::PipeMessage;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to any fitting.
pub type FittingRef = Arc<dyn Fitting>;

/// A node in a pipeline.
#[cfg_attr(test, mockall::automock)]
pub trait Fitting: Send + Sync {
    /// Attach `output` downstream of this fitting.
    ///
    /// Single-output fittings fail with [`PipelineError::AlreadyConnected`]
    /// while an output is attached.
    fn connect(&self, output: FittingRef) -> PipelineResult<()>;

    /// Detach and return the output, if one is connected.
    fn disconnect(&self) -> Option<FittingRef>;

    /// Handle a message, forwarding it downstream as the fitting sees fit.
    fn write(&self, message: PipeMessage) -> PipelineResult<()>;
}

/// Whether two handles point at the same fitting.
pub fn same_fitting(a: &FittingRef, b: &FittingRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Single output slot shared by every one-successor fitting.
///
/// The lock is only held long enough to clone the handle; the downstream
/// `write` runs unlocked so fittings stay re-entrant.
#[derive(Default)]
pub struct OutputSlot {
    output: RwLock<Option<FittingRef>>,
}

impl OutputSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, output: FittingRef) -> PipelineResult<()> {
        let mut slot = self.output.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(PipelineError::AlreadyConnected);
        }
        *slot = Some(output);
        Ok(())
    }

    pub fn disconnect(&self) -> Option<FittingRef> {
        self.output
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn get(&self) -> Option<FittingRef> {
        self.output
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_connected(&self) -> bool {
        self.output
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Forward `message` to the output, or fail if nothing is connected.
    pub fn write(&self, message: PipeMessage) -> PipelineResult<()> {
        match self.get() {
            Some(output) => output.write(message),
            None => Err(PipelineError::NotConnected),
        }
    }
}

impl std::fmt::Debug for OutputSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSlot")
            .field("connected", &self.is_connected())
            .finish()
    }
}

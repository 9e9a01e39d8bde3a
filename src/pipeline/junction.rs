//! Junction: A module's registry of named input and output pipes.
//!
//! Modules publish and subscribe through a junction instead of holding raw
//! fitting references. Pipe names are unique across both directions.
//!
//! The registry sits behind a readers-writer lock: lookups run concurrently,
//! registration and removal are exclusive. Fittings are cloned out of the map
//! before any message is written, so a write never runs under the lock.

use crate::pipeline::direction::PipeDirection;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::fitting::FittingRef;
use crate::pipeline::fittings::PipeListener;
use crate::pipeline::message::PipeMessage;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A pipe held by a junction.
#[derive(Clone)]
pub struct RegisteredPipe {
    pub fitting: FittingRef,
    pub direction: PipeDirection,
}

#[derive(Default)]
pub struct Junction {
    pipes: RwLock<HashMap<String, RegisteredPipe>>,
}

impl Junction {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, RegisteredPipe>> {
        self.pipes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, RegisteredPipe>> {
        self.pipes.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `fitting` under `name`. Fails if the name is taken in either direction.
    pub fn register_pipe(
        &self,
        name: impl Into<String>,
        direction: PipeDirection,
        fitting: FittingRef,
    ) -> PipelineResult<()> {
        let name = name.into();
        let mut pipes = self.write();
        if pipes.contains_key(&name) {
            tracing::debug!(pipe = %name, "Pipe name already registered");
            return Err(PipelineError::NameTaken(name));
        }
        tracing::debug!(pipe = %name, %direction, "Pipe registered");
        pipes.insert(name, RegisteredPipe { fitting, direction });
        Ok(())
    }

    /// Register with a textual direction (`"input"` / `"output"`).
    pub fn register_pipe_str(
        &self,
        name: impl Into<String>,
        direction: &str,
        fitting: FittingRef,
    ) -> PipelineResult<()> {
        let direction = direction.parse::<PipeDirection>()?;
        self.register_pipe(name, direction, fitting)
    }

    pub fn has_pipe(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn has_input_pipe(&self, name: &str) -> bool {
        self.pipe_direction(name) == Some(PipeDirection::Input)
    }

    pub fn has_output_pipe(&self, name: &str) -> bool {
        self.pipe_direction(name) == Some(PipeDirection::Output)
    }

    pub fn pipe_direction(&self, name: &str) -> Option<PipeDirection> {
        self.read().get(name).map(|p| p.direction)
    }

    /// Remove a pipe and free its name. Returns the fitting if it was registered.
    pub fn remove_pipe(&self, name: &str) -> Option<FittingRef> {
        let removed = self.write().remove(name)?;
        tracing::debug!(pipe = %name, "Pipe removed");
        Some(removed.fitting)
    }

    pub fn retrieve_pipe(&self, name: &str) -> Option<FittingRef> {
        self.read().get(name).map(|p| p.fitting.clone())
    }

    fn pipe_in_direction(&self, name: &str, direction: PipeDirection) -> Option<FittingRef> {
        self.read()
            .get(name)
            .filter(|p| p.direction == direction)
            .map(|p| p.fitting.clone())
    }

    /// Attach `listener` to the output of the named input pipe.
    ///
    /// A pipe has one output slot, so only the first listener on a plain pipe
    /// succeeds.
    pub fn add_pipe_listener(&self, input_name: &str, listener: PipeListener) -> PipelineResult<()> {
        let pipe = self
            .pipe_in_direction(input_name, PipeDirection::Input)
            .ok_or_else(|| PipelineError::NotInputPipe(input_name.to_string()))?;
        pipe.connect(listener.shared())?;
        tracing::debug!(pipe = %input_name, "Listener attached");
        Ok(())
    }

    /// Shorthand for [`add_pipe_listener`](Self::add_pipe_listener) with a closure.
    pub fn add_pipe_handler<F>(&self, input_name: &str, handler: F) -> PipelineResult<()>
    where
        F: Fn(PipeMessage) + Send + Sync + 'static,
    {
        self.add_pipe_listener(input_name, PipeListener::new(handler))
    }

    /// Write `message` into the named output pipe.
    pub fn send_message(
        &self,
        output_name: &str,
        message: impl Into<PipeMessage>,
    ) -> PipelineResult<()> {
        let pipe = self
            .pipe_in_direction(output_name, PipeDirection::Output)
            .ok_or_else(|| PipelineError::NotOutputPipe(output_name.to_string()))?;
        pipe.write(message.into())
    }

    fn names(&self, direction: PipeDirection) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .iter()
            .filter(|(_, p)| p.direction == direction)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Names of all input pipes, sorted.
    pub fn input_pipe_names(&self) -> Vec<String> {
        self.names(PipeDirection::Input)
    }

    /// Names of all output pipes, sorted.
    pub fn output_pipe_names(&self) -> Vec<String> {
        self.names(PipeDirection::Output)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl std::fmt::Debug for Junction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Junction")
            .field("inputs", &self.input_pipe_names())
            .field("outputs", &self.output_pipe_names())
            .finish()
    }
}

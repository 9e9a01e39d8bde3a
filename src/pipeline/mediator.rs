//! Hosting-side glue between a module and its junction.
//!
//! A host hands a module its pipes through [`PipeAware`]. [`JunctionMediator`]
//! is the stock implementation: it registers accepted pipes on the module's
//! junction and routes everything arriving on input pipes to the module's
//! [`PipeMessageHandler`], which it holds only weakly.

use crate::pipeline::direction::PipeDirection;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::fitting::FittingRef;
use crate::pipeline::fittings::PipeListener;
use crate::pipeline::junction::Junction;
use crate::pipeline::message::PipeMessage;
use std::sync::{Arc, Weak};

/// Implemented by modules that can be plumbed together with pipes.
pub trait PipeAware {
    fn accept_input_pipe(&self, name: &str, pipe: FittingRef) -> PipelineResult<()>;
    fn accept_output_pipe(&self, name: &str, pipe: FittingRef) -> PipelineResult<()>;
}

/// Receives every message delivered to a module's input pipes.
pub trait PipeMessageHandler: Send + Sync {
    fn handle_pipe_message(&self, message: PipeMessage);
}

/// Registers pipes on a junction and forwards input to a handler.
pub struct JunctionMediator {
    junction: Arc<Junction>,
    handler: Weak<dyn PipeMessageHandler>,
}

impl JunctionMediator {
    pub fn new(junction: Arc<Junction>, handler: Weak<dyn PipeMessageHandler>) -> Self {
        Self { junction, handler }
    }

    /// Mediator for a handler the caller keeps alive.
    pub fn for_handler<H: PipeMessageHandler + 'static>(
        junction: Arc<Junction>,
        handler: &Arc<H>,
    ) -> Self {
        let handler: Arc<dyn PipeMessageHandler> = handler.clone();
        Self::new(junction, Arc::downgrade(&handler))
    }

    pub fn junction(&self) -> &Arc<Junction> {
        &self.junction
    }
}

impl PipeAware for JunctionMediator {
    fn accept_input_pipe(&self, name: &str, pipe: FittingRef) -> PipelineResult<()> {
        self.junction
            .register_pipe(name, PipeDirection::Input, pipe)?;

        let handler = self.handler.clone();
        let listener = PipeListener::new(move |message| match handler.upgrade() {
            Some(handler) => handler.handle_pipe_message(message),
            None => tracing::trace!("Pipe message handler dropped, message discarded"),
        });
        if let Err(e) = self.junction.add_pipe_listener(name, listener) {
            // Leave no input registered without its listener
            self.junction.remove_pipe(name);
            return Err(e);
        }
        Ok(())
    }

    fn accept_output_pipe(&self, name: &str, pipe: FittingRef) -> PipelineResult<()> {
        self.junction.register_pipe(name, PipeDirection::Output, pipe)
    }
}

impl std::fmt::Debug for JunctionMediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JunctionMediator")
            .field("junction", &self.junction)
            .field("handler_alive", &(self.handler.strong_count() > 0))
            .finish()
    }
}

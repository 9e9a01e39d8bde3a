//! PipeListener: Terminal fitting that hands messages to a callback.
//!
//! Lets code that is not itself a fitting be the final recipient of a
//! pipeline. A listener can never be connected onward.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::fitting::{Fitting, FittingRef};
use crate::pipeline::message::PipeMessage;
use crossbeam_channel::Sender;
use std::sync::{Arc, Weak};

type Callback = Box<dyn Fn(PipeMessage) -> PipelineResult<()> + Send + Sync>;

/// Terminal fitting wrapping an external callback.
pub struct PipeListener {
    callback: Callback,
}

impl PipeListener {
    /// Listener calling `f` for every message it is written.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(PipeMessage) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(move |message| {
                f(message);
                Ok(())
            }),
        }
    }

    /// Listener bound to a context it does not keep alive.
    ///
    /// Only a weak handle to `context` is stored. Once the owner drops the
    /// context, writes become no-ops that still report success.
    pub fn weak<T, F>(context: &Arc<T>, f: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&T, PipeMessage) + Send + Sync + 'static,
    {
        let context: Weak<T> = Arc::downgrade(context);
        Self {
            callback: Box::new(move |message| {
                match context.upgrade() {
                    Some(context) => f(&context, message),
                    None => tracing::trace!("Listener context dropped, message discarded"),
                }
                Ok(())
            }),
        }
    }

    /// Listener that forwards every message into a channel, typically read
    /// by another thread.
    pub fn channel(sender: Sender<PipeMessage>) -> Self {
        Self {
            callback: Box::new(move |message| {
                sender
                    .send(message)
                    .map_err(|_| PipelineError::ListenerClosed)
            }),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Fitting for PipeListener {
    fn connect(&self, _output: FittingRef) -> PipelineResult<()> {
        Err(PipelineError::Terminal)
    }

    fn disconnect(&self) -> Option<FittingRef> {
        None
    }

    fn write(&self, message: PipeMessage) -> PipelineResult<()> {
        (self.callback)(message)
    }
}

impl std::fmt::Debug for PipeListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PipeListener")
    }
}

//! Queue: Buffers normal messages until flushed.
//!
//! In FIFO mode messages leave in arrival order. In SORT mode every insert
//! re-sorts the buffer by ascending priority with a stable sort, so equal
//! priorities keep arrival order. Switching mode only affects later inserts.
//!
//! Queue controls carry no target name: the first queue on a pipeline
//! consumes them, so a pipeline effectively has one queue.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::fitting::{Fitting, FittingRef, OutputSlot};
use crate::pipeline::message::{Message, PipeMessage, QueueControlKind};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

/// Ordering discipline for newly stored messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    #[default]
    Fifo,
    Sort,
}

#[derive(Default)]
struct QueueState {
    mode: QueueMode,
    messages: VecDeque<Message>,
}

/// Buffering fitting drained by a FLUSH control message.
#[derive(Default)]
pub struct Queue {
    state: RwLock<QueueState>,
    output: OutputSlot,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(self, mode: QueueMode) -> Self {
        self.set_mode(mode);
        self
    }

    /// Connect `output` while building. Only the first call takes effect.
    pub fn with_output(self, output: FittingRef) -> Self {
        let connected = self.output.connect(output);
        debug_assert!(connected.is_ok(), "Queue output already set");
        self
    }

    pub fn mode(&self) -> QueueMode {
        self.state.read().unwrap_or_else(PoisonError::into_inner).mode
    }

    pub fn set_mode(&self, mode: QueueMode) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).mode = mode;
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .messages
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store(&self, message: Message) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.messages.push_back(message);
        if state.mode == QueueMode::Sort {
            // Stable: equal priorities keep arrival order.
            state
                .messages
                .make_contiguous()
                .sort_by_key(Message::priority);
        }
    }

    /// Take the whole buffer in one critical section.
    fn drain(&self) -> VecDeque<Message> {
        std::mem::take(
            &mut self
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .messages,
        )
    }

    /// Write every buffered message to the output, front first.
    ///
    /// The buffer is emptied atomically before the first write and the lock
    /// is not held while writing. A flush started during delivery (from
    /// another thread or from downstream) only sees messages stored after
    /// this one began. Every message is attempted even if some writes fail.
    pub fn flush(&self) -> PipelineResult<()> {
        let drained = self.drain();
        let attempted = drained.len();
        let mut failed = 0;

        for message in drained {
            if let Err(e) = self.output.write(PipeMessage::Normal(message)) {
                tracing::warn!("Queue flush write failed: {}", e);
                failed += 1;
            }
        }

        tracing::debug!(attempted, failed, "Queue flushed");
        if failed > 0 {
            return Err(PipelineError::Delivery { failed, attempted });
        }
        Ok(())
    }
}

impl Fitting for Queue {
    fn connect(&self, output: FittingRef) -> PipelineResult<()> {
        self.output.connect(output)?;
        tracing::debug!("Queue connected");
        Ok(())
    }

    fn disconnect(&self) -> Option<FittingRef> {
        self.output.disconnect()
    }

    fn write(&self, message: PipeMessage) -> PipelineResult<()> {
        match message {
            PipeMessage::Normal(message) => {
                self.store(message);
                Ok(())
            }
            PipeMessage::QueueControl(control) => match control.kind {
                QueueControlKind::Flush => self.flush(),
                QueueControlKind::Sort => {
                    self.set_mode(QueueMode::Sort);
                    Ok(())
                }
                QueueControlKind::Fifo => {
                    self.set_mode(QueueMode::Fifo);
                    Ok(())
                }
            },
            other => {
                tracing::warn!(message_type = %other.message_type(), "Queue ignored message");
                Err(PipelineError::UnsupportedMessage {
                    fitting: "Queue",
                    message_type: other.message_type().to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("mode", &self.mode())
            .field("len", &self.len())
            .field("output", &self.output)
            .finish()
    }
}

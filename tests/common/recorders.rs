//! Listeners that remember what they were written

use crossbeam_channel::{unbounded, Receiver};
use pipeworks::pipeline::{Fitting, Message, PipeListener, PipeMessage};
use std::sync::{Arc, Mutex};

/// Shared log of delivered messages
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<PipeMessage>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener appending to this recorder
    pub fn listener(&self) -> PipeListener {
        let seen = self.seen.clone();
        PipeListener::new(move |m| seen.lock().unwrap().push(m))
    }

    pub fn shared_listener(&self) -> Arc<dyn Fitting> {
        self.listener().shared()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn messages(&self) -> Vec<PipeMessage> {
        self.seen.lock().unwrap().clone()
    }

    /// Normal messages only, in delivery order
    pub fn normal(&self) -> Vec<Message> {
        self.messages()
            .iter()
            .filter_map(|m| m.as_message().cloned())
            .collect()
    }

    pub fn priorities(&self) -> Vec<i32> {
        self.normal().iter().map(|m| m.priority()).collect()
    }
}

/// A channel listener plus the receiving end
pub fn channel_listener() -> (PipeListener, Receiver<PipeMessage>) {
    let (tx, rx) = unbounded();
    (PipeListener::channel(tx), rx)
}

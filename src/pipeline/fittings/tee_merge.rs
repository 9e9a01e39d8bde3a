//! TeeMerge: Fan-in from any number of upstream fittings.
//!
//! A merge is just a single-output pipe that several upstream fittings have
//! connected to. `connect_input` asks the upstream fitting to connect its
//! output to this merge; the merge itself keeps no record of its inputs.

use crate::pipeline::error::PipelineResult;
use crate::pipeline::fitting::{Fitting, FittingRef, OutputSlot};
use crate::pipeline::message::PipeMessage;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct TeeMerge {
    output: OutputSlot,
}

impl TeeMerge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a merge and connect each of `inputs` to it.
    ///
    /// Fails on the first input whose output is already taken; inputs before
    /// it stay connected.
    pub fn with_inputs<'a>(
        inputs: impl IntoIterator<Item = &'a dyn Fitting>,
    ) -> PipelineResult<Arc<Self>> {
        let merge = Self::new();
        for input in inputs {
            merge.connect_input(input)?;
        }
        Ok(merge)
    }

    /// Connect `input`'s output to this merge.
    pub fn connect_input(self: &Arc<Self>, input: &dyn Fitting) -> PipelineResult<()> {
        input.connect(self.clone())?;
        tracing::debug!("TeeMerge input connected");
        Ok(())
    }
}

impl Fitting for TeeMerge {
    fn connect(&self, output: FittingRef) -> PipelineResult<()> {
        self.output.connect(output)
    }

    fn disconnect(&self) -> Option<FittingRef> {
        self.output.disconnect()
    }

    fn write(&self, message: PipeMessage) -> PipelineResult<()> {
        self.output.write(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error::PipelineError;
    use crate::pipeline::fittings::{Pipe, PipeListener};
    use crate::pipeline::message::Message;
    use std::sync::Mutex;

    #[test]
    fn test_merges_many_inputs() {
        let pipe1 = Pipe::new();
        let pipe2 = Pipe::new();
        let pipe3 = Pipe::new();

        let merge = TeeMerge::with_inputs([&pipe1 as &dyn Fitting, &pipe2]).unwrap();
        merge.connect_input(&pipe3).unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        merge
            .connect(PipeListener::new(move |m| sink.lock().unwrap().push(m)).shared())
            .unwrap();

        let messages: Vec<Message> = (0..3).map(|_| Message::new()).collect();
        for (pipe, message) in [&pipe1, &pipe2, &pipe3].into_iter().zip(&messages) {
            pipe.write(message.clone().into()).unwrap();
        }

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 3);
        for (got, sent) in received.iter().zip(&messages) {
            assert!(got.as_message().unwrap().ptr_eq(sent));
        }
    }

    #[test]
    fn test_input_already_connected_elsewhere() {
        let pipe = Pipe::new();
        pipe.connect(Pipe::shared()).unwrap();

        let merge = TeeMerge::new();
        assert_eq!(
            merge.connect_input(&pipe),
            Err(PipelineError::AlreadyConnected)
        );
    }
}

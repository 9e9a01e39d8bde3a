//! PipeChain: Several fittings presented as one.
//!
//! Writes enter the head; connect and disconnect act on the tail. Lets a
//! junction register a whole filter/queue chain under one name and still
//! attach a listener to the end of it.

use crate::pipeline::error::PipelineResult;
use crate::pipeline::fitting::{Fitting, FittingRef};
use crate::pipeline::message::PipeMessage;

pub struct PipeChain {
    head: FittingRef,
    tail: FittingRef,
    len: usize,
}

impl PipeChain {
    /// Connect `fittings` head to tail. Returns `None` for an empty list.
    pub fn link(fittings: Vec<FittingRef>) -> PipelineResult<Option<Self>> {
        let len = fittings.len();
        for pair in fittings.windows(2) {
            pair[0].connect(pair[1].clone())?;
        }
        let (Some(head), Some(tail)) = (fittings.first(), fittings.last()) else {
            return Ok(None);
        };
        Ok(Some(Self {
            head: head.clone(),
            tail: tail.clone(),
            len,
        }))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Fitting for PipeChain {
    fn connect(&self, output: FittingRef) -> PipelineResult<()> {
        self.tail.connect(output)
    }

    fn disconnect(&self) -> Option<FittingRef> {
        self.tail.disconnect()
    }

    fn write(&self, message: PipeMessage) -> PipelineResult<()> {
        self.head.write(message)
    }
}

impl std::fmt::Debug for PipeChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeChain").field("len", &self.len).finish()
    }
}

//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod recorders;

use pipeworks::pipeline::{PipeMessage, PRIORITY_MED};

/// Priority of a normal message, or `None` for control messages
pub fn priority_of(message: &PipeMessage) -> Option<i32> {
    message.as_message().map(|m| m.priority())
}

/// Priority used when a builder is not told otherwise
pub const DEFAULT_PRIORITY: i32 = PRIORITY_MED;

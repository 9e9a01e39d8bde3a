//! # Pipeworks: in-process message pipelines
//!
//! Modules of an application exchange [`Message`](pipeline::Message)s through
//! plumbing assembled from small fittings instead of calling each other
//! directly.
//!
//! ## Architecture
//!
//! - **Fittings**: [`Pipe`](pipeline::Pipe), [`Filter`](pipeline::Filter),
//!   [`Queue`](pipeline::Queue), [`TeeSplit`](pipeline::TeeSplit),
//!   [`TeeMerge`](pipeline::TeeMerge) and the terminal
//!   [`PipeListener`](pipeline::PipeListener), all behind the
//!   [`Fitting`](pipeline::Fitting) trait
//! - **Control messages**: filters and queues are reconfigured in-band by
//!   messages travelling down the same pipe as normal traffic
//! - **Junctions**: a per-module registry of named input and output pipes
//! - **Scripting**: Rhai scripts as filter functions
//! - **Configuration**: TOML files describing pipes, their fittings and the
//!   modules they connect
//!
//! Delivery is synchronous: a `write` runs every downstream fitting on the
//! caller's thread and reports the outcome back to it.
//!
//! ## Example
//!
//! ```
//! use pipeworks::pipeline::{Filter, Junction, Message, PipeDirection, filter_fn};
//! use std::sync::Arc;
//!
//! let filter = Arc::new(Filter::new("evens").with_filter(filter_fn(|m, _| {
//!     Ok(m.priority() % 2 == 0)
//! })));
//!
//! let shell = Junction::new();
//! let logger = Junction::new();
//! shell.register_pipe("out", PipeDirection::Output, filter.clone()).unwrap();
//! logger.register_pipe("out", PipeDirection::Input, filter).unwrap();
//! logger.add_pipe_handler("out", |m| println!("{:?}", m)).unwrap();
//!
//! assert!(shell.send_message("out", Message::new().with_priority(2)).is_ok());
//! assert!(shell.send_message("out", Message::new().with_priority(3)).is_err());
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod scripting;

// Re-export commonly used types
pub use config::PipeworksConfig;
pub use error::{PipeworksError, Result};
pub use pipeline::{
    Fitting, FittingRef, Junction, Message, PipeDirection, PipeMessage, PipelineBuilder,
    PipelineError, PipelineResult,
};
pub use scripting::{ScriptEngine, ScriptFilter};

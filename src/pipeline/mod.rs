//! Synchronous message pipelines.
//!
//! Messages flow from a producer through a chain of fittings to one or more
//! terminal listeners, entirely on the caller's thread:
//!
//! ```text
//!              ┌──► [Filter "scale"] ──► [Queue] ──► [Listener]
//! write ──► [TeeSplit]
//!              └──► [Listener]
//! ```
//!
//! # Design
//!
//! - **One contract**: Every node implements [`Fitting`] (`connect`,
//!   `disconnect`, `write`) and is shared as `Arc<dyn Fitting>`.
//! - **Tagged messages**: [`PipeMessage`] separates normal data from filter
//!   and queue control, so dispatch is a `match`, never a cast.
//! - **No locks across writes**: Fittings snapshot their state, release the
//!   lock, then call downstream.
//! - **Junctions**: Modules publish and subscribe to named pipes through a
//!   [`Junction`] rather than holding fittings directly.

pub mod builder;
pub mod direction;
pub mod error;
pub mod fitting;
pub mod fittings;
pub mod junction;
pub mod mediator;
pub mod message;

pub use builder::{BuiltPipelines, PipelineBuilder};
pub use direction::PipeDirection;
pub use error::{PipelineError, PipelineResult};
pub use fitting::{same_fitting, Fitting, FittingRef, OutputSlot};
pub use fittings::{
    Filter, FilterMode, Pipe, PipeChain, PipeListener, Queue, QueueMode, TeeMerge, TeeSplit,
};
pub use junction::{Junction, RegisteredPipe};
pub use mediator::{JunctionMediator, PipeAware, PipeMessageHandler};
pub use message::{
    filter_fn, Envelope, FilterControl, FilterControlKind, FilterFn, Message, MessageType,
    PipeMessage, QueueControl, QueueControlKind, MESSAGE_BASE, PRIORITY_HIGH, PRIORITY_LOW,
    PRIORITY_MED,
};

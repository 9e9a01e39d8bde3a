//! Built-in fittings.

pub mod chain;
pub mod filter;
pub mod listener;
pub mod pipe;
pub mod queue;
pub mod tee_merge;
pub mod tee_split;

pub use chain::PipeChain;
pub use filter::{Filter, FilterMode};
pub use listener::PipeListener;
pub use pipe::Pipe;
pub use queue::{Queue, QueueMode};
pub use tee_merge::TeeMerge;
pub use tee_split::TeeSplit;

pub mod bridge;
pub mod error;
pub mod merge;
pub mod metrics;
pub mod scheduler;
pub mod sequence;
pub mod sink;

pub mod prelude {
    pub use crate::bridge::{
        BridgeStrategy, CompletionHandle, HandleState, Resume, Started, bridge, bridge_with,
    };
    pub use crate::error::{Cause, HandleError, MergeError};
    pub use crate::merge::{Merged, merge};
    pub use crate::scheduler::Scheduler;
    pub use crate::sequence::{AsyncSequence, BoxSequence, IterSequence};
    pub use crate::sink::{ItemSink, drive};
}

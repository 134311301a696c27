//! The simulation job pipeline: completion bookkeeping shared by the worker
//! and the Completion Gateway, and the single-consumer worker loop.

pub mod completion;
pub mod error;
pub mod worker;

pub use completion::{finalize, CompletionOutcome};
pub use error::PipelineError;
pub use worker::{JobOutcome, WorkerLoop};

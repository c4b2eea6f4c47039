//! Chunked parallel execution engine
//!
//! This module contains staging-file management, the chunker, the
//! bounded worker pool, the order-preserving combiner and the run
//! coordinator that ties them together.

mod chunker;
mod combine;
mod error;
pub mod io;
mod pool;
mod run;
mod staging;
mod transform;

pub use chunker::{Chunk, Chunker};
pub use combine::combine;
pub use error::{
    AggregateError, LiftError, Result, StagingError, TransformError, TransformResult,
};
pub use io::{
    create_output, detect_compression, open_input, CompressionFormat, LineIterator,
    OutputSink, DEFAULT_BUFFER_SIZE,
};
pub use pool::{Job, JobIntake, WorkerPool, JOB_QUEUE_FACTOR};
pub use run::{RunConfig, RunCoordinator, RunPhase, RunSummary, DEFAULT_CHUNK_SIZE};
pub use staging::{StagedFile, StagingDir};
pub use transform::{Passthrough, Transform};

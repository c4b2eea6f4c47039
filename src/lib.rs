//! liftconcat - chunked parallel liftOver driver
//!
//! Lifts genomic coordinates between assemblies by running UCSC `liftOver`
//! over the input, handling line-name suffixed chromosome names and
//! tab-delimited tables along the way.
//!
//! # Features
//!
//! - Splits large inputs into chunks and lifts them on a bounded worker pool
//! - Output order always matches input order, whatever order chunks finish in
//! - Per-chunk failures are collected and reported once at the end
//! - Transparent gzip/bzip2 input and gzip output
//!
//! # Example
//!
//! ```ignore
//! use liftconcat::core::{RunConfig, RunCoordinator, StagingDir, open_input};
//! use liftconcat::formats::{BedLiftover, LiftOverCommand};
//!
//! let config = RunConfig::default().with_workers(8).with_chunk_size(100_000);
//! let transform = BedLiftover::new(
//!     LiftOverCommand::new("dm3ToDm6.over.chain"),
//!     "iso1",
//!     StagingDir::new(&config.staging_dir),
//! );
//!
//! let mut out = std::io::stdout().lock();
//! RunCoordinator::new(config, &transform)
//!     .run(open_input("peaks.bed.gz")?, &mut out, "unmapped.txt".as_ref())?;
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use core::{
    AggregateError, LiftError, RunConfig, RunCoordinator, RunSummary, StagingDir, Transform,
    TransformError,
};
pub use formats::{BedLiftover, LiftOverCommand, TabColumns, TabDelLiftover};

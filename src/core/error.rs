//! Error types for liftconcat
//!
//! Defines all error types used throughout the library.

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use thiserror::Error;

/// Main error type for a chunked liftover run
#[derive(Debug, Error)]
pub enum LiftError {
    /// Staging file allocation failed (fatal)
    #[error("Resource creation error: {0}")]
    ResourceCreation(#[from] StagingError),

    /// Writing a chunk into its staging file failed (fatal)
    #[error("Failed to write staging file {path:?}: {source}")]
    StagingWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The overall input stream could not be read (fatal)
    #[error("Failed to read input stream: {0}")]
    SourceRead(#[source] std::io::Error),

    /// One chunk's transform failed (recorded, non-fatal to other chunks)
    #[error("Chunk {chunk} transform failed: {source}")]
    ChunkTransform {
        chunk: usize,
        #[source]
        source: TransformError,
    },

    /// Recombination of a staged resource failed
    #[error("Failed to combine {path:?}: {source}")]
    Combine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every worker exited before the intake was closed
    #[error("Worker pool closed before all chunks were dispatched")]
    PoolClosed,

    /// Worker pool could not be started
    #[error("Failed to build worker pool: {0}")]
    PoolBuild(String),

    /// All non-fatal errors of a run, reported once at the end
    #[error("{0}")]
    Aggregate(AggregateError),
}

impl LiftError {
    /// Fatal errors abort the run; everything else is collected
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LiftError::ResourceCreation(_)
                | LiftError::StagingWrite { .. }
                | LiftError::SourceRead(_)
                | LiftError::PoolClosed
                | LiftError::PoolBuild(_)
        )
    }

    /// Chunk index for chunk-scoped errors
    pub fn chunk(&self) -> Option<usize> {
        match self {
            LiftError::ChunkTransform { chunk, .. } => Some(*chunk),
            _ => None,
        }
    }
}

/// Staging file could not be created
#[derive(Debug, Error)]
#[error("Cannot create staging file '{pattern}' in {dir:?}: {source}")]
pub struct StagingError {
    pub dir: PathBuf,
    pub pattern: String,
    #[source]
    pub source: std::io::Error,
}

/// Errors raised by a [`Transform`](crate::core::Transform) implementation
#[derive(Debug, Error)]
pub enum TransformError {
    /// External program could not be launched
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External program exited unsuccessfully
    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },

    /// Malformed input record
    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    /// Staging file allocation inside the transform failed
    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered collection of every non-fatal failure of a run
///
/// Order is arrival order, not chunk order.
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<LiftError>,
}

impl AggregateError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one error
    pub fn push(&mut self, error: LiftError) {
        self.errors.push(error);
    }

    /// Drain a result channel until every sender is gone, keeping only errors
    pub fn collect(&mut self, results: Receiver<Option<LiftError>>) {
        for error in results.into_iter().flatten() {
            log::debug!("Collected error: {}", error);
            self.errors.push(error);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[LiftError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LiftError> {
        self.errors
    }

    /// Chunk indices whose transform failed, ascending
    pub fn failed_chunks(&self) -> Vec<usize> {
        let mut chunks: Vec<usize> = self.errors.iter().filter_map(LiftError::chunk).collect();
        chunks.sort_unstable();
        chunks.dedup();
        chunks
    }

    /// `Ok(())` when nothing failed, otherwise the aggregate as one error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(LiftError::Aggregate(self))
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) during run", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n  [{}] {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Result type alias for liftconcat operations
pub type Result<T> = std::result::Result<T, LiftError>;

/// Result type alias for transform operations
pub type TransformResult<T> = std::result::Result<T, TransformError>;

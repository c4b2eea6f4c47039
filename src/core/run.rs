//! Run coordination
//!
//! Ties chunking, the worker pool and recombination together into one
//! run with a single success or failure outcome.
//!
//! ```text
//! Idle -> Chunking -> Dispatching -> Draining -> Combining -> Done
//! ```
//!
//! Small or single-threaded runs skip the pool: the whole input is staged
//! once and transformed straight into the final sink.

use crate::core::chunker::{Chunk, Chunker};
use crate::core::combine::combine;
use crate::core::error::{AggregateError, LiftError, Result};
use crate::core::io::SMALL_BUFFER_SIZE;
use crate::core::pool::WorkerPool;
use crate::core::staging::StagingDir;
use crate::core::transform::Transform;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Default records per chunk for the CLI
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// Explicit run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Concurrent transform workers; below 2 runs sequentially
    pub workers: usize,
    /// Records per chunk; 0 keeps the whole input in one chunk
    pub chunk_size: usize,
    /// Directory for all staging files
    pub staging_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            chunk_size: 0,
            staging_dir: PathBuf::from("."),
        }
    }
}

impl RunConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_staging_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.staging_dir = dir.into();
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.workers >= 2 && self.chunk_size >= 1
    }
}

/// Lifecycle phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Chunking,
    Dispatching,
    Draining,
    Combining,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Chunking => "chunking",
            RunPhase::Dispatching => "dispatching",
            RunPhase::Draining => "draining",
            RunPhase::Combining => "combining",
            RunPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Statistics of a successful run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub chunks: usize,
    pub records: usize,
    pub parallel: bool,
}

/// Drives one chunked transform run
pub struct RunCoordinator<'t, T: Transform + ?Sized> {
    config: RunConfig,
    transform: &'t T,
    phase: RunPhase,
}

impl<'t, T: Transform + ?Sized> RunCoordinator<'t, T> {
    pub fn new(config: RunConfig, transform: &'t T) -> Self {
        Self {
            config,
            transform,
            phase: RunPhase::Idle,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn enter(&mut self, phase: RunPhase) {
        log::debug!("Run phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Transform `input` into `output` and the file at `unmapped`
    ///
    /// Staging files never outlive this call, whatever the outcome.
    pub fn run<R: BufRead>(
        &mut self,
        input: R,
        output: &mut dyn Write,
        unmapped: &Path,
    ) -> Result<RunSummary> {
        let start = Instant::now();
        self.enter(RunPhase::Chunking);
        let staging = StagingDir::new(&self.config.staging_dir);

        let result = if self.config.is_parallel() {
            self.run_parallel(input, output, unmapped, &staging)
        } else {
            self.run_sequential(input, output, unmapped, &staging)
        };

        self.enter(RunPhase::Done);
        match &result {
            Ok(summary) => log::info!(
                "Run finished: {} record(s) in {} chunk(s) in {:.2}s",
                summary.records,
                summary.chunks,
                start.elapsed().as_secs_f64()
            ),
            Err(e) => log::info!("Run failed after {:.2}s: {}", start.elapsed().as_secs_f64(), e),
        }
        result
    }

    fn run_sequential<R: BufRead>(
        &mut self,
        input: R,
        output: &mut dyn Write,
        unmapped: &Path,
        staging: &StagingDir,
    ) -> Result<RunSummary> {
        log::info!("Running sequentially");
        let chunk = Chunker::new(input, 0, staging).next().transpose()?;

        let Some(mut chunk) = chunk else {
            create_unmapped(unmapped)?;
            return Ok(RunSummary::default());
        };

        self.enter(RunPhase::Dispatching);
        self.transform
            .transform(chunk.input(), output, unmapped)
            .map_err(|source| LiftError::ChunkTransform { chunk: 0, source })?;
        output.flush().map_err(|source| LiftError::Combine {
            path: PathBuf::from("<output>"),
            source,
        })?;
        chunk.release();

        Ok(RunSummary {
            chunks: 1,
            records: chunk.records,
            parallel: false,
        })
    }

    fn run_parallel<R: BufRead>(
        &mut self,
        input: R,
        output: &mut dyn Write,
        unmapped: &Path,
        staging: &StagingDir,
    ) -> Result<RunSummary> {
        let pool = WorkerPool::new(self.config.workers)?;
        log::info!(
            "Running with {} workers, {} records per chunk",
            pool.workers(),
            self.config.chunk_size
        );

        // Creation order; dropping this releases every staging file.
        let mut chunks: Vec<Chunk> = Vec::new();
        let chunker = Chunker::new(input, self.config.chunk_size, staging);
        self.enter(RunPhase::Dispatching);

        let (dispatched, mut errors) = pool.execute(self.transform, |intake| -> Result<()> {
            for chunk in chunker {
                let chunk = chunk?;
                let job = chunk.job();
                chunks.push(chunk);
                intake.submit(job)?;
            }
            Ok(())
        });
        // execute only returns once the pool has drained
        self.enter(RunPhase::Draining);

        if let Err(fatal) = dispatched {
            for e in errors.errors() {
                log::warn!("Discarded after setup failure: {}", e);
            }
            return Err(fatal);
        }

        self.enter(RunPhase::Combining);
        let failed: HashSet<usize> = errors.failed_chunks().into_iter().collect();
        if !failed.is_empty() {
            log::warn!(
                "{} of {} chunk(s) failed; combining the rest",
                failed.len(),
                chunks.len()
            );
        }
        let succeeded: Vec<&Chunk> = chunks.iter().filter(|c| !failed.contains(&c.index)).collect();

        combine_into(succeeded.iter().map(|c| c.output()), output, &mut errors);
        match File::create(unmapped) {
            Ok(file) => {
                let mut sink = BufWriter::with_capacity(SMALL_BUFFER_SIZE, file);
                combine_into(succeeded.iter().map(|c| c.unmapped()), &mut sink, &mut errors);
            }
            Err(source) => errors.push(LiftError::Combine {
                path: unmapped.to_path_buf(),
                source,
            }),
        }

        let summary = RunSummary {
            chunks: chunks.len(),
            records: chunks.iter().map(|c| c.records).sum(),
            parallel: true,
        };

        for chunk in &mut chunks {
            chunk.release();
        }

        errors.into_result().map(|()| summary)
    }
}

fn combine_into<'a, I>(paths: I, sink: &mut dyn Write, errors: &mut AggregateError)
where
    I: IntoIterator<Item = &'a Path>,
{
    let result = combine(paths, sink).and_then(|_| {
        sink.flush().map_err(|source| LiftError::Combine {
            path: PathBuf::from("<output>"),
            source,
        })
    });
    if let Err(e) = result {
        errors.push(e);
    }
}

fn create_unmapped(path: &Path) -> Result<()> {
    File::create(path)
        .map(drop)
        .map_err(|source| LiftError::Combine {
            path: path.to_path_buf(),
            source,
        })
}

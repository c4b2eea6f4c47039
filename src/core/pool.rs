//! Bounded worker pool
//!
//! A fixed number of workers pull chunk jobs from a bounded intake and run
//! the [`Transform`] on each. Results go to an error collector running
//! beside them on an unbounded channel, so a worker never waits on error
//! reporting. One failed job never stops the others.

use crate::core::error::{AggregateError, LiftError, Result, TransformError};
use crate::core::io::DEFAULT_BUFFER_SIZE;
use crate::core::transform::Transform;
use rayon::ThreadPool;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::Mutex;

/// Outstanding jobs allowed per worker before the producer blocks
pub const JOB_QUEUE_FACTOR: usize = 8;

/// One chunk's work item
#[derive(Debug, Clone)]
pub struct Job {
    pub chunk: usize,
    pub input: PathBuf,
    pub output: PathBuf,
    pub unmapped: PathBuf,
}

impl Job {
    /// Run the transform with the chunk's output file as sink
    pub fn run<T: Transform + ?Sized>(&self, transform: &T) -> Result<()> {
        let chunk = self.chunk;
        let wrap = |source: TransformError| LiftError::ChunkTransform { chunk, source };

        let file = File::create(&self.output).map_err(|e| wrap(e.into()))?;
        let mut sink = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);

        transform
            .transform(&self.input, &mut sink, &self.unmapped)
            .map_err(wrap)?;
        sink.flush().map_err(|e| wrap(e.into()))?;
        Ok(())
    }
}

/// Producer side of the bounded job queue
pub struct JobIntake {
    sender: SyncSender<Job>,
}

impl JobIntake {
    /// Queue a job, blocking while the intake is full
    pub fn submit(&self, job: Job) -> Result<()> {
        log::debug!("Dispatching chunk {}", job.chunk);
        self.sender.send(job).map_err(|_| LiftError::PoolClosed)
    }
}

/// Fixed-size pool of chunk workers
pub struct WorkerPool {
    workers: usize,
    threads: ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `workers` executors (at least one)
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        // One extra thread hosts the error collector.
        let threads = rayon::ThreadPoolBuilder::new()
            .num_threads(workers + 1)
            .thread_name(|i| format!("liftconcat-worker-{}", i))
            .build()
            .map_err(|e| LiftError::PoolBuild(e.to_string()))?;
        Ok(Self { workers, threads })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Capacity of the job intake
    pub fn intake_capacity(&self) -> usize {
        JOB_QUEUE_FACTOR * self.workers
    }

    /// Run `produce` on the calling thread while the workers consume
    ///
    /// The intake closes as soon as `produce` returns. This returns only
    /// after every worker has exited and every result has been collected.
    pub fn execute<T, F, R>(&self, transform: &T, produce: F) -> (R, AggregateError)
    where
        T: Transform + ?Sized,
        F: FnOnce(&JobIntake) -> R,
    {
        let (job_tx, job_rx) = mpsc::sync_channel::<Job>(self.intake_capacity());
        let job_rx = Mutex::new(job_rx);
        let (result_tx, result_rx) = mpsc::channel::<Option<LiftError>>();
        let mut errors = AggregateError::new();

        let produced = {
            let errors = &mut errors;
            let job_rx = &job_rx;

            self.threads.in_place_scope(move |scope| {
                scope.spawn(move |_| errors.collect(result_rx));

                for worker in 0..self.workers {
                    let result_tx = result_tx.clone();
                    scope.spawn(move |_| worker_loop(worker, job_rx, transform, result_tx));
                }
                // Only worker clones keep the collector alive from here on.
                drop(result_tx);

                let intake = JobIntake { sender: job_tx };
                let produced = produce(&intake);
                drop(intake);
                log::debug!("Job intake closed");
                produced
            })
        };

        (produced, errors)
    }
}

fn next_job(jobs: &Mutex<Receiver<Job>>) -> Option<Job> {
    let receiver = match jobs.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    receiver.recv().ok()
}

fn worker_loop<T: Transform + ?Sized>(
    worker: usize,
    jobs: &Mutex<Receiver<Job>>,
    transform: &T,
    results: Sender<Option<LiftError>>,
) {
    let mut done = 0usize;
    while let Some(job) = next_job(jobs) {
        let outcome = job.run(transform).err();
        if let Some(ref e) = outcome {
            log::warn!("Worker {}: {}", worker, e);
        }
        // The collector outlives every worker, so this cannot fail in practice.
        if results.send(outcome).is_err() {
            log::warn!("Worker {}: error collector gone", worker);
        }
        done += 1;
    }
    log::debug!("Worker {} exiting after {} job(s)", worker, done);
}

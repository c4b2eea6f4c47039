//! Record stream chunking
//!
//! Splits an ordered line stream into chunks of at most `chunk_size`
//! records, each materialized into its own staging file before it is
//! handed out.

use crate::core::error::{LiftError, Result};
use crate::core::io::DEFAULT_BUFFER_SIZE;
use crate::core::pool::Job;
use crate::core::staging::{StagedFile, StagingDir};
use std::fs::OpenOptions;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

/// One contiguous run of records and its staging files
#[derive(Debug)]
pub struct Chunk {
    /// Ordinal position in the stream (0-based, scan order)
    pub index: usize,
    /// Number of records staged in `input`
    pub records: usize,
    input: StagedFile,
    output: StagedFile,
    unmapped: StagedFile,
}

impl Chunk {
    pub fn input(&self) -> &Path {
        self.input.path()
    }

    pub fn output(&self) -> &Path {
        self.output.path()
    }

    pub fn unmapped(&self) -> &Path {
        self.unmapped.path()
    }

    /// Work item for the pool; the chunk keeps ownership of the files
    pub fn job(&self) -> Job {
        Job {
            chunk: self.index,
            input: self.input().to_path_buf(),
            output: self.output().to_path_buf(),
            unmapped: self.unmapped().to_path_buf(),
        }
    }

    /// Remove all three staging files
    pub fn release(&mut self) {
        self.input.release();
        self.output.release();
        self.unmapped.release();
    }
}

/// Lazy, finite, non-restartable chunk sequence over a record stream
pub struct Chunker<'a, R: BufRead> {
    reader: R,
    chunk_size: usize,
    staging: &'a StagingDir,
    next_index: usize,
    line: Vec<u8>,
    exhausted: bool,
}

impl<'a, R: BufRead> Chunker<'a, R> {
    /// `chunk_size == 0` puts the whole stream into a single chunk
    pub fn new(reader: R, chunk_size: usize, staging: &'a StagingDir) -> Self {
        Self {
            reader,
            chunk_size,
            staging,
            next_index: 0,
            line: Vec::with_capacity(4096),
            exhausted: false,
        }
    }

    /// Read the next record into `self.line`; false at end of stream
    fn read_record(&mut self) -> Result<bool> {
        self.line.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.line)
            .map_err(LiftError::SourceRead)?;
        if n == 0 {
            return Ok(false);
        }
        if self.line.last() != Some(&b'\n') {
            self.line.push(b'\n');
        }
        Ok(true)
    }

    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        if !self.read_record()? {
            return Ok(None);
        }

        let index = self.next_index;
        self.next_index += 1;

        let input = self.staging.acquire(&format!("chunk{}_in_*.bed", index))?;
        let write_err = |source| LiftError::StagingWrite {
            path: input.path().to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(input.path())
            .map_err(write_err)?;
        let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);

        let mut records = 0;
        loop {
            writer.write_all(&self.line).map_err(write_err)?;
            records += 1;
            if self.chunk_size > 0 && records >= self.chunk_size {
                break;
            }
            if !self.read_record()? {
                break;
            }
        }

        // Fully written and closed before anyone else sees the chunk
        let file = writer
            .into_inner()
            .map_err(|e| write_err(e.into_error()))?;
        drop(file);

        let output = self.staging.acquire(&format!("chunk{}_out_*.bed", index))?;
        let unmapped = self
            .staging
            .acquire(&format!("chunk{}_unmapped_*.txt", index))?;

        log::debug!("Staged chunk {} ({} records) at {:?}", index, records, input.path());

        Ok(Some(Chunk {
            index,
            records,
            input,
            output,
            unmapped,
        }))
    }
}

impl<R: BufRead> Iterator for Chunker<'_, R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufReader, Read};
    use tempfile::TempDir;

    fn records(n: usize) -> String {
        (0..n).map(|i| format!("chr1_A\t{}\t{}\n", i, i + 1)).collect()
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_split_sizes() {
        let dir = TempDir::new().unwrap();
        let staging = StagingDir::new(dir.path());
        let input = records(10);

        let chunks: Vec<Chunk> = Chunker::new(input.as_bytes(), 3, &staging)
            .collect::<Result<_>>()
            .unwrap();

        let sizes: Vec<usize> = chunks.iter().map(|c| c.records).collect();
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert_eq!(indices, vec![0, 1, 2, 3]);

        let joined: String = chunks.iter().map(|c| read(c.input())).collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn test_zero_chunk_size_is_single_chunk() {
        let dir = TempDir::new().unwrap();
        let staging = StagingDir::new(dir.path());
        let input = records(25);

        let chunks: Vec<Chunk> = Chunker::new(input.as_bytes(), 0, &staging)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].records, 25);
        assert_eq!(read(chunks[0].input()), input);
    }

    #[test]
    fn test_empty_stream_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let staging = StagingDir::new(dir.path());

        let mut chunker = Chunker::new(&b""[..], 4, &staging);
        assert!(chunker.next().is_none());
        assert!(chunker.next().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_final_newline_is_terminated() {
        let dir = TempDir::new().unwrap();
        let staging = StagingDir::new(dir.path());

        let chunks: Vec<Chunk> = Chunker::new(&b"a\nb"[..], 5, &staging)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(read(chunks[0].input()), "a\nb\n");
    }

    #[test]
    fn test_output_and_unmapped_start_empty() {
        let dir = TempDir::new().unwrap();
        let staging = StagingDir::new(dir.path());

        let chunk = Chunker::new(&b"a\n"[..], 1, &staging).next().unwrap().unwrap();
        assert!(chunk.output().exists());
        assert!(chunk.unmapped().exists());
        assert_eq!(read(chunk.output()), "");

        let job = chunk.job();
        assert_eq!(job.chunk, 0);
        assert_eq!(job.input, chunk.input());
    }

    #[test]
    fn test_drop_releases_files() {
        let dir = TempDir::new().unwrap();
        let staging = StagingDir::new(dir.path());

        let chunks: Vec<Chunk> = Chunker::new(records(7).as_bytes(), 2, &staging)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 12);
        drop(chunks);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn test_read_error_is_source_error_and_ends_iteration() {
        let dir = TempDir::new().unwrap();
        let staging = StagingDir::new(dir.path());

        let mut chunker = Chunker::new(BufReader::new(FailingReader), 2, &staging);
        assert!(matches!(chunker.next(), Some(Err(LiftError::SourceRead(_)))));
        assert!(chunker.next().is_none());
    }

    #[test]
    fn test_staging_failure_is_resource_error() {
        let dir = TempDir::new().unwrap();
        let staging = StagingDir::new(dir.path().join("missing"));

        let mut chunker = Chunker::new(&b"a\n"[..], 1, &staging);
        assert!(matches!(
            chunker.next(),
            Some(Err(LiftError::ResourceCreation(_)))
        ));
    }
}

//! Ordered recombination of per-chunk results
//!
//! Workers finish chunks in any order; the combiner always concatenates
//! them in the order it is given, which is chunk creation order.

use crate::core::error::{LiftError, Result};
use crate::core::io::DEFAULT_BUFFER_SIZE;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

/// Concatenate `paths` in order into `sink`, returning the bytes copied
///
/// Empty files contribute nothing. A missing or unreadable file stops
/// the combination with [`LiftError::Combine`].
pub fn combine<I, P>(paths: I, sink: &mut dyn Write) -> Result<u64>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut total = 0u64;
    for path in paths {
        let path = path.as_ref();
        total += append(path, sink).map_err(|source| LiftError::Combine {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(total)
}

fn append(path: &Path, sink: &mut dyn Write) -> io::Result<u64> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        log::trace!("Skipping empty {:?}", path);
        return Ok(0);
    }
    let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
    io::copy(&mut reader, sink)
}

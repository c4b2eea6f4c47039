//! Pluggable per-chunk transform
//!
//! The engine never knows which concrete liftover runs; it only sees a
//! [`Transform`] that maps one staged input file to an output stream and
//! an unmapped-record file.

use crate::core::error::TransformResult;
use std::io::Write;
use std::path::Path;

/// One chunk's worth of work
///
/// Implementations are called concurrently from several workers with
/// disjoint paths and must not touch any resource besides the three
/// they are given.
pub trait Transform: Sync {
    fn transform(&self, input: &Path, output: &mut dyn Write, unmapped: &Path)
        -> TransformResult<()>;
}

impl<F> Transform for F
where
    F: Fn(&Path, &mut dyn Write, &Path) -> TransformResult<()> + Sync,
{
    fn transform(
        &self,
        input: &Path,
        output: &mut dyn Write,
        unmapped: &Path,
    ) -> TransformResult<()> {
        self(input, output, unmapped)
    }
}

/// Copies the input to the output unchanged and leaves `unmapped` empty
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Transform for Passthrough {
    fn transform(
        &self,
        input: &Path,
        output: &mut dyn Write,
        unmapped: &Path,
    ) -> TransformResult<()> {
        let mut file = std::fs::File::open(input)?;
        std::io::copy(&mut file, output)?;
        std::fs::File::create(unmapped)?;
        Ok(())
    }
}

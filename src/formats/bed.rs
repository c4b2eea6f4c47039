//! BED line-name liftover
//!
//! Input chromosomes carry a line-name suffix (`2L_iso1`). The suffix is
//! stripped before liftOver sees the records and restored afterwards;
//! records without the suffix are never lifted and pass through as-is.

use crate::core::io::{open_input, GzOutput, LineIterator};
use crate::core::{StagingDir, Transform, TransformResult};
use crate::formats::liftover::LiftOverCommand;
use memchr::memchr2;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

/// Strip `_<line_name>` from the chromosome field
///
/// Matches when the text before the first `_` contains no tab and is
/// followed by `line_name`. Returns `None` for records of other lines.
pub fn clean_line(line: &str, line_name: &str) -> Option<String> {
    let sep = memchr2(b'_', b'\t', line.as_bytes())?;
    if line.as_bytes()[sep] != b'_' {
        return None;
    }
    let rest = line[sep + 1..].strip_prefix(line_name)?;

    let mut cleaned = String::with_capacity(line.len());
    cleaned.push_str(&line[..sep]);
    cleaned.push_str(rest);
    Some(cleaned)
}

/// Whether a record belongs to `line_name`
pub fn matches_line_name(line: &str, line_name: &str) -> bool {
    clean_line(line, line_name).is_some()
}

/// Append `_<line_name>` to the first field
pub fn unclean_line(line: &str, line_name: &str) -> String {
    let field_end = memchr::memchr(b'\t', line.as_bytes()).unwrap_or(line.len());

    let mut restored = String::with_capacity(line.len() + line_name.len() + 1);
    restored.push_str(&line[..field_end]);
    restored.push('_');
    restored.push_str(line_name);
    restored.push_str(&line[field_end..]);
    restored
}

/// Write the cleaned form of every matching record; returns how many
pub fn clean_input<R, W>(reader: R, writer: &mut W, line_name: &str) -> io::Result<usize>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut lines = LineIterator::new(reader);
    let mut written = 0;
    while let Some(line) = lines.next_line() {
        if let Some(cleaned) = clean_line(line?, line_name) {
            writeln!(writer, "{}", cleaned)?;
            written += 1;
        }
    }
    Ok(written)
}

/// Rebuild the full record set after a lift
///
/// Records of `original` that were never lifted come first, unchanged,
/// followed by every `lifted` record with its line name restored.
pub fn unclean_bed<R1, R2, W>(
    original: R1,
    lifted: R2,
    writer: &mut W,
    line_name: &str,
) -> io::Result<()>
where
    R1: BufRead,
    R2: BufRead,
    W: Write + ?Sized,
{
    let mut lines = LineIterator::new(original);
    while let Some(line) = lines.next_line() {
        let line = line?;
        if !matches_line_name(line, line_name) {
            writeln!(writer, "{}", line)?;
        }
    }

    let mut lines = LineIterator::new(lifted);
    while let Some(line) = lines.next_line() {
        writeln!(writer, "{}", unclean_line(line?, line_name))?;
    }
    Ok(())
}

/// Lift a BED file whose chromosomes carry a line-name suffix
///
/// Output order is per input file: records of other lines first, then the
/// lifted ones. Under a chunked run each chunk is one input file, so the
/// two groups interleave chunk by chunk and mixed-line input comes out in
/// a different order than a sequential run produces. The record set is the
/// same either way.
#[derive(Debug, Clone)]
pub struct BedLiftover {
    command: LiftOverCommand,
    line_name: String,
    staging: StagingDir,
}

impl BedLiftover {
    pub fn new(
        command: LiftOverCommand,
        line_name: impl Into<String>,
        staging: StagingDir,
    ) -> Self {
        Self {
            command,
            line_name: line_name.into(),
            staging,
        }
    }

    pub fn line_name(&self) -> &str {
        &self.line_name
    }

    pub fn staging(&self) -> &StagingDir {
        &self.staging
    }
}

impl Transform for BedLiftover {
    fn transform(
        &self,
        input: &Path,
        output: &mut dyn Write,
        unmapped: &Path,
    ) -> TransformResult<()> {
        let temps = self
            .staging
            .acquire_many(&["inclean_*.bed.gz", "outclean_*.bed.gz"])?;
        let (cleaned, lifted) = (temps[0].path(), temps[1].path());

        let mut gz = GzOutput::new(BufWriter::new(File::create(cleaned)?));
        let kept = clean_input(open_input(input)?, &mut gz, &self.line_name)?;
        gz.finish()?.flush()?;
        log::debug!("{} record(s) of line '{}' in {:?}", kept, self.line_name, input);

        let mut gz = GzOutput::new(BufWriter::new(File::create(lifted)?));
        self.command.run(open_input(cleaned)?, &mut gz, unmapped)?;
        gz.finish()?.flush()?;

        unclean_bed(open_input(input)?, open_input(lifted)?, output, &self.line_name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_line_strips_suffix() {
        assert_eq!(
            clean_line("2L_iso1\t100\t200\tname", "iso1").as_deref(),
            Some("2L\t100\t200\tname")
        );
    }

    #[test]
    fn test_clean_line_other_line() {
        assert_eq!(clean_line("2L_w1118\t100\t200", "iso1"), None);
        assert_eq!(clean_line("2L\t100\t200", "iso1"), None);
        // underscore only after the first tab does not count
        assert_eq!(clean_line("2L\t100_iso1\t200", "iso1"), None);
    }

    #[test]
    fn test_clean_line_uses_first_underscore() {
        assert_eq!(clean_line("chr_2L_iso1\t1\t2", "iso1"), None);
        assert_eq!(clean_line("chr_iso1_2L\t1\t2", "iso1").as_deref(), Some("chr_2L\t1\t2"));
    }

    #[test]
    fn test_unclean_line() {
        assert_eq!(unclean_line("2L\t100\t200", "iso1"), "2L_iso1\t100\t200");
        assert_eq!(unclean_line("2L", "iso1"), "2L_iso1");
    }

    #[test]
    fn test_clean_input_drops_other_lines() {
        let input = "2L_a\t1\t2\n3R_b\t3\t4\nX_a\t5\t6\n";
        let mut out = Vec::new();
        let kept = clean_input(input.as_bytes(), &mut out, "a").unwrap();
        assert_eq!(kept, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "2L\t1\t2\nX\t5\t6\n");
    }

    #[test]
    fn test_unclean_bed_order() {
        let original = "2L_a\t1\t2\n3R_b\t3\t4\nX_a\t5\t6\n";
        let lifted = "2L\t11\t12\nX\t15\t16\n";
        let mut out = Vec::new();
        unclean_bed(original.as_bytes(), lifted.as_bytes(), &mut out, "a").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "3R_b\t3\t4\n2L_a\t11\t12\nX_a\t15\t16\n"
        );
    }
}

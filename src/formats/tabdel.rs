//! Tab-delimited liftover
//!
//! Lifts arbitrary tab-delimited files (VCF-like tables, GWAS hits, ...)
//! by extracting a BED interval per data line, lifting those, and writing
//! the lifted coordinates back into the original columns. Comment lines
//! (`#`) pass through untouched.

use crate::core::io::{open_input, GzOutput, LineIterator};
use crate::core::{Transform, TransformError, TransformResult};
use crate::formats::bed::BedLiftover;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// 0-based positions of the coordinate columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabColumns {
    pub chrom: usize,
    /// 1-based position column
    pub start: usize,
    /// Optional end column; without it the interval is one base long
    pub end: Option<usize>,
}

/// Error parsing a `chr,start[,end]` column list
#[derive(Debug, thiserror::Error)]
pub enum TabColumnsError {
    #[error("Expected 2 or 3 comma-separated columns, got {0}")]
    Count(usize),

    #[error("Invalid column index '{0}'")]
    Index(String),
}

impl FromStr for TabColumns {
    type Err = TabColumnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(TabColumnsError::Count(parts.len()));
        }
        let index = |p: &str| {
            p.trim()
                .parse::<usize>()
                .map_err(|_| TabColumnsError::Index(p.to_string()))
        };
        Ok(Self {
            chrom: index(parts[0])?,
            start: index(parts[1])?,
            end: parts.get(2).map(|p| index(*p)).transpose()?,
        })
    }
}

/// A lifted interval keyed back to its source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiftedInterval {
    pub chrom: String,
    /// 0-based BED start
    pub start: i64,
    pub end: String,
}

fn field<'a>(fields: &[&'a str], index: usize, line: usize) -> TransformResult<&'a str> {
    fields.get(index).copied().ok_or_else(|| TransformError::InvalidRecord {
        line,
        message: format!("missing column {} ({} present)", index, fields.len()),
    })
}

/// Emit one `chrom\tstart-1\tend\tline_index` record per data line
///
/// Line indices count every line, comments included. Returns the number of
/// records written.
pub fn extract_bed<R, W>(reader: R, writer: &mut W, columns: &TabColumns) -> TransformResult<usize>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut lines = LineIterator::new(reader);
    let mut index = 0usize;
    let mut written = 0;

    while let Some(line) = lines.next_line() {
        let line = line?;
        if !line.starts_with('#') {
            let fields: Vec<&str> = line.split('\t').collect();
            let chrom = field(&fields, columns.chrom, index + 1)?;
            let start_text = field(&fields, columns.start, index + 1)?;
            let start: i64 = start_text.parse().map_err(|_| TransformError::InvalidRecord {
                line: index + 1,
                message: format!("invalid position '{}'", start_text),
            })?;

            match columns.end {
                Some(end) => {
                    let end = field(&fields, end, index + 1)?;
                    writeln!(writer, "{}\t{}\t{}\t{}", chrom, start - 1, end, index)?;
                }
                None => writeln!(writer, "{}\t{}\t{}\t{}", chrom, start - 1, start, index)?,
            }
            written += 1;
        }
        index += 1;
    }
    Ok(written)
}

/// Index lifted 4-column records by their source line
pub fn bed_map<R: BufRead>(reader: R) -> TransformResult<HashMap<usize, LiftedInterval>> {
    let mut lines = LineIterator::new(reader);
    let mut map = HashMap::new();
    let mut number = 0;

    while let Some(line) = lines.next_line() {
        let line = line?;
        number += 1;
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let invalid = |message: String| TransformError::InvalidRecord { line: number, message };
        if fields.len() != 4 {
            return Err(invalid(format!("expected 4 columns, got {}", fields.len())));
        }
        let start = fields[1]
            .parse::<i64>()
            .map_err(|_| invalid(format!("invalid start '{}'", fields[1])))?;
        let index = fields[3]
            .parse::<usize>()
            .map_err(|_| invalid(format!("invalid line index '{}'", fields[3])))?;

        map.insert(
            index,
            LiftedInterval {
                chrom: fields[0].to_string(),
                start,
                end: fields[2].to_string(),
            },
        );
    }
    Ok(map)
}

/// Write `original` back out with lifted coordinates substituted
///
/// Lines without a lifted interval are written unchanged.
pub fn return_bed<R, W>(
    original: R,
    lifted: &HashMap<usize, LiftedInterval>,
    writer: &mut W,
    columns: &TabColumns,
) -> TransformResult<()>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut lines = LineIterator::new(original);
    let mut index = 0usize;

    while let Some(line) = lines.next_line() {
        let line = line?;
        match lifted.get(&index) {
            Some(interval) if !line.starts_with('#') => {
                let mut fields: Vec<String> = line.split('\t').map(str::to_string).collect();
                let width = fields.len();
                let mut set = |column: usize, value: String| -> TransformResult<()> {
                    let slot = fields.get_mut(column).ok_or_else(|| TransformError::InvalidRecord {
                        line: index + 1,
                        message: format!("missing column {} ({} present)", column, width),
                    })?;
                    *slot = value;
                    Ok(())
                };
                set(columns.chrom, interval.chrom.clone())?;
                set(columns.start, (interval.start + 1).to_string())?;
                if let Some(end) = columns.end {
                    set(end, interval.end.clone())?;
                }
                writeln!(writer, "{}", fields.join("\t"))?;
            }
            _ => writeln!(writer, "{}", line)?,
        }
        index += 1;
    }
    Ok(())
}

/// Lift coordinate columns of a tab-delimited file
#[derive(Debug, Clone)]
pub struct TabDelLiftover {
    bed: BedLiftover,
    columns: TabColumns,
}

impl TabDelLiftover {
    pub fn new(bed: BedLiftover, columns: TabColumns) -> Self {
        Self { bed, columns }
    }

    pub fn columns(&self) -> &TabColumns {
        &self.columns
    }
}

impl Transform for TabDelLiftover {
    fn transform(
        &self,
        input: &Path,
        output: &mut dyn Write,
        unmapped: &Path,
    ) -> TransformResult<()> {
        let temps = self
            .bed
            .staging()
            .acquire_many(&["inbed_*.bed.gz", "outbed_*.bed.gz"])?;
        let (extracted, lifted) = (temps[0].path(), temps[1].path());

        let mut gz = GzOutput::new(BufWriter::new(File::create(extracted)?));
        let n = extract_bed(open_input(input)?, &mut gz, &self.columns)?;
        gz.finish()?.flush()?;
        log::debug!("Extracted {} interval(s) from {:?}", n, input);

        let mut gz = GzOutput::new(BufWriter::new(File::create(lifted)?));
        self.bed.transform(extracted, &mut gz, unmapped)?;
        gz.finish()?.flush()?;

        let map = bed_map(open_input(lifted)?)?;
        return_bed(open_input(input)?, &map, output, &self.columns)
    }
}

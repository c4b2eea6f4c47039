//! liftconcat CLI entry point
//!
//! Lifts a BED or tab-delimited file with UCSC liftOver, optionally in
//! parallel chunks.

use anyhow::Context;
use clap::Parser;
use liftconcat::core::{
    create_output, open_input, OutputSink, RunConfig, RunCoordinator, StagingDir, Transform,
    DEFAULT_CHUNK_SIZE,
};
use liftconcat::formats::{
    BedLiftover, LiftOverCommand, TabColumns, TabDelLiftover, DEFAULT_LIFTOVER,
};
use std::path::PathBuf;
use std::time::Instant;

/// Output path meaning standard output
const STDOUT: &str = "stdout";

#[derive(Parser)]
#[command(name = "liftconcat")]
#[command(about = "Lift line-name suffixed BED or tab-delimited files with liftOver")]
#[command(version)]
struct Cli {
    /// Input .bed file (gzip/bzip2 accepted)
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Output file; `stdout` writes to standard output, `.gz` compresses
    #[arg(short = 'o', long, default_value = STDOUT)]
    output: String,

    /// Unmapped record output file
    #[arg(short = 'u', long, default_value = "unmapped.txt")]
    unmapped: PathBuf,

    /// .chain file to use for liftover
    #[arg(short = 'c', long)]
    chain: PathBuf,

    /// Name of line in chromosomes of the input file to lift over
    #[arg(short = 'l', long = "line-name")]
    line_name: String,

    /// Comma-separated chromosome column, start column and optional end
    /// column (0-based) to convert a tab-delimited file
    #[arg(short = 't', long)]
    tabdel: Option<TabColumns>,

    /// Directory in which to store temporary files
    #[arg(short = 'T', long, default_value = "./")]
    tmpdir: PathBuf,

    /// Number of concurrent liftOver workers (1 = sequential)
    #[arg(short = 'j', long, default_value = "1")]
    threads: usize,

    /// Records per chunk in parallel mode (0 = whole file)
    #[arg(short = 's', long = "chunk-size", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// liftOver executable
    #[arg(long = "liftover", default_value = DEFAULT_LIFTOVER)]
    liftover: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    let config = RunConfig::default()
        .with_workers(cli.threads)
        .with_chunk_size(cli.chunk_size)
        .with_staging_dir(&cli.tmpdir);

    let command = LiftOverCommand::new(&cli.chain).with_program(&cli.liftover);
    let bed = BedLiftover::new(command, cli.line_name.clone(), StagingDir::new(&cli.tmpdir));
    let transform: Box<dyn Transform> = match cli.tabdel {
        Some(columns) => Box::new(TabDelLiftover::new(bed, columns)),
        None => Box::new(bed),
    };

    let input = open_input(&cli.input)
        .with_context(|| format!("Failed to open input {:?}", cli.input))?;
    let mut output = if cli.output == STDOUT {
        OutputSink::stdout()
    } else {
        create_output(&cli.output)
            .with_context(|| format!("Failed to create output {}", cli.output))?
    };

    eprintln!("Lifting {:?} (line '{}') with {:?}", cli.input, cli.line_name, cli.chain);
    let summary = RunCoordinator::new(config, transform.as_ref())
        .run(input, &mut output, &cli.unmapped)?;
    output
        .finish()
        .with_context(|| format!("Failed to finish output {}", cli.output))?;

    eprintln!("\n=== Liftover Statistics ===");
    eprintln!("Records:         {}", summary.records);
    eprintln!("Chunks:          {}", summary.chunks);
    eprintln!("Mode:            {}", if summary.parallel { "parallel" } else { "sequential" });
    eprintln!("Unmapped:        {:?}", cli.unmapped);
    eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}

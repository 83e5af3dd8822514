use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, metadata::LevelFilter};
use tracing_subscriber::{prelude::*, EnvFilter};

use cmpz_codecs::{codec_with_level, default_codec};
use cmpz_core::{inspect_stream, Pipeline, PipelineConfig, RecordReader, StreamStats, DEFAULT_CHUNK_SIZE};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "cmpz",
    about = "Chunked parallel zlib compression into CMP1 files",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into CMP1 format
    Compress {
        /// Source file to compress ("-" reads stdin)
        input: PathBuf,
        /// Destination CMP1 file ("-" writes to stdout)
        output: PathBuf,
        /// Raw bytes per chunk
        #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        /// Worker threads (default: one per CPU)
        #[arg(short, long)]
        workers: Option<usize>,
        /// zlib compression level (0–9)
        #[arg(short, long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=9))]
        level: u32,
    },
    /// Decompress a CMP1 file back to raw bytes
    Decompress {
        /// Source CMP1 file ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes to stdout)
        output: PathBuf,
        /// Worker threads (default: one per CPU)
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Validate a CMP1 file's framing and print its statistics
    Inspect {
        /// CMP1 file to inspect ("-" reads stdin)
        file: PathBuf,
        /// Print per-record details
        #[arg(long)]
        records: bool,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn is_stdio(path: &Path) -> bool {
    path.to_str() == Some("-")
}

fn open_input(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("opening input file {:?}", path))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: &Path) -> anyhow::Result<Box<dyn Write>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file = File::create(path).with_context(|| format!("creating output file {:?}", path))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// A failed run leaves no valid output behind, so don't leave a file either.
fn discard_output(path: &Path) {
    if !is_stdio(path) {
        if let Err(e) = fs::remove_file(path) {
            error!("could not remove incomplete output {:?}: {e}", path);
        }
    }
}

fn pipeline_config(chunk_size: Option<usize>, workers: Option<usize>) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    if let Some(chunk_size) = chunk_size {
        config = config.with_chunk_size(chunk_size);
    }
    if let Some(workers) = workers {
        config = config.with_workers(workers);
    }
    config
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn report(stats: &StreamStats, started: Instant) {
    let elapsed = started.elapsed().as_secs_f64();
    info!("  chunks      : {}", stats.chunks);
    info!("  raw size    : {}", human_bytes(stats.raw_bytes));
    info!("  compressed  : {}", human_bytes(stats.compressed_bytes));
    info!("  ratio       : {:.2}x", stats.ratio());
    if elapsed > 0.0 {
        info!(
            "  throughput  : {}/s",
            human_bytes((stats.raw_bytes as f64 / elapsed) as u64)
        );
    }
    info!("  elapsed     : {:.3}s", elapsed);
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(
    input: PathBuf,
    output: PathBuf,
    chunk_size: usize,
    workers: Option<usize>,
    level: u32,
) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(codec_with_level(level), pipeline_config(Some(chunk_size), workers))?;
    let src = open_input(&input)?;
    let dst = open_output(&output)?;

    let t0 = Instant::now();
    let stats = pipeline
        .compress_stream(src, dst)
        .with_context(|| format!("compressing {:?} into {:?}", input, output))
        .inspect_err(|_| discard_output(&output))?;
    report(&stats, t0);
    Ok(())
}

fn run_decompress(input: PathBuf, output: PathBuf, workers: Option<usize>) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(default_codec(), pipeline_config(None, workers))?;
    let src = open_input(&input)?;
    let dst = open_output(&output)?;

    let t0 = Instant::now();
    let stats = pipeline
        .decompress_stream(src, dst)
        .with_context(|| format!("decompressing {:?} into {:?}", input, output))
        .inspect_err(|_| discard_output(&output))?;
    report(&stats, t0);
    Ok(())
}

/// Size of `path` on disk, or `None` when it names stdio.
fn on_disk_size(path: &Path) -> anyhow::Result<Option<u64>> {
    if is_stdio(path) {
        return Ok(None);
    }
    let meta = fs::metadata(path).with_context(|| format!("reading metadata of {:?}", path))?;
    Ok(Some(meta.len()))
}

/// One row of the `--records` table.
#[derive(Debug, PartialEq, Eq)]
struct RecordRow {
    index: u64,
    compressed: u64,
    raw: u64,
}

/// Validate every record of `input` in a single pass, keeping a row per
/// record when `keep_rows` is set.
fn scan_records<R: Read>(input: R, keep_rows: bool) -> Result<(StreamStats, Vec<RecordRow>), cmpz_core::Error> {
    if !keep_rows {
        return Ok((inspect_stream(input)?, Vec::new()));
    }
    let mut reader = RecordReader::open(input)?;
    let mut rows = Vec::new();
    for record in reader.by_ref() {
        let record = record?;
        rows.push(RecordRow {
            index: record.index,
            compressed: record.payload.len() as u64,
            raw: record.raw_len,
        });
    }
    let stats = StreamStats {
        chunks: reader.records_read(),
        raw_bytes: reader.raw_bytes(),
        compressed_bytes: reader.compressed_bytes(),
    };
    Ok((stats, rows))
}

fn run_inspect(file: PathBuf, show_records: bool) -> anyhow::Result<()> {
    let file_size = on_disk_size(&file)?;
    let (stats, rows) =
        scan_records(open_input(&file)?, show_records).with_context(|| format!("inspecting {:?}", file))?;

    println!("=== CMP1 File: {:?} ===", file);
    println!();
    println!("  chunks         : {}", stats.chunks);
    println!("  raw size       : {}", human_bytes(stats.raw_bytes));
    println!("  compressed     : {}", human_bytes(stats.compressed_bytes));
    if let Some(size) = file_size {
        println!("  file on disk   : {}", human_bytes(size));
    }
    println!("  ratio          : {:.2}x", stats.ratio());

    if show_records {
        println!();
        println!("  {:>8}  {:>12}  {:>12}", "record", "compressed", "raw");
        println!("  {}", "-".repeat(36));
        for row in rows {
            println!(
                "  {:>8}  {:>12}  {:>12}",
                row.index,
                human_bytes(row.compressed),
                human_bytes(row.raw)
            );
        }
    }

    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn fallible_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Compress {
            input,
            output,
            chunk_size,
            workers,
            level,
        } => run_compress(input, output, chunk_size, workers, level),
        Commands::Decompress {
            input,
            output,
            workers,
        } => run_decompress(input, output, workers),
        Commands::Inspect { file, records } => run_inspect(file, records),
    }
}

fn main() {
    let subscriber = tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .without_time(),
        );
    tracing::subscriber::set_global_default(subscriber)
        .expect("cannot set default tracing subscriber");

    if let Err(err) = fallible_main() {
        error!("{err:?}");
        std::process::exit(1);
    }
}

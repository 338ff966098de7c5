//! sampiclyser CLI.
//!
//! Inspects SAMPIC captures: header metadata, per-channel hit counts and
//! reconstructed waveforms.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::redundant_closure_for_method_calls,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};

use sampic_core::Hit;
use sampic_format::{CorruptFramePolicy, DecoderConfig, FileHeader};
use sampic_io::{BatchSizing, SampicFileReader};
use sampic_waveform::{reconstruct_hit, InterpolationConfig, KernelKind, Waveform};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    SampicIo(#[from] sampic_io::Error),

    #[error("Format error: {0}")]
    Format(#[from] sampic_format::Error),

    #[error("Waveform error: {0}")]
    Waveform(#[from] sampic_waveform::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

/// SAMPIC capture decoder and waveform reconstruction.
#[derive(Parser)]
#[command(name = "sampiclyser")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug logging (RUST_LOG still applies)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the decoding subcommands.
#[derive(clap::Args)]
struct DecodeArgs {
    /// JSON configuration file with a `decoder` section
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hits per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Size batches to this many MiB instead of a fixed hit count
    #[arg(long, conflicts_with = "batch_size")]
    memory_budget_mb: Option<usize>,

    /// Skip frames with an out-of-range channel or write pointer instead of stopping
    #[arg(long)]
    skip_corrupt: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header metadata and frame count as JSON
    Info {
        /// Input capture
        input: PathBuf,
    },

    /// Count hits per channel
    Hits {
        /// Input capture
        input: PathBuf,

        /// First channel of the table
        #[arg(long, default_value = "0")]
        first: u32,

        /// Last channel of the table (default: last channel of the file)
        #[arg(long)]
        last: Option<u32>,

        #[command(flatten)]
        decode: DecodeArgs,
    },

    /// Reconstruct the waveform of one hit as CSV
    Waveform {
        /// Input capture
        input: PathBuf,

        /// Index of the hit in stream order
        #[arg(long, default_value = "0")]
        hit: u64,

        /// Interpolation kernel: windowed-sinc (Hann window) or lanczos
        #[arg(short, long, default_value = "lanczos")]
        kernel: KernelKind,

        /// Kernel half-width in samples
        #[arg(long, default_value = "3")]
        half_width: usize,

        /// Output points per sampling period
        #[arg(long, default_value = "8")]
        oversample: usize,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        decode: DecodeArgs,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn decoder_config(args: &DecodeArgs, header: &FileHeader) -> Result<DecoderConfig> {
    let mut config = match &args.config {
        Some(path) => DecoderConfig::from_file(path)?,
        None => DecoderConfig::default(),
    };
    if let Some(batch_size) = args.batch_size {
        config = config.with_batch_size(batch_size);
    } else if let Some(mb) = args.memory_budget_mb {
        let sizing = BatchSizing::default().with_memory_budget_bytes(mb.saturating_mul(1 << 20));
        config = config.with_batch_size(sizing.resolve_batch_size(header)?);
    }
    if args.skip_corrupt {
        config = config.with_corrupt_frame_policy(CorruptFramePolicy::Skip);
    }
    config.validate()?;
    Ok(config)
}

fn find_hit(reader: &SampicFileReader, config: DecoderConfig, index: u64) -> Result<Option<Hit>> {
    let mut seen = 0u64;
    for batch in reader.hit_batches(config)? {
        let batch = batch?;
        let len = batch.len() as u64;
        if index < seen + len {
            let offset = usize::try_from(index - seen).unwrap_or(usize::MAX);
            return Ok(batch.get(offset).map(|view| view.to_hit()));
        }
        seen += len;
    }
    Ok(None)
}

fn write_csv<W: Write>(out: &mut W, waveform: &Waveform) -> io::Result<()> {
    writeln!(out, "time_s,amplitude")?;
    for (t, v) in waveform.times.iter().zip(&waveform.values) {
        writeln!(out, "{:e},{}", t, v)?;
    }
    out.flush()
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            let reader = SampicFileReader::open(&input)?;
            let info = serde_json::json!({
                "file": input.display().to_string(),
                "file_size_bytes": reader.file_size(),
                "frame_count": reader.frame_count(),
                "trailing_bytes": reader.trailing_bytes(),
                "header": reader.header().metadata(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Hits {
            input,
            first,
            last,
            decode,
        } => {
            let reader = SampicFileReader::open(&input)?;
            let header = reader.header();
            let last = last.unwrap_or(header.channel_count().saturating_sub(1));
            if first > last {
                return Err(CliError::Usage(format!(
                    "--first ({}) is greater than --last ({})",
                    first, last
                )));
            }
            let config = decoder_config(&decode, header)?;

            let start = Instant::now();
            let counts = reader.channel_hit_counts(config)?;
            let elapsed = start.elapsed();

            println!("{:>8} | {:>8} | {:>12}", "Channel", "Physical", "Hits");
            println!("{:-<34}", "");
            for (channel, hits) in counts.range(first, last) {
                let physical = header
                    .physical_channel(channel)
                    .map_or_else(|| "-".to_string(), |p| p.to_string());
                println!("{:>8} | {:>8} | {:>12}", channel, physical, hits);
            }
            println!("{:-<34}", "");
            println!("Total hits: {}", counts.total());
            eprintln!(
                "Counted {} frames in {:.2}s",
                reader.frame_count(),
                elapsed.as_secs_f64()
            );
        }

        Commands::Waveform {
            input,
            hit,
            kernel,
            half_width,
            oversample,
            output,
            decode,
        } => {
            let reader = SampicFileReader::open(&input)?;
            let config = decoder_config(&decode, reader.header())?;
            let Some(found) = find_hit(&reader, config, hit)? else {
                return Err(CliError::Usage(format!(
                    "hit {} not found ({} frames in file)",
                    hit,
                    reader.frame_count()
                )));
            };
            log::info!(
                "hit {}: channel {}, t = {:e} s, peak {:?}",
                hit,
                found.channel,
                found.time_seconds,
                found.peak()
            );

            let interpolation = InterpolationConfig::new(kernel, half_width);
            let waveform = reconstruct_hit(
                &found.as_view(),
                reader.header().sampling_period_s(),
                &interpolation,
                oversample,
            )?;

            let mut out = open_output(output.as_deref())?;
            write_csv(&mut out, &waveform)?;
        }
    }

    Ok(())
}

//! hinomori - streaming binary snapshots of a filesystem tree.
//!
//! Usage:
//!   hinomori make-wire --root /srv > srv.hino     Write a snapshot stream
//!   hinomori tree < srv.hino                      Print a snapshot as a tree listing
//!   hinomori --help                               Show help

use std::fs::File;
use std::io::{self, BufReader, BufWriter, IsTerminal, Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hinomori_core::parse_pattern_list;
use hinomori_scan::{TreeWalker, WalkConfig};
use hinomori_wire::{ReconstructedFile, Records};

#[derive(Parser)]
#[command(
    name = "hinomori",
    version,
    about = "Streaming binary snapshots of a filesystem tree",
    long_about = "hinomori records the mode, size, ownership and optional content hash of \
                  every entry under a root into a compact stream, for later audit, diffing \
                  or inventory."
)]
struct Cli {
    /// More logging (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a tree and write its snapshot stream
    MakeWire {
        /// Root of the tree
        #[arg(long, default_value = "/")]
        root: PathBuf,

        /// Paths to block, as a JSON list of regexes
        #[arg(long, default_value = "[]")]
        block: String,

        /// Paths to hash, as a JSON list of regexes
        #[arg(long, default_value = "[]")]
        hash: String,

        /// Hash all files (overrides --hash)
        #[arg(long)]
        hash_all: bool,

        /// Do not block /dev and /proc
        #[arg(long)]
        no_default_blocks: bool,

        /// Threads for per-directory work (0 = auto)
        #[arg(short, long, default_value = "0")]
        threads: usize,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a snapshot stream as a listing
    Tree {
        /// Input file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Human-readable sizes
        #[arg(short = 'H', long)]
        human: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::MakeWire {
            root,
            block,
            hash,
            hash_all,
            no_default_blocks,
            threads,
            output,
        } => {
            let config = WalkConfig::builder()
                .root(root)
                .block_patterns(parse_pattern_list(&block).context("block paths")?)
                .hash_patterns(parse_pattern_list(&hash).context("hash paths")?)
                .hash_all(hash_all)
                .no_default_blocks(no_default_blocks)
                .threads(threads)
                .build()
                .context("Invalid configuration")?;
            run_make_wire(&config, output)?;
        }
        Command::Tree {
            input,
            human,
            format,
        } => {
            run_tree(input, human, format)?;
        }
    }

    Ok(())
}

/// Log to stderr; stdout carries the stream or the listing.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_env_filter(filter)
        .init();
}

/// Walk and write the snapshot.
fn run_make_wire(config: &WalkConfig, output: Option<PathBuf>) -> Result<()> {
    let walker = TreeWalker::new(config).context("Invalid configuration")?;
    info!(root = %config.root.display(), hash_all = config.hash_all, "walking");

    let summary = match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("create {}", path.display()))?;
            walker.write_snapshot(BufWriter::new(file))
        }
        None => walker.write_snapshot(BufWriter::new(io::stdout().lock())),
    }
    .context("walk")?;

    info!(
        dirs = summary.walk.dirs_visited,
        files = summary.walk.files_emitted,
        hashed = summary.walk.files_hashed,
        hash_errors = summary.walk.hash_errors,
        list_errors = summary.walk.list_errors,
        stat_errors = summary.walk.stat_errors,
        blocked = summary.walk.blocked,
        frames = summary.frames,
        bytes = summary.bytes,
        "snapshot complete"
    );
    Ok(())
}

/// Decode a snapshot and print one line per record.
fn run_tree(input: Option<PathBuf>, human: bool, format: OutputFormat) -> Result<()> {
    let reader: Box<dyn Read> = match input {
        Some(path) => Box::new(
            File::open(&path).with_context(|| format!("open {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };
    let records = Records::new(BufReader::new(reader)).context("read header")?;

    let mut out = BufWriter::new(io::stdout().lock());
    if let OutputFormat::Text = format {
        writeln!(
            out,
            "{:>10} {:>10} {:>6} {:>6} {:>16} path",
            "mode", "size", "own", "grp", "hash"
        )?;
    }

    let mut count: u64 = 0;
    for file in records {
        let file = match file {
            Ok(file) => file,
            Err(err) => {
                out.flush()?;
                info!("read {count} files");
                return Err(err).context("decode");
            }
        };
        match format {
            OutputFormat::Text => print_text(&mut out, &file, human)?,
            OutputFormat::Json => print_json(&mut out, &file)?,
        }
        count += 1;
    }
    out.flush()?;

    info!("read {count} files");
    Ok(())
}

fn print_text(out: &mut impl Write, file: &ReconstructedFile, human: bool) -> io::Result<()> {
    let record = &file.record;
    let size = if human {
        format_size(record.size)
    } else {
        record.size.to_string()
    };
    let hash = match (&record.hash, &record.hash_error) {
        (Some(hash), _) => hash.to_hex(),
        (None, Some(_)) => "error".to_string(),
        (None, None) => String::new(),
    };
    writeln!(
        out,
        "{:>10} {:>10} {:>6} {:>6} {:>16} {}",
        record.mode_string(),
        size,
        record.owner,
        record.group,
        hash,
        file.path().display()
    )
}

fn print_json(out: &mut impl Write, file: &ReconstructedFile) -> Result<()> {
    let record = &file.record;
    let value = serde_json::json!({
        "path": file.path(),
        "mode": record.mode,
        "size": record.size,
        "owner": record.owner,
        "group": record.group,
        "hash": record.hash.map(|h| h.to_hex()),
        "hash_error": record.hash_error,
    });
    serde_json::to_writer(&mut *out, &value)?;
    writeln!(out)?;
    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

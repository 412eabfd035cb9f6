//! recsize - recommend a storage recordsize from a tree's file size distribution.
//!
//! Usage:
//!   recsize [PATH]              Scan and recommend
//!   recsize analyze [PATH]      Same, explicitly
//!   recsize sizes [FILE]        Recommend from newline-separated byte sizes
//!   recsize reference           Show the random-I/O reference table
//!   recsize bins                Show the bin table
//!   recsize --help              Show help

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use recsize_analyze::{
    Analysis, RecommendConfig, Recommender, Report, SkewConfig, SkewPolicy, Verdict,
    reference_table,
};
use recsize_core::{AggregateState, Aggregator, BinSlot, BinTable, Recordsize};
use recsize_scan::{JwalkScanner, ScanConfig, ScanSummary};

#[derive(Parser)]
#[command(
    name = "recsize",
    version,
    about = "Recommend a storage recordsize from file size distribution",
    long_about = "recsize walks a directory tree, builds a byte-weighted histogram of file \
                  sizes and recommends a dataset recordsize for sequential-write, mixed and \
                  sequential-read workloads.\n\n\
                  Run `recsize [PATH]` to analyze a directory.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(flatten)]
    analyze: AnalyzeArgs,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and recommend a recordsize
    Analyze(AnalyzeArgs),

    /// Recommend from a list of byte sizes, one per line
    Sizes {
        /// File to read ("-" for stdin)
        #[arg(default_value = "-")]
        input: PathBuf,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Show the static random-I/O reference table
    Reference,

    /// Show the bin table and the recordsize each bin maps to
    Bins,
}

#[derive(Args, Clone)]
struct AnalyzeArgs {
    /// Path to analyze (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Skip hidden files and directories
    #[arg(long)]
    no_hidden: bool,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Descend into other mounted filesystems
    #[arg(long)]
    cross_filesystems: bool,

    /// Count every hardlink separately
    #[arg(long)]
    count_hardlinks: bool,

    /// Glob pattern to exclude (repeatable)
    #[arg(short, long = "exclude", value_name = "GLOB")]
    excludes: Vec<String>,

    /// Maximum depth to descend
    #[arg(short, long)]
    depth: Option<u32>,

    /// Stop after sampling this many files
    #[arg(long, value_name = "N")]
    limit: Option<u64>,

    /// Scanner threads (0 = auto)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Show scan progress on stderr
    #[arg(long)]
    progress: bool,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Args, Clone)]
struct ReportArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Skew detection policy
    #[arg(long, default_value = "cdf-joint")]
    skew_policy: SkewPolicyArg,

    /// Hide the random-I/O reference table
    #[arg(long)]
    no_reference: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SkewPolicyArg {
    /// >60% small files by count and >80% of bytes in large files
    CdfJoint,
    /// >40% small files by count and at least 5000 of them
    CountFloor,
}

impl SkewPolicyArg {
    fn policy(self) -> SkewPolicy {
        match self {
            Self::CdfJoint => SkewPolicy::cdf_joint(),
            Self::CountFloor => SkewPolicy::count_floor(),
        }
    }
}

impl ReportArgs {
    fn recommender(&self) -> Result<Recommender> {
        let config = RecommendConfig::builder()
            .skew(SkewConfig::with_policy(self.skew_policy.policy()))
            .build()
            .context("Invalid recommendation config")?;
        Ok(Recommender::with_config(config))
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Command::Analyze(args)) => run_analyze(&args)?,
        Some(Command::Sizes { input, report }) => run_sizes(&input, &report)?,
        Some(Command::Reference) => print_reference(),
        Some(Command::Bins) => print_bins(&BinTable::standard()),
        None => run_analyze(&cli.analyze)?,
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Scan a directory and print recommendations.
fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let path = args.path.canonicalize().context("Invalid path")?;

    let config = ScanConfig::builder()
        .root(&path)
        .include_hidden(!args.no_hidden)
        .follow_symlinks(args.follow_symlinks)
        .cross_filesystems(args.cross_filesystems)
        .dedupe_hardlinks(!args.count_hardlinks)
        .ignore_patterns(args.excludes.clone())
        .max_depth(args.depth)
        .file_limit(args.limit)
        .threads(args.threads)
        .build()
        .map_err(|e| eyre!("Invalid scan configuration: {e}"))?;

    let recommender = args.report.recommender()?;
    let bins = BinTable::standard();

    eprintln!("Scanning {}...", path.display());

    let scanner = JwalkScanner::new();
    let progress = args.progress.then(|| spawn_progress(&scanner));
    let summary = scanner.scan(&config, &bins).context("Scan failed");
    drop(scanner);
    if let Some(handle) = progress {
        let _ = handle.join();
        eprintln!();
    }
    let summary = summary?;

    let report = recommender.recommend(&summary.state);

    match args.report.format {
        OutputFormat::Text => {
            print_scan_header(&summary);
            print_report(&report, &args.report, &format!("under {}", path.display()));
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "root": summary.root_path,
                "scan_duration_secs": summary.scan_duration.as_secs_f64(),
                "truncated": summary.truncated,
                "stats": summary.stats,
                "warnings": summary.warnings.len(),
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

/// Print scan progress on stderr until the scanner is dropped.
fn spawn_progress(scanner: &JwalkScanner) -> thread::JoinHandle<()> {
    let mut rx = scanner.subscribe();
    thread::spawn(move || {
        while let Ok(progress) = rx.blocking_recv() {
            eprint!(
                "\r {} files, {} dirs, {} ({:.0} files/s)   ",
                progress.files_scanned,
                progress.dirs_scanned,
                format_size(progress.bytes_scanned),
                progress.files_per_second()
            );
        }
    })
}

/// Read byte sizes from a file or stdin and print recommendations.
fn run_sizes(input: &Path, args: &ReportArgs) -> Result<()> {
    let recommender = args.recommender()?;
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(io::stdin().lock()))
    } else {
        let file =
            File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let state = aggregate_sizes(reader)?;
    debug!(files = state.total_files(), bytes = state.total_bytes(), "size stream consumed");
    let report = recommender.recommend(&state);

    match args.format {
        OutputFormat::Text => print_report(&report, args, "in input"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

/// Fold newline-separated byte sizes into a sealed state.
///
/// Blank lines and `#` comments are skipped. The first malformed or negative
/// line aborts with its line number.
fn aggregate_sizes(reader: impl BufRead) -> Result<AggregateState> {
    let mut aggregator = Aggregator::new(BinTable::standard());
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read size stream")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let size: i64 = trimmed
            .parse()
            .with_context(|| format!("Line {}: not an integer size: {trimmed:?}", index + 1))?;
        aggregator
            .observe(size)
            .with_context(|| format!("Line {}", index + 1))?;
    }
    Ok(aggregator.finish())
}

fn print_scan_header(summary: &ScanSummary) {
    println!();
    println!("{}", "─".repeat(70));
    println!(
        " {} - {}",
        summary.root_path.display(),
        format_size(summary.total_size())
    );
    println!(
        " {} files, {} directories",
        summary.total_files(),
        summary.stats.total_dirs
    );
    if summary.stats.hardlinks_skipped > 0 {
        println!(" {} hardlinks counted once", summary.stats.hardlinks_skipped);
    }
    println!(" Scanned in {:.2}s", summary.scan_duration.as_secs_f64());
    if summary.truncated {
        println!(" Stopped at file limit: results cover a partial scan");
    }
    if summary.has_warnings() {
        println!(" {} warning(s) during scan", summary.warnings.len());
        info!(warnings = summary.warnings.len(), "scan produced warnings");
    }
    println!("{}", "─".repeat(70));
}

fn print_report(report: &Report, args: &ReportArgs, scope: &str) {
    let Some(analysis) = report.analysis() else {
        println!();
        println!(" No files found {scope}. Nothing to recommend.");
        println!();
        return;
    };

    print_distribution(analysis);
    print_recommendations(analysis);
    print_skew(analysis);
    if !args.no_reference {
        print_reference();
    }
}

fn print_distribution(analysis: &Analysis) {
    println!();
    println!(" Size Distribution (byte-weighted):");
    println!(
        "   {:<6} {:>10} {:>12} {:>7} {:>7}  ",
        "bin", "files", "bytes", "bytes%", "cum%"
    );
    let max_pct = analysis
        .bins
        .iter()
        .map(|row| row.byte_pct)
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);

    for row in analysis.bins.iter().filter(|row| row.count > 0) {
        println!(
            "   {:<6} {:>10} {:>12} {:>6.1}% {:>6.1}%  {}",
            row.label,
            row.count,
            format_size(row.bytes),
            row.byte_pct,
            row.cumulative_byte_pct,
            make_bar(row.byte_pct / max_pct, 24)
        );
    }
}

fn print_recommendations(analysis: &Analysis) {
    println!();
    match analysis.verdict {
        Verdict::Unified { recordsize } => {
            println!(" Recommendation: recordsize={recordsize}");
            println!("   (all workload tiers agree)");
        }
        Verdict::PerTier { .. } => {
            println!(" Recommendations:");
            for tier in &analysis.tiers {
                let note = if tier.overridden {
                    format!(
                        " (skew override; p{:.0} bin maps to {})",
                        tier.percentile * 100.0,
                        tier.computed
                    )
                } else {
                    String::new()
                };
                println!(
                    "   {:<17} recordsize={:<5} p{:.0} at {} ({:.1}% of bytes){}",
                    tier.tier.to_string(),
                    tier.recordsize.to_string(),
                    tier.percentile * 100.0,
                    tier.bin_label,
                    tier.byte_share * 100.0,
                    note
                );
            }
        }
    }
}

fn print_skew(analysis: &Analysis) {
    let skew = &analysis.skew;
    println!();
    println!(
        " Skew: {:.1}% of files are small, {:.1}% of bytes are in large files{}",
        skew.small_count_fraction * 100.0,
        skew.large_byte_fraction * 100.0,
        if skew.is_skewed { " - SKEWED" } else { "" }
    );
    if let Some(split) = &analysis.split {
        println!("   Consider splitting into two datasets:");
        println!("     large files  recordsize={}", split.large_files);
        println!(
            "     small files  recordsize={} (most files are <= {})",
            split.small_files, split.small_bin_label
        );
    }
}

fn print_reference() {
    println!();
    println!(" Random I/O reference (rough heuristics, not derived from the scan):");
    for entry in reference_table() {
        println!(
            "   {:<32} recordsize={:<5} {}",
            entry.workload,
            entry.recordsize.to_string(),
            entry.note
        );
    }
    println!();
}

fn print_bins(bins: &BinTable) {
    println!(" {:<6} {:>14} {:>10}", "bin", "upper bound", "maps to");
    for (i, &threshold) in bins.thresholds().iter().enumerate() {
        let slot = BinSlot::Bin(i);
        println!(
            " {:<6} {:>14} {:>10}",
            bins.label(slot),
            threshold,
            Recordsize::from_slot(bins, slot).to_string()
        );
    }
    println!(
        " {:<6} {:>14} {:>10}",
        bins.label(BinSlot::Overflow),
        "-",
        Recordsize::from_slot(bins, BinSlot::Overflow).to_string()
    );
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

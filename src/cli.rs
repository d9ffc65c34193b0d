//! Command-line interface for docguard.

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::coverage::{self, StatusFilter};
use crate::error::ParseError;
use crate::extract::{self, FileInventory};
use crate::report::{self, UnitReport};
use crate::review::ReviewLog;
use crate::rewrite::{self, LockRegistry};
use crate::validate;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Docstring coverage and quality gate for Python projects.
///
/// Docguard extracts every documentable unit (functions, methods, classes)
/// from Python sources, measures docstring coverage, validates docstring
/// structure, and applies reviewed docstring rewrites in place.
#[derive(Parser)]
#[command(name = "docguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Measure docstring coverage and report violations
    Scan(ScanArgs),
    /// Gate on a minimum coverage threshold
    #[command(visible_alias = "gate")]
    Check(CheckArgs),
    /// Apply a docstring rewrite to one unit
    Apply(ApplyArgs),
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Path to scan (file or directory)
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Only list units with this status: all, missing, or documented
    #[arg(short, long)]
    pub status: Option<String>,

    /// Substring filter on qualified names and signatures
    #[arg(long)]
    pub filter: Option<String>,

    /// Write the JSON report to a file in addition to stdout output
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Minimum acceptable coverage percentage (overrides config)
    #[arg(short, long)]
    pub min_coverage: Option<f64>,
}

/// Arguments for the apply command.
#[derive(Parser)]
pub struct ApplyArgs {
    /// Python file containing the unit
    pub file: PathBuf,

    /// Qualified name of the unit (e.g. "Parser.parse")
    pub unit: String,

    /// File holding the new docstring text (default: read from stdin)
    #[arg(short, long)]
    pub doc: Option<PathBuf>,

    /// Review log to consult before applying
    #[arg(short, long)]
    pub review_log: Option<PathBuf>,
}

/// Results of extracting a set of files.
struct ScanResult {
    inventories: Vec<FileInventory>,
    failures: Vec<ParseError>,
}

/// Collect Python files under a root, honoring config exclusions.
fn collect_files(root: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories
            if e.file_type().is_dir() && name.starts_with('.') {
                return false;
            }
            // Skip caches, virtualenvs, and vendored trees
            if e.file_type().is_dir()
                && (name == "__pycache__"
                    || name == "venv"
                    || name == ".venv"
                    || name == "node_modules"
                    || name == "site-packages")
            {
                return false;
            }
            true
        })
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext == "py" && !config.is_path_excluded(path) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Load config from an explicit path or by discovery.
fn load_config(explicit: &Option<PathBuf>) -> anyhow::Result<Config> {
    match explicit {
        Some(p) => Config::parse_file(p),
        None => Config::discover(),
    }
}

/// Resolve a scan root into the list of files to extract.
fn resolve_files(path: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(path)?;
    if metadata.is_dir() {
        collect_files(path, config)
    } else {
        Ok(vec![path.to_path_buf()])
    }
}

/// Extract all files in parallel. Parse failures are collected, not fatal.
fn extract_all(files: &[PathBuf]) -> ScanResult {
    let results: Vec<Result<FileInventory, ParseError>> = files
        .par_iter()
        .map(|path| {
            let source = std::fs::read_to_string(path).map_err(|_| ParseError {
                file: path.to_string_lossy().to_string(),
                line: None,
            })?;
            extract::extract(path, &source)
        })
        .collect();

    let mut inventories = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(inv) => inventories.push(inv),
            Err(e) => failures.push(e),
        }
    }

    ScanResult {
        inventories,
        failures,
    }
}

/// Validate every unit, keeping only non-compliant results.
fn validate_all(inventories: &[FileInventory], config: &Config) -> Vec<UnitReport> {
    let include_private = config.should_include_private();
    let mut reports = Vec::new();
    for inv in inventories {
        for unit in &inv.units {
            let result = validate::validate(unit, config.style, include_private);
            if !result.is_compliant() {
                reports.push(UnitReport {
                    file: inv.path.clone(),
                    result,
                });
            }
        }
    }
    reports
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let status = match &args.status {
        Some(s) => match s.parse::<StatusFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(EXIT_ERROR);
            }
        },
        None => StatusFilter::All,
    };

    let config = match load_config(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let files = match resolve_files(&args.path, &config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    if files.is_empty() {
        eprintln!("Warning: no Python files to scan");
        return Ok(EXIT_SUCCESS);
    }

    let scan = extract_all(&files);
    let snapshot = coverage::aggregate(&scan.inventories);
    let reports = validate_all(&scan.inventories, &config);

    let path_str = args.path.to_string_lossy().to_string();
    let style = config.style.as_str();
    let json = report::build_json(
        &path_str,
        style,
        scan.inventories.len(),
        &snapshot,
        &reports,
        &scan.failures,
    );

    if let Some(out) = &args.out {
        std::fs::write(out, report::render_json(&json)?)?;
    }

    match args.format.as_str() {
        "json" => {
            println!("{}", report::render_json(&json)?);
        }
        _ => {
            report::write_pretty(
                &path_str,
                style,
                &snapshot,
                &reports,
                &scan.failures,
                None,
            );
            if args.status.is_some() || args.filter.is_some() {
                write_unit_listing(&scan.inventories, status, args.filter.as_deref());
            }
        }
    }

    Ok(EXIT_SUCCESS)
}

/// List units matching a status/query projection.
fn write_unit_listing(inventories: &[FileInventory], status: StatusFilter, query: Option<&str>) {
    use colored::*;

    for inv in inventories {
        let units = coverage::filter_units(inv, status, query);
        if units.is_empty() {
            continue;
        }
        println!("  {}", inv.path.blue());
        for unit in units {
            let marker = if unit.is_documented() {
                "doc ".green()
            } else {
                "miss".red()
            };
            println!(
                "    {} {:<6} {}",
                marker,
                unit.kind.as_str(),
                unit.qualified_name
            );
        }
    }
    println!();
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    // CLI flag wins over config
    let min_coverage = args.min_coverage.or(config.min_coverage);

    let files = match resolve_files(&args.path, &config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    if files.is_empty() {
        eprintln!("Warning: no Python files to scan");
        return Ok(EXIT_SUCCESS);
    }

    let scan = extract_all(&files);
    let snapshot = coverage::aggregate(&scan.inventories);
    let reports = validate_all(&scan.inventories, &config);

    let path_str = args.path.to_string_lossy().to_string();
    let style = config.style.as_str();

    match args.format.as_str() {
        "json" => {
            let json = report::build_json(
                &path_str,
                style,
                scan.inventories.len(),
                &snapshot,
                &reports,
                &scan.failures,
            );
            println!("{}", report::render_json(&json)?);
        }
        _ => {
            report::write_pretty(
                &path_str,
                style,
                &snapshot,
                &reports,
                &scan.failures,
                min_coverage,
            );
        }
    }

    // Violations are advisory; only the coverage gate affects the exit code.
    match min_coverage {
        Some(min) if snapshot.percent < min => Ok(EXIT_FAILED),
        _ => Ok(EXIT_SUCCESS),
    }
}

/// Run the apply command.
pub fn run_apply(args: &ApplyArgs) -> anyhow::Result<i32> {
    let file_str = args.file.to_string_lossy().to_string();

    let new_doc = match &args.doc {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading doc file {:?}: {}", path, e);
                return Ok(EXIT_ERROR);
            }
        },
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    if new_doc.trim().is_empty() {
        eprintln!("Error: refusing to apply an empty docstring");
        return Ok(EXIT_ERROR);
    }

    // Review log gate: a unit whose latest decision is Rejected is not applied.
    if let Some(log_path) = &args.review_log {
        let log = match ReviewLog::load(log_path) {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error loading review log {:?}: {}", log_path, e);
                return Ok(EXIT_ERROR);
            }
        };
        let key = ReviewLog::unit_key(&file_str, &args.unit);
        if let Some(entry) = log.decision_for(&key) {
            if entry.decision == crate::review::Decision::Rejected {
                eprintln!(
                    "Error: rewrite for {} was rejected at {}",
                    args.unit, entry.timestamp
                );
                return Ok(EXIT_FAILED);
            }
        }
    }

    // Serialize concurrent rewrites of the same file.
    let lock = LockRegistry::global().lock_for(&args.file);
    let _guard = lock.lock().unwrap();

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {:?}: {}", args.file, e);
            return Ok(EXIT_ERROR);
        }
    };

    let inventory = match extract::extract(&args.file, &source) {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let unit = match inventory.unit(&args.unit) {
        Some(u) => u.clone(),
        None => {
            eprintln!("Error: no unit named {:?} in {}", args.unit, file_str);
            let mut names: Vec<&str> = inventory
                .units
                .iter()
                .map(|u| u.qualified_name.as_str())
                .collect();
            names.sort_unstable();
            if !names.is_empty() {
                eprintln!("Known units: {}", names.join(", "));
            }
            return Ok(EXIT_ERROR);
        }
    };

    let updated = match rewrite::rewrite(&inventory, &source, &unit, &new_doc) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_FAILED);
        }
    };

    if let Err(e) = write_atomic(&args.file, &updated) {
        eprintln!("Error writing {:?}: {}", args.file, e);
        return Ok(EXIT_ERROR);
    }

    println!("Applied docstring to {} in {}", args.unit, file_str);
    Ok(EXIT_SUCCESS)
}

/// Write via a sibling temp file and rename, so a crash never leaves a
/// half-written source file behind.
fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    let tmp = path.with_extension("py.docguard-tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

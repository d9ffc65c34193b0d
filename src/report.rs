//! Output formatting for docguard results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::coverage::CoverageSnapshot;
use crate::error::ParseError;
use crate::validate::{Severity, ValidationResult};

/// One validated unit together with its owning file.
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub file: String,
    pub result: ValidationResult,
}

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub style: String,
    pub files_scanned: usize,
    pub coverage: CoverageSnapshot,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parse_errors: Vec<JsonParseError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<JsonViolation>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonParseError {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonViolation {
    pub rule: String,
    pub severity: String,
    pub file: String,
    pub unit: String,
    pub line: usize,
    pub message: String,
}

/// Build the structured report from scan results.
pub fn build_json(
    path: &str,
    style: &str,
    files_scanned: usize,
    coverage: &CoverageSnapshot,
    reports: &[UnitReport],
    failures: &[ParseError],
) -> JsonReport {
    let violations = reports
        .iter()
        .flat_map(|r| {
            r.result.violations.iter().map(move |v| JsonViolation {
                rule: v.rule.as_str().to_string(),
                severity: v.severity.to_string(),
                file: r.file.clone(),
                unit: r.result.unit.clone(),
                line: v.line,
                message: v.message.clone(),
            })
        })
        .collect();

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        style: style.to_string(),
        files_scanned,
        coverage: coverage.clone(),
        parse_errors: failures
            .iter()
            .map(|e| JsonParseError {
                file: e.file.clone(),
                line: e.line,
            })
            .collect(),
        violations,
    }
}

/// Serialize the report, for stdout or a report file.
pub fn render_json(report: &JsonReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write a human-readable report to stdout.
pub fn write_pretty(
    path: &str,
    style: &str,
    coverage: &CoverageSnapshot,
    reports: &[UnitReport],
    failures: &[ParseError],
    min_coverage: Option<f64>,
) {
    println!();
    print!("  {}", "docguard".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}{}", "Scanning: ".dimmed(), path);
    println!("  {}{}", "Style:    ".dimmed(), style);
    println!();

    print!("  Documented: ");
    print!(
        "{}",
        format!("{}/{}", coverage.documented_units, coverage.total_units).bold()
    );
    print!("  Coverage: ");
    write_colored_percent(coverage.percent);
    println!();
    println!();

    if !coverage.by_kind.is_empty() {
        println!("  {}", "By kind:".bold());
        for (kind, counts) in &coverage.by_kind {
            println!(
                "    {:<16} {:>4}/{}",
                kind, counts.documented, counts.total
            );
        }
        println!();
    }

    if !coverage.files.is_empty() {
        println!("  {}", "Files:".bold());
        for file in &coverage.files {
            print!("    {}  {}/{}  ", file.path.blue(), file.documented, file.total);
            write_colored_percent(file.percent);
            println!();
        }
        println!();
    }

    if !failures.is_empty() {
        println!("  {} ({}):", "Parse failures".bold(), failures.len());
        for err in failures {
            println!("    {} {}", "SKIP ".yellow(), err);
        }
        println!("    {}", "(excluded from coverage)".dimmed());
        println!();
    }

    let violation_count: usize = reports.iter().map(|r| r.result.violations.len()).sum();
    if violation_count > 0 {
        write_violations(reports, violation_count);
        println!();
    }

    write_final_status(coverage, min_coverage);
    println!();
}

fn write_colored_percent(p: f64) {
    let text = format!("{:.1}%", p);
    match p {
        p if p >= 90.0 => print!("{}", text.green().bold()),
        p if p >= 75.0 => print!("{}", text.green()),
        p if p >= 50.0 => print!("{}", text.yellow()),
        _ => print!("{}", text.red()),
    }
}

fn write_violations(reports: &[UnitReport], count: usize) {
    println!("  {} ({}):", "Violations".bold(), count);
    println!();

    for report in reports {
        for v in &report.result.violations {
            write_severity_tag(&v.severity);
            print!("   {:<22}", v.rule.as_str().dimmed());
            print!("{}", report.file.blue());
            print!("{}", format!(":{}", v.line).dimmed());
            println!("  {}", report.result.unit.dimmed());
            println!("             {}", v.message);
        }
    }
}

fn write_severity_tag(severity: &Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
        Severity::Info => print!("    {} ", "INFO ".blue()),
    }
}

fn write_final_status(coverage: &CoverageSnapshot, min_coverage: Option<f64>) {
    print!("  Coverage: ");
    write_colored_percent(coverage.percent);
    if let Some(min) = min_coverage {
        print!("  {}", format!("(threshold {:.1}%)", min).dimmed());
        print!("  ");
        if coverage.percent >= min {
            print!("{}", "PASSED".green());
        } else {
            print!("{}", "FAILED".red());
        }
    }
    println!();
}

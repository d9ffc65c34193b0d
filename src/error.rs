//! Error taxonomy for docguard.
//!
//! Failures are scoped: a `ParseError` excludes one file from aggregation,
//! a `RewriteConflict` aborts one rewrite, and a `GenerationError` leaves
//! one unit undocumented. None of them abort a whole-project scan.

use thiserror::Error;

/// A Python source file failed to parse.
///
/// Files that fail to parse are excluded from coverage entirely; they are
/// never counted as zero-documented.
#[derive(Debug, Clone, Error)]
#[error("syntax error in {file}{}", match line { Some(l) => format!(" near line {}", l), None => String::new() })]
pub struct ParseError {
    /// Path of the file that failed to parse.
    pub file: String,
    /// Approximate line of the first error node, when available.
    pub line: Option<usize>,
}

/// A rewrite was attempted against a stale text snapshot.
///
/// Detected by exact length and checksum comparison before any edit. The
/// caller must re-extract the file and re-approve the change before retrying.
#[derive(Debug, Clone, Error)]
#[error(
    "stale snapshot for {file}: file changed since extraction \
     (snapshot {snapshot_len} bytes, current {current_len} bytes)"
)]
pub struct RewriteConflict {
    /// Path of the file whose snapshot went stale.
    pub file: String,
    /// Length of the text the spans were computed against.
    pub snapshot_len: usize,
    /// Length of the text the rewrite was asked to edit.
    pub current_len: usize,
}

/// A rewrite request that cannot be performed.
#[derive(Debug, Clone, Error)]
pub enum RewriteError {
    /// The file changed between extraction and rewrite.
    #[error(transparent)]
    Conflict(#[from] RewriteConflict),
    /// The replacement text cannot be spliced as a triple-quoted literal.
    /// Rejected up front; an escaped rendition would no longer round-trip
    /// through extraction.
    #[error("docstring for {unit} contains a \"\"\" delimiter and cannot be spliced")]
    UnrepresentableDoc {
        /// Qualified name of the unit the rewrite targeted.
        unit: String,
    },
}

/// The external documentation generator failed for a unit.
///
/// The unit stays "missing"; the failure is surfaced to the caller and is
/// never silently replaced with empty text.
#[derive(Debug, Clone, Error)]
#[error("generation failed for {unit}: {message}")]
pub struct GenerationError {
    /// Qualified name of the unit the generator was asked about.
    pub unit: String,
    /// Backend-provided failure description.
    pub message: String,
}

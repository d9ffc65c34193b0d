//! Docguard - docstring coverage and quality gate for Python projects.
//!
//! Docguard parses Python sources with tree-sitter and builds an inventory
//! of documentable units (functions, methods, classes). On top of that
//! inventory it measures docstring coverage, scores cyclomatic complexity,
//! validates docstring structure, and applies reviewed docstring rewrites
//! back into the source text.
//!
//! # Architecture
//!
//! - `extract`: tree-sitter extraction of code units, spans, and docstrings
//! - `complexity`: cyclomatic complexity per unit
//! - `validate`: advisory docstring compliance rules
//! - `coverage`: snapshot aggregation and unit projections
//! - `rewrite`: span-exact docstring splicing with stale-snapshot detection
//! - `generate`: context assembly for external docstring generators
//! - `review`: persisted accept/reject decisions
//! - `report`: output formatting (pretty, JSON)

pub mod cli;
pub mod complexity;
pub mod config;
pub mod coverage;
pub mod error;
pub mod extract;
pub mod generate;
pub mod report;
pub mod review;
pub mod rewrite;
pub mod validate;

pub use config::{Config, StyleConvention};
pub use coverage::{aggregate, filter_units, CoverageSnapshot, StatusFilter};
pub use error::{GenerationError, ParseError, RewriteConflict, RewriteError};
pub use extract::{extract, CodeUnit, DocBlock, FileInventory, Span, UnitKind};
pub use generate::{DocGenerator, UnitContext};
pub use review::{Decision, ReviewLog};
pub use rewrite::{rewrite, LockRegistry};
pub use validate::{validate, RuleId, Severity, ValidationResult, Violation};

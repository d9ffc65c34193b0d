//! Structural docstring validation.
//!
//! The rules here are convention-independent analogues of the documented
//! docstring standard: a docstring must exist, open with a punctuated
//! one-line summary, separate the summary from the rest with a blank line,
//! enumerate every signature parameter when it describes parameters at all,
//! and describe the return or yield value when the body produces one.
//! Violations are advisory, never fatal.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::StyleConvention;
use crate::extract::{CodeUnit, UnitKind};

/// Severity levels for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Stable rule identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleId {
    #[serde(rename = "missing-doc")]
    MissingDoc,
    #[serde(rename = "summary-blank-line")]
    SummaryBlankLine,
    #[serde(rename = "summary-punctuation")]
    SummaryPunctuation,
    #[serde(rename = "params-documented")]
    ParamsDocumented,
    #[serde(rename = "returns-documented")]
    ReturnsDocumented,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::MissingDoc => "missing-doc",
            RuleId::SummaryBlankLine => "summary-blank-line",
            RuleId::SummaryPunctuation => "summary-punctuation",
            RuleId::ParamsDocumented => "params-documented",
            RuleId::ReturnsDocumented => "returns-documented",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single compliance violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub rule: RuleId,
    pub severity: Severity,
    pub message: String,
    /// Line the violation points at (unit or docstring start).
    pub line: usize,
}

/// Per-unit validation outcome. Zero violations means compliant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Qualified name of the validated unit.
    pub unit: String,
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Validate one unit against the structural docstring rules.
///
/// The style convention is informational here; it travels with the result
/// for reporting but does not change which rules apply. Private units
/// (leading underscore, dunders excluded) are skipped unless
/// `include_private` is set.
pub fn validate(unit: &CodeUnit, _style: StyleConvention, include_private: bool) -> ValidationResult {
    let mut result = ValidationResult {
        unit: unit.qualified_name.clone(),
        violations: Vec::new(),
    };

    if unit.is_private() && !include_private {
        return result;
    }

    let doc = match &unit.doc {
        Some(d) if !d.is_empty() => d,
        _ => {
            result.violations.push(Violation {
                rule: RuleId::MissingDoc,
                severity: Severity::Error,
                message: format!("missing docstring in {} {}", unit.kind, unit.qualified_name),
                line: unit.span.start_line,
            });
            return result;
        }
    };

    let lines: Vec<&str> = doc.text.lines().collect();
    let summary = lines.first().copied().unwrap_or("").trim();

    if lines.len() > 1 && !lines[1].trim().is_empty() {
        result.violations.push(Violation {
            rule: RuleId::SummaryBlankLine,
            severity: Severity::Warning,
            message: format!(
                "docstring of {} needs a blank line after the summary",
                unit.qualified_name
            ),
            line: doc.span.start_line,
        });
    }

    if !summary.is_empty() && !summary.ends_with(['.', '!', '?']) {
        result.violations.push(Violation {
            rule: RuleId::SummaryPunctuation,
            severity: Severity::Warning,
            message: format!(
                "docstring summary of {} should end with a period",
                unit.qualified_name
            ),
            line: doc.span.start_line,
        });
    }

    if has_params_section(&doc.text) {
        let missing: Vec<&str> = unit
            .signature
            .documentable_params()
            .iter()
            .filter(|p| !param_documented(&lines, p.bare_name()))
            .map(|p| p.bare_name())
            .collect();
        if !missing.is_empty() {
            result.violations.push(Violation {
                rule: RuleId::ParamsDocumented,
                severity: Severity::Warning,
                message: format!(
                    "docstring of {} does not document parameter(s): {}",
                    unit.qualified_name,
                    missing.join(", ")
                ),
                line: doc.span.start_line,
            });
        }
    }

    if wants_returns_section(unit) && !mentions_returns(&lines) {
        result.violations.push(Violation {
            rule: RuleId::ReturnsDocumented,
            severity: Severity::Warning,
            message: format!(
                "docstring of {} omits a Returns/Yields description",
                unit.qualified_name
            ),
            line: doc.span.start_line,
        });
    }

    result
}

/// Whether the docstring has a recognized parameter section at all. The
/// parameter rule only fires for docstrings that describe parameters.
fn has_params_section(text: &str) -> bool {
    text.lines().any(|line| {
        let t = line.trim();
        matches!(t, "Args:" | "Arguments:" | "Params:" | "Parameters" | "Parameters:")
            || t.starts_with(":param")
    })
}

/// Whether one parameter is mentioned in any recognized form:
/// `name:`, `name (type):`, `name : type`, or `:param name:`.
fn param_documented(lines: &[&str], name: &str) -> bool {
    lines.iter().any(|line| {
        let t = line.trim();
        t.starts_with(&format!("{}:", name))
            || t.starts_with(&format!("{} (", name))
            || t.starts_with(&format!("{} :", name))
            || t == name
            || t.contains(&format!(":param {}:", name))
            || t.contains(&format!(" {}:", name)) && t.starts_with(":param")
    })
}

/// The return rule applies to callables whose body returns a value or
/// yields; never to classes or constructors.
fn wants_returns_section(unit: &CodeUnit) -> bool {
    if unit.kind == UnitKind::Class || unit.name() == "__init__" {
        return false;
    }
    unit.body
        .as_ref()
        .map(|b| b.has_return_value || b.has_yield)
        .unwrap_or(false)
}

fn mentions_returns(lines: &[&str]) -> bool {
    lines.iter().any(|line| {
        let t = line.trim();
        matches!(t, "Returns:" | "Returns" | "Yields:" | "Yields")
            || t.starts_with(":return")
            || t.starts_with(":rtype")
            || t.starts_with(":yield")
    })
}

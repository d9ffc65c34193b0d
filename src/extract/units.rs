//! Typed inventory of documentable units extracted from Python source.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: end.row + 1,
        }
    }

    /// Whether this span fully contains another.
    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Kind of documentable unit, resolved once at extraction time from
/// decorator names and the `async` modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Function,
    Method,
    Class,
    StaticMethod,
    ClassMethod,
    AsyncFunction,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Function => "function",
            UnitKind::Method => "method",
            UnitKind::Class => "class",
            UnitKind::StaticMethod => "static_method",
            UnitKind::ClassMethod => "class_method",
            UnitKind::AsyncFunction => "async_function",
        }
    }

    /// Check if this is a callable (anything but a class).
    pub fn is_callable(&self) -> bool {
        !matches!(self, UnitKind::Class)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One parameter in a unit's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name, including any `*`/`**` splat prefix.
    pub name: String,
    /// Type annotation text, if present.
    pub annotation: Option<String>,
    /// Whether the parameter carries a default value.
    pub has_default: bool,
}

impl Parameter {
    /// Name with any splat prefix stripped, for documentation matching.
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches('*')
    }
}

/// Ordered parameter list plus return annotation for one unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Parameter>,
    /// Return type annotation text, if present.
    pub returns: Option<String>,
    /// Raw signature text as written, without the trailing colon.
    pub text: String,
}

impl Signature {
    /// Parameters that need documenting: skips a leading `self`/`cls`.
    pub fn documentable_params(&self) -> &[Parameter] {
        match self.params.first() {
            Some(p) if p.name == "self" || p.name == "cls" => &self.params[1..],
            _ => &self.params[..],
        }
    }
}

/// An existing docstring and its exact location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocBlock {
    /// Raw literal text, quotes included.
    pub raw: String,
    /// Cleaned text: quotes stripped, continuation indent removed.
    pub text: String,
    /// Exact span of the docstring expression statement.
    pub span: Span,
}

impl DocBlock {
    /// Whether the docstring has any content after trimming.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Branch counts gathered from a unit's body.
///
/// Counted recursively, but never descending into nested function or class
/// definitions; those score independently as their own units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlowInfo {
    /// Number of if statements plus elif clauses.
    pub if_count: usize,
    /// Number of for/while statements.
    pub loop_count: usize,
    /// Number of case clauses in match statements.
    pub case_count: usize,
    /// Number of `and` operator occurrences.
    pub and_count: usize,
    /// Number of `or` operator occurrences.
    pub or_count: usize,
    /// Number of conditional (ternary) expressions.
    pub ternary_count: usize,
    /// Number of except clauses.
    pub except_count: usize,
    /// Number of comprehension `if` filter clauses.
    pub filter_count: usize,
}

impl ControlFlowInfo {
    /// Calculate cyclomatic complexity: 1 plus one per decision point.
    pub fn cyclomatic_complexity(&self) -> u32 {
        let decision_points = self.if_count
            + self.loop_count
            + self.case_count
            + self.and_count
            + self.or_count
            + self.ternary_count
            + self.except_count
            + self.filter_count;

        1 + decision_points as u32
    }
}

/// Facts about a unit's body needed for scoring, validation, and rewriting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyInfo {
    /// Span of the body block.
    pub span: Span,
    /// Whether the body starts on the signature line (`def f(): return 1`).
    pub inline: bool,
    /// Byte offset of the first body statement.
    pub first_stmt_byte: usize,
    /// Line (1-indexed) of the first body statement.
    pub first_stmt_line: usize,
    /// Number of statements in the body, comments excluded.
    pub statement_count: usize,
    /// Whether the body returns a value anywhere (not counting `return None`).
    pub has_return_value: bool,
    /// Whether the body yields anywhere.
    pub has_yield: bool,
    /// Exception types raised explicitly in the body, sorted and deduplicated.
    pub raises: Vec<String>,
    /// Branch counts for cyclomatic complexity.
    pub control_flow: ControlFlowInfo,
}

/// One documentable function, method, or class extracted from source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeUnit {
    pub kind: UnitKind,
    /// Dotted path from the file root (module -> class -> member).
    pub qualified_name: String,
    pub signature: Signature,
    /// Span of the definition node. Immutable once extracted; a pointer into
    /// the owning snapshot, never re-derived after a rewrite elsewhere.
    pub span: Span,
    /// Existing docstring, if the first body statement is a string literal.
    pub doc: Option<DocBlock>,
    /// Ordered decorator names as written.
    pub decorators: Vec<String>,
    /// Body facts; present for every unit with a parsed body block.
    pub body: Option<BodyInfo>,
    /// Leading whitespace of the definition line.
    pub indent: String,
    /// Indentation for body statements (and a rewritten docstring).
    pub body_indent: String,
}

impl CodeUnit {
    /// Last segment of the qualified name.
    pub fn name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    /// A unit counts as documented iff its docstring is non-empty after trim.
    pub fn is_documented(&self) -> bool {
        self.doc.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// Leading-underscore names are private, except dunders.
    pub fn is_private(&self) -> bool {
        let name = self.name();
        name.starts_with('_') && !(name.starts_with("__") && name.ends_with("__"))
    }
}

/// Ordered inventory of units for one file, plus the text snapshot any
/// rewrite must be validated against.
#[derive(Debug, Clone)]
pub struct FileInventory {
    /// Path of the owning file.
    pub path: String,
    /// Full text snapshot the unit spans index into.
    pub source: String,
    /// blake3 hex digest of `source`, for stale-snapshot detection.
    pub checksum: String,
    /// Units in document order; parents precede their nested children.
    pub units: Vec<CodeUnit>,
}

impl FileInventory {
    /// Find a unit by qualified name.
    pub fn unit(&self, qualified_name: &str) -> Option<&CodeUnit> {
        self.units.iter().find(|u| u.qualified_name == qualified_name)
    }

    /// Number of documented units.
    pub fn documented_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_documented()).count()
    }
}

/// Normalize docstring text the way Python's `inspect.cleandoc` does:
/// strip leading whitespace from the first line, remove the common
/// indentation of all following non-blank lines, and drop leading and
/// trailing blank lines.
pub fn cleandoc(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    // The margin is counted in characters, not bytes: indentation may mix
    // whitespace of different byte widths (tabs, NBSP), and a byte offset
    // could land mid-character.
    let margin = lines[1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    cleaned.push(lines[0].trim_start().to_string());
    for line in &lines[1..] {
        if line.trim().is_empty() {
            cleaned.push(String::new());
        } else {
            let cut = line
                .char_indices()
                .nth(margin)
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            cleaned.push(line[cut..].trim_end().to_string());
        }
    }

    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

/// Strip the quote delimiters (and any string prefix) from a string literal.
pub fn strip_string_delimiters(raw: &str) -> &str {
    let body = raw.trim_start_matches(|c: char| "rRbBuUfF".contains(c));
    for delim in ["\"\"\"", "'''", "\"", "'"] {
        if body.starts_with(delim) {
            let inner = &body[delim.len()..];
            return inner.strip_suffix(delim).unwrap_or(inner);
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleandoc_strips_margin() {
        let text = "Summary line.\n\n    Args:\n        a: first\n    ";
        assert_eq!(cleandoc(text), "Summary line.\n\nArgs:\n    a: first");
    }

    #[test]
    fn test_cleandoc_single_line() {
        assert_eq!(cleandoc("  Just a summary.  "), "Just a summary.");
        assert_eq!(cleandoc(""), "");
    }

    #[test]
    fn test_cleandoc_mixed_width_whitespace_indent() {
        // One line indented with a space, one with a two-byte NBSP: the
        // margin must be measured in characters, never byte offsets
        let text = "Summary.\n x\n\u{00A0}y";
        assert_eq!(cleandoc(text), "Summary.\nx\ny");
    }

    #[test]
    fn test_cleandoc_leading_blank_lines() {
        let text = "\n    Summary on second line.\n";
        assert_eq!(cleandoc(text), "Summary on second line.");
    }

    #[test]
    fn test_strip_string_delimiters() {
        assert_eq!(strip_string_delimiters("\"\"\"doc\"\"\""), "doc");
        assert_eq!(strip_string_delimiters("'''doc'''"), "doc");
        assert_eq!(strip_string_delimiters("'doc'"), "doc");
        assert_eq!(strip_string_delimiters("r\"\"\"raw\\doc\"\"\""), "raw\\doc");
    }

    #[test]
    fn test_documentable_params_skip_self() {
        let sig = Signature {
            params: vec![
                Parameter {
                    name: "self".to_string(),
                    annotation: None,
                    has_default: false,
                },
                Parameter {
                    name: "x".to_string(),
                    annotation: Some("int".to_string()),
                    has_default: false,
                },
            ],
            returns: None,
            text: "def m(self, x: int)".to_string(),
        };
        let docable = sig.documentable_params();
        assert_eq!(docable.len(), 1);
        assert_eq!(docable[0].name, "x");
    }

    #[test]
    fn test_cyclomatic_complexity() {
        let mut cf = ControlFlowInfo::default();
        assert_eq!(cf.cyclomatic_complexity(), 1);

        cf.if_count = 2;
        cf.loop_count = 1;
        cf.and_count = 1;
        assert_eq!(cf.cyclomatic_complexity(), 5);
    }

    #[test]
    fn test_parameter_bare_name() {
        let p = Parameter {
            name: "**kwargs".to_string(),
            annotation: None,
            has_default: false,
        };
        assert_eq!(p.bare_name(), "kwargs");
    }
}

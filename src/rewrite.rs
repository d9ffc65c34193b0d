//! In-place docstring rewriting.
//!
//! A rewrite is a text splice confined to an exact span: the old docstring
//! literal is replaced, or a new block is inserted before the first body
//! statement, and every byte outside the spliced range stays untouched.
//! Re-serializing the parse tree is explicitly off the table because it
//! would silently reformat unrelated code.
//!
//! Spans index into one specific snapshot, so a rewrite first proves the
//! current text still matches the snapshot by exact length and checksum
//! comparison. Re-parsing cannot perform that check: parsing the new
//! content says nothing about edits computed against the old content.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::error::{RewriteConflict, RewriteError};
use crate::extract::{cleandoc, line_start_byte, CodeUnit, FileInventory};

/// Splice a new docstring into the file text.
///
/// `current_text` must equal the snapshot the unit's spans were computed
/// against; otherwise a stale-snapshot conflict is returned and nothing is
/// produced. Text containing a `"""` delimiter is rejected before any edit:
/// spliced verbatim it would not parse, and escaping it would break the
/// extract round-trip. On success the new full file text is returned; the
/// caller must discard and re-extract the inventory before touching the
/// file again.
pub fn rewrite(
    inventory: &FileInventory,
    current_text: &str,
    unit: &CodeUnit,
    new_doc: &str,
) -> Result<String, RewriteError> {
    if current_text.len() != inventory.source.len()
        || blake3::hash(current_text.as_bytes()).to_hex().to_string() != inventory.checksum
    {
        return Err(RewriteConflict {
            file: inventory.path.clone(),
            snapshot_len: inventory.source.len(),
            current_len: current_text.len(),
        }
        .into());
    }

    if new_doc.contains("\"\"\"") {
        return Err(RewriteError::UnrepresentableDoc {
            unit: unit.qualified_name.clone(),
        });
    }

    let block = render_block(new_doc, &unit.body_indent);

    if let Some(doc) = &unit.doc {
        // Replace the existing literal exactly at its recorded span.
        let mut out = String::with_capacity(current_text.len() + block.len());
        out.push_str(&current_text[..doc.span.start_byte]);
        out.push_str(&block);
        out.push_str(&current_text[doc.span.end_byte..]);
        return Ok(out);
    }

    // Insert before the first body statement.
    let body = match &unit.body {
        Some(b) => b,
        None => return Ok(current_text.to_string()),
    };

    let mut out = String::with_capacity(current_text.len() + block.len() + 16);
    if body.inline {
        // `def f(): return 1` - bridge onto a new line, then re-indent the
        // original statement. The space after the colon would otherwise
        // become trailing whitespace on the signature line.
        out.push_str(current_text[..body.first_stmt_byte].trim_end_matches([' ', '\t']));
        out.push('\n');
        out.push_str(&unit.body_indent);
        out.push_str(&block);
        out.push('\n');
        out.push_str(&unit.body_indent);
        out.push_str(&current_text[body.first_stmt_byte..]);
    } else {
        let at = line_start_byte(current_text, body.first_stmt_byte);
        out.push_str(&current_text[..at]);
        out.push_str(&unit.body_indent);
        out.push_str(&block);
        out.push('\n');
        out.push_str(&current_text[at..]);
    }
    Ok(out)
}

/// Render the documentation text as an indented triple-quoted literal.
/// The first line carries no indent: it lands at the span's column.
fn render_block(text: &str, indent: &str) -> String {
    let cleaned = cleandoc(text);
    let lines: Vec<&str> = cleaned.lines().collect();

    if lines.len() <= 1 {
        if cleaned.ends_with('"') {
            // A quote butted against the closing delimiter would tokenize
            // as four quotes; close on the next line instead.
            return format!("\"\"\"{}\n{}\"\"\"", cleaned, indent);
        }
        return format!("\"\"\"{}\"\"\"", cleaned);
    }

    let mut out = String::from("\"\"\"");
    out.push_str(lines[0]);
    for line in &lines[1..] {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
    }
    out.push('\n');
    out.push_str(indent);
    out.push_str("\"\"\"");
    out
}

/// Per-path advisory locks serializing rewrites to the same file.
///
/// Two concurrent rewrites against one path both read-then-write the same
/// text; without serialization a lost update is possible. Locks for
/// different paths are independent.
pub struct LockRegistry {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static LockRegistry {
        static GLOBAL: Lazy<LockRegistry> = Lazy::new(LockRegistry::new);
        &GLOBAL
    }

    /// Get (or create) the lock for a path.
    pub fn lock_for<P: AsRef<Path>>(&self, path: P) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(path.as_ref().to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;
    use std::path::Path;

    fn extract_one(source: &str) -> FileInventory {
        extract::extract(Path::new("test.py"), source).unwrap()
    }

    #[test]
    fn test_insert_roundtrip() {
        let source = "def add(a, b):\n    return a + b\n";
        let inv = extract_one(source);
        let unit = inv.unit("add").unwrap();
        let doc = "Adds two numbers.\n\nArgs:\n    a: first\n    b: second\n\nReturns:\n    sum";

        let new_text = rewrite(&inv, source, unit, doc).unwrap();

        let reparsed = extract_one(&new_text);
        let after = reparsed.unit("add").unwrap();
        assert!(after.is_documented());
        assert_eq!(after.doc.as_ref().unwrap().text, doc);
    }

    #[test]
    fn test_insert_into_inline_body() {
        let source = "def add(a, b): return a + b\n";
        let inv = extract_one(source);
        let unit = inv.unit("add").unwrap();

        let new_text = rewrite(&inv, source, unit, "Adds two numbers.").unwrap();

        let reparsed = extract_one(&new_text);
        let after = reparsed.unit("add").unwrap();
        assert_eq!(after.doc.as_ref().unwrap().text, "Adds two numbers.");
        // Body statement survives on its own line, and the signature line
        // carries no trailing whitespace
        assert!(new_text.starts_with("def add(a, b):\n"));
        assert!(new_text.contains("\n        return a + b") || new_text.contains("\n    return a + b"));
    }

    #[test]
    fn test_replace_existing_doc() {
        let source = r#"def f():
    """Old summary."""
    return 1
"#;
        let inv = extract_one(source);
        let unit = inv.unit("f").unwrap();

        let new_text = rewrite(&inv, source, unit, "New summary.").unwrap();
        assert!(!new_text.contains("Old summary."));

        let reparsed = extract_one(&new_text);
        assert_eq!(
            reparsed.unit("f").unwrap().doc.as_ref().unwrap().text,
            "New summary."
        );
    }

    #[test]
    fn test_bytes_outside_span_untouched() {
        let source = r#"import os


def before():
    return os.sep


def target():
    """Old."""
    return 2


def after(x):
    if x:
        return x
"#;
        let inv = extract_one(source);
        let unit = inv.unit("target").unwrap();
        let span = unit.doc.as_ref().unwrap().span.clone();

        let new_text = rewrite(&inv, source, unit, "New and improved.").unwrap();

        // Everything before the spliced span is byte-identical, and
        // everything after shifted but unchanged.
        assert_eq!(&new_text[..span.start_byte], &source[..span.start_byte]);
        let old_tail = &source[span.end_byte..];
        assert!(new_text.ends_with(old_tail));
    }

    #[test]
    fn test_nested_indentation() {
        let source = r#"class C:
    def m(self):
        return 1
"#;
        let inv = extract_one(source);
        let unit = inv.unit("C.m").unwrap();

        let new_text = rewrite(&inv, source, unit, "Does m.\n\nReturns:\n    one").unwrap();
        assert!(new_text.contains("        \"\"\"Does m."));

        let reparsed = extract_one(&new_text);
        assert_eq!(
            reparsed.unit("C.m").unwrap().doc.as_ref().unwrap().text,
            "Does m.\n\nReturns:\n    one"
        );
    }

    #[test]
    fn test_conflict_on_stale_snapshot() {
        let source = "def f():\n    pass\n";
        let inv = extract_one(source);
        let unit = inv.unit("f").unwrap();

        let edited = "def f():\n    pass  # changed\n";
        let err = rewrite(&inv, edited, unit, "Doc.").unwrap_err();
        match err {
            RewriteError::Conflict(c) => {
                assert_eq!(c.snapshot_len, source.len());
                assert_eq!(c.current_len, edited.len());
            }
            other => panic!("expected a stale-snapshot conflict, got {other}"),
        }
    }

    #[test]
    fn test_conflict_on_same_length_different_content() {
        let source = "def f():\n    pass\n";
        let inv = extract_one(source);
        let unit = inv.unit("f").unwrap();

        let edited = "def g():\n    pass\n";
        assert_eq!(edited.len(), source.len());
        assert!(rewrite(&inv, edited, unit, "Doc.").is_err());
    }

    #[test]
    fn test_embedded_triple_quote_is_rejected() {
        let source = "def f():\n    return 1\n";
        let inv = extract_one(source);
        let unit = inv.unit("f").unwrap();

        let err = rewrite(&inv, source, unit, "Uses \"\"\" inside.").unwrap_err();
        assert!(matches!(err, RewriteError::UnrepresentableDoc { .. }));
    }

    #[test]
    fn test_trailing_quote_still_parses() {
        let source = "def f(x):\n    return x\n";
        let inv = extract_one(source);
        let unit = inv.unit("f").unwrap();

        let new_text = rewrite(&inv, source, unit, "Echoes \"x\"").unwrap();
        // extract_one unwraps, so unparseable output fails here
        let reparsed = extract_one(&new_text);
        assert_eq!(
            reparsed.unit("f").unwrap().doc.as_ref().unwrap().text,
            "Echoes \"x\""
        );
    }

    #[test]
    fn test_lock_registry_same_path_same_lock() {
        let registry = LockRegistry::new();
        let a = registry.lock_for("x.py");
        let b = registry.lock_for("x.py");
        assert!(Arc::ptr_eq(&a, &b));
        let c = registry.lock_for("y.py");
        assert!(!Arc::ptr_eq(&a, &c));
    }
}

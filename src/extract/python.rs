//! Python structural extractor using tree-sitter.
//!
//! Walks the AST and emits a `CodeUnit` for every function, method, and
//! class definition, capturing signatures, decorators, docstring spans,
//! and the body facts the analyzers downstream consume. Nested functions
//! are extracted as independent units with dotted qualified names.

use std::path::Path;

use tree_sitter::{Language, Node, Parser};

use crate::error::ParseError;
use crate::extract::units::{
    cleandoc, strip_string_delimiters, BodyInfo, CodeUnit, ControlFlowInfo, DocBlock,
    FileInventory, Parameter, Signature, Span, UnitKind,
};

pub struct PythonExtractor {
    language: Language,
}

impl PythonExtractor {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Extract a full inventory from one file's source text.
    ///
    /// Any syntax error fails the whole file; there is no partial recovery.
    /// Failed files must be excluded from coverage, not counted as
    /// zero-documented.
    pub fn extract(&self, path: &Path, source: &str) -> Result<FileInventory, ParseError> {
        let file = path.to_string_lossy().to_string();

        let mut parser = Parser::new();
        parser.set_language(&self.language).map_err(|_| ParseError {
            file: file.clone(),
            line: None,
        })?;

        let tree = parser.parse(source, None).ok_or_else(|| ParseError {
            file: file.clone(),
            line: None,
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(ParseError {
                line: first_error_line(root),
                file,
            });
        }

        let mut units = Vec::new();
        let mut scope = Vec::new();
        self.collect_units(root, source, &mut scope, false, &mut units);

        Ok(FileInventory {
            path: file,
            checksum: blake3::hash(source.as_bytes()).to_hex().to_string(),
            source: source.to_string(),
            units,
        })
    }

    /// Walk a scope looking for definitions, descending into compound
    /// statements (a `def` inside an `if` block is still a unit).
    fn collect_units(
        &self,
        node: Node,
        src: &str,
        scope: &mut Vec<String>,
        in_class: bool,
        out: &mut Vec<CodeUnit>,
    ) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "decorated_definition" => {
                    let decorators = decorator_names(child, src);
                    if let Some(def) = child.child_by_field_name("definition") {
                        self.emit_unit(def, decorators, src, scope, in_class, out);
                    }
                }
                "function_definition" | "class_definition" => {
                    self.emit_unit(child, Vec::new(), src, scope, in_class, out);
                }
                _ => self.collect_units(child, src, scope, in_class, out),
            }
        }
    }

    fn emit_unit(
        &self,
        def: Node,
        decorators: Vec<String>,
        src: &str,
        scope: &mut Vec<String>,
        in_class: bool,
        out: &mut Vec<CodeUnit>,
    ) {
        let name_node = match def.child_by_field_name("name") {
            Some(n) => n,
            None => return,
        };
        let name = node_text(name_node, src).to_string();
        let qualified_name = if scope.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", scope.join("."), name)
        };

        let is_class = def.kind() == "class_definition";
        let is_async = def
            .child(0)
            .map(|c| c.kind() == "async")
            .unwrap_or(false);
        let kind = classify_kind(is_class, is_async, in_class, &decorators);

        let body_node = def.child_by_field_name("body");
        let indent = line_indent(src, def.start_byte());

        let sig_end = body_node.map(|b| b.start_byte()).unwrap_or(def.end_byte());
        let sig_text = src[def.start_byte()..sig_end]
            .trim_end()
            .trim_end_matches(':')
            .trim_end()
            .to_string();
        let signature = if is_class {
            Signature {
                params: Vec::new(),
                returns: None,
                text: sig_text,
            }
        } else {
            Signature {
                params: parse_parameters(def, src),
                returns: def
                    .child_by_field_name("return_type")
                    .map(|n| node_text(n, src).to_string()),
                text: sig_text,
            }
        };

        let (doc, body, body_indent) = match body_node {
            Some(block) => {
                let first_byte = block.start_byte();
                let line_start = line_start_byte(src, first_byte);
                let leading = &src[line_start..first_byte];
                let inline = !leading.trim().is_empty();
                let body_indent = if inline {
                    format!("{}    ", indent)
                } else {
                    leading.to_string()
                };

                let mut cursor = block.walk();
                let statement_count = block
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() != "comment")
                    .count();

                let mut info = BodyInfo {
                    span: Span::from_node(block),
                    inline,
                    first_stmt_byte: first_byte,
                    first_stmt_line: block.start_position().row + 1,
                    statement_count,
                    has_return_value: false,
                    has_yield: false,
                    raises: Vec::new(),
                    control_flow: ControlFlowInfo::default(),
                };
                scan_body(block, src, &mut info);
                info.raises.sort();
                info.raises.dedup();

                (extract_doc(block, src), Some(info), body_indent)
            }
            None => (None, None, format!("{}    ", indent)),
        };

        out.push(CodeUnit {
            kind,
            qualified_name,
            signature,
            span: Span::from_node(def),
            doc,
            decorators,
            body,
            indent,
            body_indent,
        });

        // Nested definitions are independent units, not excluded for being
        // "inner" functions.
        if let Some(block) = body_node {
            scope.push(name);
            self.collect_units(block, src, scope, is_class, out);
            scope.pop();
        }
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the unit kind from static decorator names and modifiers.
fn classify_kind(is_class: bool, is_async: bool, in_class: bool, decorators: &[String]) -> UnitKind {
    if is_class {
        return UnitKind::Class;
    }
    let has = |want: &str| {
        decorators.iter().any(|d| {
            let base = d.split('(').next().unwrap_or(d);
            base.rsplit('.').next() == Some(want)
        })
    };
    if has("staticmethod") {
        UnitKind::StaticMethod
    } else if has("classmethod") {
        UnitKind::ClassMethod
    } else if is_async {
        UnitKind::AsyncFunction
    } else if in_class {
        UnitKind::Method
    } else {
        UnitKind::Function
    }
}

/// Decorator expressions of a decorated definition, without the `@`.
fn decorator_names(decorated: Node, src: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = decorated.walk();
    for child in decorated.named_children(&mut cursor) {
        if child.kind() == "decorator" {
            if let Some(expr) = child.named_child(0) {
                names.push(node_text(expr, src).to_string());
            }
        }
    }
    names
}

/// Parse the ordered parameter list of a function definition.
fn parse_parameters(def: Node, src: &str) -> Vec<Parameter> {
    let params_node = match def.child_by_field_name("parameters") {
        Some(n) => n,
        None => return Vec::new(),
    };

    let mut params = Vec::new();
    let mut cursor = params_node.walk();
    for child in params_node.named_children(&mut cursor) {
        match child.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" | "tuple_pattern" => {
                params.push(Parameter {
                    name: node_text(child, src).to_string(),
                    annotation: None,
                    has_default: false,
                });
            }
            "typed_parameter" => {
                let name = child
                    .named_child(0)
                    .map(|n| node_text(n, src).to_string())
                    .unwrap_or_default();
                params.push(Parameter {
                    name,
                    annotation: child
                        .child_by_field_name("type")
                        .map(|n| node_text(n, src).to_string()),
                    has_default: false,
                });
            }
            "default_parameter" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, src).to_string())
                    .unwrap_or_default();
                params.push(Parameter {
                    name,
                    annotation: None,
                    has_default: true,
                });
            }
            "typed_default_parameter" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, src).to_string())
                    .unwrap_or_default();
                params.push(Parameter {
                    name,
                    annotation: child
                        .child_by_field_name("type")
                        .map(|n| node_text(n, src).to_string()),
                    has_default: true,
                });
            }
            // "*" and "/" markers carry no name
            "keyword_separator" | "positional_separator" => {}
            _ => {}
        }
    }
    params
}

/// The docstring is the string literal sitting as the first body statement.
fn extract_doc(block: Node, src: &str) -> Option<DocBlock> {
    let first = block.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.child(0)?;
    if string.kind() != "string" {
        return None;
    }
    let raw = node_text(string, src).to_string();
    let text = cleandoc(strip_string_delimiters(&raw));
    Some(DocBlock {
        text,
        span: Span::from_node(string),
        raw,
    })
}

/// Gather control flow, return/yield, and raise facts from a body,
/// stopping at nested function/class definitions: those are scored
/// independently as their own units.
fn scan_body(node: Node, src: &str, info: &mut BodyInfo) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" | "class_definition" | "decorated_definition" => continue,
            "if_statement" | "elif_clause" => info.control_flow.if_count += 1,
            "for_statement" | "while_statement" => info.control_flow.loop_count += 1,
            "case_clause" => info.control_flow.case_count += 1,
            "conditional_expression" => info.control_flow.ternary_count += 1,
            "except_clause" | "except_group_clause" => info.control_flow.except_count += 1,
            "if_clause" => info.control_flow.filter_count += 1,
            "boolean_operator" => {
                match child.child_by_field_name("operator").map(|n| node_text(n, src)) {
                    Some("and") => info.control_flow.and_count += 1,
                    Some("or") => info.control_flow.or_count += 1,
                    _ => {}
                }
            }
            "return_statement" => {
                if let Some(value) = child.named_child(0) {
                    if node_text(value, src) != "None" {
                        info.has_return_value = true;
                    }
                }
            }
            "yield" => info.has_yield = true,
            "raise_statement" => {
                if let Some(name) = raised_exception(child, src) {
                    info.raises.push(name);
                }
            }
            _ => {}
        }
        scan_body(child, src, info);
    }
}

/// Exception type name from a raise statement, when statically visible.
fn raised_exception(raise: Node, src: &str) -> Option<String> {
    let exc = raise.named_child(0)?;
    let target = match exc.kind() {
        "call" => exc.child_by_field_name("function")?,
        _ => exc,
    };
    match target.kind() {
        "identifier" => Some(node_text(target, src).to_string()),
        "attribute" => target
            .child_by_field_name("attribute")
            .map(|n| node_text(n, src).to_string()),
        _ => None,
    }
}

/// Line of the first ERROR or MISSING node, for ParseError reporting.
fn first_error_line(root: Node) -> Option<usize> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push(child);
            }
        }
    }
    None
}

fn node_text<'a>(node: Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or("")
}

/// Leading whitespace of the line containing `byte`.
fn line_indent(src: &str, byte: usize) -> String {
    let start = line_start_byte(src, byte);
    src[start..byte]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Byte offset of the start of the line containing `byte`.
pub(crate) fn line_start_byte(src: &str, byte: usize) -> usize {
    src[..byte].rfind('\n').map(|p| p + 1).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> FileInventory {
        PythonExtractor::new()
            .extract(Path::new("test.py"), source)
            .unwrap()
    }

    #[test]
    fn test_extract_functions_and_classes() {
        let inv = extract(
            r#"
def top(x, y=1):
    return x + y

class Widget:
    """A widget."""

    def render(self):
        pass
"#,
        );

        let names: Vec<&str> = inv.units.iter().map(|u| u.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["top", "Widget", "Widget.render"]);

        let top = inv.unit("top").unwrap();
        assert_eq!(top.kind, UnitKind::Function);
        assert_eq!(top.signature.params.len(), 2);
        assert!(top.signature.params[1].has_default);
        assert!(!top.is_documented());

        let widget = inv.unit("Widget").unwrap();
        assert_eq!(widget.kind, UnitKind::Class);
        assert!(widget.is_documented());
        assert_eq!(widget.doc.as_ref().unwrap().text, "A widget.");

        let render = inv.unit("Widget.render").unwrap();
        assert_eq!(render.kind, UnitKind::Method);
    }

    #[test]
    fn test_decorator_kinds() {
        let inv = extract(
            r#"
class Box:
    @staticmethod
    def make():
        pass

    @classmethod
    def of(cls, value):
        pass

    @functools.lru_cache(maxsize=8)
    def cached(self):
        pass

async def fetch(url):
    pass
"#,
        );

        assert_eq!(inv.unit("Box.make").unwrap().kind, UnitKind::StaticMethod);
        assert_eq!(inv.unit("Box.of").unwrap().kind, UnitKind::ClassMethod);
        assert_eq!(inv.unit("Box.cached").unwrap().kind, UnitKind::Method);
        assert_eq!(inv.unit("fetch").unwrap().kind, UnitKind::AsyncFunction);

        let cached = inv.unit("Box.cached").unwrap();
        assert_eq!(cached.decorators, vec!["functools.lru_cache(maxsize=8)"]);
    }

    #[test]
    fn test_nested_functions_are_units() {
        let inv = extract(
            r#"
def outer():
    def inner(a):
        if a:
            return a
    return inner
"#,
        );

        let names: Vec<&str> = inv.units.iter().map(|u| u.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["outer", "outer.inner"]);

        // Sibling/child span containment invariant
        let outer = inv.unit("outer").unwrap();
        let inner = inv.unit("outer.inner").unwrap();
        assert!(outer.span.contains(&inner.span));

        // The inner if must not leak into outer's control flow
        assert_eq!(outer.body.as_ref().unwrap().control_flow.if_count, 0);
        assert_eq!(inner.body.as_ref().unwrap().control_flow.if_count, 1);
    }

    #[test]
    fn test_multi_line_signature() {
        let inv = extract(
            r#"
def configure(
    host: str,
    port: int = 8080,
    *args,
    **kwargs,
) -> bool:
    return True
"#,
        );

        let unit = inv.unit("configure").unwrap();
        let names: Vec<&str> = unit.signature.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["host", "port", "*args", "**kwargs"]);
        assert_eq!(unit.signature.params[0].annotation.as_deref(), Some("str"));
        assert!(unit.signature.params[1].has_default);
        assert_eq!(unit.signature.returns.as_deref(), Some("bool"));
        assert!(unit.body.as_ref().unwrap().has_return_value);
    }

    #[test]
    fn test_docstring_span_and_text() {
        let source = r#"
def greet(name):
    """Say hello.

    Args:
        name: who to greet
    """
    print(name)
"#;
        let inv = extract(source);
        let unit = inv.unit("greet").unwrap();
        let doc = unit.doc.as_ref().unwrap();

        assert!(doc.raw.starts_with("\"\"\""));
        assert_eq!(doc.text, "Say hello.\n\nArgs:\n    name: who to greet");
        // The span points exactly at the literal in the snapshot
        assert_eq!(&source[doc.span.start_byte..doc.span.end_byte], doc.raw);
    }

    #[test]
    fn test_docstring_with_multibyte_whitespace_indent() {
        // NBSP indentation inside the literal must not break extraction
        let inv = extract("def f():\n    \"\"\"Summary.\n x\n\u{00A0}y\"\"\"\n    pass\n");
        let doc = inv.unit("f").unwrap().doc.as_ref().unwrap();
        assert_eq!(doc.text, "Summary.\nx\ny");
    }

    #[test]
    fn test_inline_body() {
        let inv = extract("def add(a, b): return a + b\n");
        let unit = inv.unit("add").unwrap();
        let body = unit.body.as_ref().unwrap();
        assert!(body.inline);
        assert!(unit.doc.is_none());
        assert_eq!(unit.body_indent, "    ");
    }

    #[test]
    fn test_raises_collection() {
        let inv = extract(
            r#"
def guard(x):
    if x < 0:
        raise ValueError("negative")
    if x > 100:
        raise errors.RangeError("too big")
    raise ValueError("unreachable")
"#,
        );
        let body = inv.unit("guard").unwrap().body.as_ref().unwrap();
        assert_eq!(body.raises, vec!["RangeError", "ValueError"]);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = PythonExtractor::new()
            .extract(Path::new("bad.py"), "def broken(:\n    pass\n")
            .unwrap_err();
        assert_eq!(err.file, "bad.py");
        assert!(err.line.is_some());
    }

    #[test]
    fn test_extract_is_idempotent() {
        let source = r#"
class A:
    def m(self):
        """Doc."""
        return 1

def f():
    pass
"#;
        let first = extract(source);
        let second = extract(source);
        assert_eq!(first.checksum, second.checksum);
        assert_eq!(first.units.len(), second.units.len());
        for (a, b) in first.units.iter().zip(second.units.iter()) {
            assert_eq!(a.qualified_name, b.qualified_name);
            assert_eq!(a.span, b.span);
            assert_eq!(a.kind, b.kind);
        }
    }
}

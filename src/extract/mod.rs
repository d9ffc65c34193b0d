//! Structural extraction of documentable units from Python source.
//!
//! `extract` turns one file's text into a `FileInventory`: an ordered list
//! of `CodeUnit`s plus the text snapshot their spans index into. The
//! inventory is discarded after any rewrite to the file; the next read
//! re-extracts from the written text, so the inventory never drifts from
//! on-disk content.

mod python;
mod units;

pub use python::PythonExtractor;
pub(crate) use python::line_start_byte;
pub use units::{
    cleandoc, strip_string_delimiters, BodyInfo, CodeUnit, ControlFlowInfo, DocBlock,
    FileInventory, Parameter, Signature, Span, UnitKind,
};

use std::path::Path;

use crate::error::ParseError;

/// Extract a file inventory from source text.
pub fn extract(path: &Path, source: &str) -> Result<FileInventory, ParseError> {
    PythonExtractor::new().extract(path, source)
}

//! Seam for the external documentation generator.
//!
//! Text generation is not this crate's business: the backend is an opaque
//! collaborator that takes a unit's context and either produces a docstring
//! or fails. A `GenerationError` must reach the caller as a visible
//! failure; the unit stays "missing" and is never padded with empty text.

use serde::{Deserialize, Serialize};

use crate::complexity;
use crate::config::StyleConvention;
use crate::error::GenerationError;
use crate::extract::CodeUnit;

/// Everything a generator backend gets to see about a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitContext {
    pub qualified_name: String,
    /// Raw signature text as written in the source.
    pub signature: String,
    pub complexity: u32,
    pub style: StyleConvention,
    /// Exception types the body raises, for a Raises section.
    pub raises: Vec<String>,
    /// Existing docstring text, if any, for regeneration prompts.
    pub existing_doc: Option<String>,
}

impl UnitContext {
    pub fn for_unit(unit: &CodeUnit, style: StyleConvention) -> Self {
        Self {
            qualified_name: unit.qualified_name.clone(),
            signature: unit.signature.text.clone(),
            complexity: complexity::score(unit),
            style,
            raises: unit
                .body
                .as_ref()
                .map(|b| b.raises.clone())
                .unwrap_or_default(),
            existing_doc: unit.doc.as_ref().map(|d| d.text.clone()),
        }
    }
}

/// External documentation generator.
pub trait DocGenerator {
    /// Produce a docstring body for the given unit context.
    fn generate(&self, ctx: &UnitContext) -> Result<String, GenerationError>;
}

impl<F> DocGenerator for F
where
    F: Fn(&UnitContext) -> Result<String, GenerationError>,
{
    fn generate(&self, ctx: &UnitContext) -> Result<String, GenerationError> {
        self(ctx)
    }
}

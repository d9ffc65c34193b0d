//! Cyclomatic complexity scoring.
//!
//! The score starts at 1 (one linear path) and adds one per decision point
//! found in the unit's body: each if/elif clause, each loop, each except
//! clause, each boolean operator occurrence beyond the first operand, each
//! case arm, each ternary expression, and each comprehension filter clause.
//! Branches inside nested function/class definitions never count here;
//! those units are scored independently.

use crate::extract::CodeUnit;

/// Score a unit's body. Purely structural; the code is never executed.
///
/// A unit with an empty or pass-only body scores exactly 1. A class body
/// rarely has branches of its own (its methods are separate units), so
/// classes usually score 1 as well.
pub fn score(unit: &CodeUnit) -> u32 {
    unit.body
        .as_ref()
        .map(|b| b.control_flow.cyclomatic_complexity())
        .unwrap_or(1)
}

//! Coverage aggregation over file inventories.
//!
//! A unit counts as documented iff its docstring is non-empty after
//! trimming. Aggregation and filtering are pure projections: they never
//! mutate an inventory and return the same results for repeated calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::extract::{CodeUnit, FileInventory};

/// Documented/total counts for one slice of the inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub total: usize,
    pub documented: usize,
}

impl Counts {
    fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            round2(self.documented as f64 / self.total as f64 * 100.0)
        }
    }
}

/// Per-file coverage breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCoverage {
    pub path: String,
    pub total: usize,
    pub documented: usize,
    pub percent: f64,
}

/// Aggregate coverage over one or more file inventories. Derived and
/// recomputed on demand, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageSnapshot {
    pub total_units: usize,
    pub documented_units: usize,
    pub percent: f64,
    /// Breakdown keyed by unit kind.
    pub by_kind: BTreeMap<String, Counts>,
    /// Breakdown per file, in input order.
    pub files: Vec<FileCoverage>,
}

/// Documentation status filter for unit projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Missing,
    Documented,
}

impl StatusFilter {
    fn matches(&self, unit: &CodeUnit) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Missing => !unit.is_documented(),
            StatusFilter::Documented => unit.is_documented(),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "missing" => Ok(StatusFilter::Missing),
            "documented" => Ok(StatusFilter::Documented),
            _ => Err(format!("unknown status filter: {}", s)),
        }
    }
}

/// Compute a coverage snapshot over the given inventories.
///
/// Files that failed to parse never reach this function; they are excluded
/// from coverage entirely rather than counted as zero-documented.
pub fn aggregate(inventories: &[FileInventory]) -> CoverageSnapshot {
    let mut total = Counts::default();
    let mut by_kind: BTreeMap<String, Counts> = BTreeMap::new();
    let mut files = Vec::with_capacity(inventories.len());

    for inv in inventories {
        let documented = inv.documented_count();
        files.push(FileCoverage {
            path: inv.path.clone(),
            total: inv.units.len(),
            documented,
            percent: Counts {
                total: inv.units.len(),
                documented,
            }
            .percent(),
        });

        for unit in &inv.units {
            total.total += 1;
            let kind = by_kind.entry(unit.kind.as_str().to_string()).or_default();
            kind.total += 1;
            if unit.is_documented() {
                total.documented += 1;
                kind.documented += 1;
            }
        }
    }

    CoverageSnapshot {
        total_units: total.total,
        documented_units: total.documented,
        percent: total.percent(),
        by_kind,
        files,
    }
}

/// Project the units of one inventory by status and free-text query.
///
/// The query matches against the qualified name or the signature text.
pub fn filter_units<'a>(
    inventory: &'a FileInventory,
    status: StatusFilter,
    query: Option<&str>,
) -> Vec<&'a CodeUnit> {
    inventory
        .units
        .iter()
        .filter(|u| status.matches(u))
        .filter(|u| match query {
            Some(q) => {
                let q = q.to_lowercase();
                u.qualified_name.to_lowercase().contains(&q)
                    || u.signature.text.to_lowercase().contains(&q)
            }
            None => true,
        })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;
    use std::path::Path;

    const DOCUMENTED: &str = r#"
def a():
    """Does a."""

def b():
    """Does b."""

class C:
    """Holds c."""
"#;

    const UNDOCUMENTED: &str = r#"
def x():
    pass

def y():
    pass
"#;

    fn inventories() -> Vec<FileInventory> {
        vec![
            extract::extract(Path::new("full.py"), DOCUMENTED).unwrap(),
            extract::extract(Path::new("empty.py"), UNDOCUMENTED).unwrap(),
        ]
    }

    #[test]
    fn test_aggregate_sixty_percent() {
        let snapshot = aggregate(&inventories());
        assert_eq!(snapshot.total_units, 5);
        assert_eq!(snapshot.documented_units, 3);
        assert_eq!(snapshot.percent, 60.0);

        assert_eq!(snapshot.files[0].percent, 100.0);
        assert_eq!(snapshot.files[1].percent, 0.0);
    }

    #[test]
    fn test_by_kind_breakdown() {
        let snapshot = aggregate(&inventories());
        assert_eq!(snapshot.by_kind["function"].total, 4);
        assert_eq!(snapshot.by_kind["function"].documented, 2);
        assert_eq!(snapshot.by_kind["class"].total, 1);
        assert_eq!(snapshot.by_kind["class"].documented, 1);
    }

    #[test]
    fn test_undocumented_never_counts_as_documented() {
        let invs = inventories();
        let snapshot = aggregate(&invs);
        assert!(snapshot.documented_units < snapshot.total_units);

        let missing = filter_units(&invs[1], StatusFilter::Missing, None);
        assert_eq!(missing.len(), 2);
        let documented = filter_units(&invs[1], StatusFilter::Documented, None);
        assert!(documented.is_empty());
    }

    #[test]
    fn test_filters_are_pure() {
        let invs = inventories();
        let first = filter_units(&invs[0], StatusFilter::All, Some("a"));
        let second = filter_units(&invs[0], StatusFilter::All, Some("a"));
        let names_first: Vec<&str> = first.iter().map(|u| u.qualified_name.as_str()).collect();
        let names_second: Vec<&str> = second.iter().map(|u| u.qualified_name.as_str()).collect();
        assert_eq!(names_first, names_second);
        assert_eq!(invs[0].units.len(), 3);
    }

    #[test]
    fn test_query_matches_signature_text() {
        let inv = extract::extract(
            Path::new("q.py"),
            "def handler(request, timeout=30):\n    pass\n",
        )
        .unwrap();
        let hits = filter_units(&inv, StatusFilter::All, Some("timeout"));
        assert_eq!(hits.len(), 1);
        let misses = filter_units(&inv, StatusFilter::All, Some("nomatch"));
        assert!(misses.is_empty());
    }

    #[test]
    fn test_empty_aggregate() {
        let snapshot = aggregate(&[]);
        assert_eq!(snapshot.total_units, 0);
        assert_eq!(snapshot.percent, 0.0);
    }
}

//! Read-only access to the review decision log.
//!
//! Prior accept/reject decisions are persisted outside this core as a JSON
//! list. The log is an explicit store object handed to whoever needs it,
//! never a process-wide singleton, and this crate only reads it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Outcome of a past review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Rejected,
}

/// One recorded review decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEntry {
    /// Unit identity: "path::qualified_name".
    pub unit: String,
    pub decision: Decision,
    /// RFC 3339 timestamp, as recorded by the reviewing frontend.
    pub timestamp: String,
}

/// The persisted review log.
#[derive(Debug, Clone, Default)]
pub struct ReviewLog {
    entries: Vec<ReviewEntry>,
}

impl ReviewLog {
    /// Load a log from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let entries: Vec<ReviewEntry> = serde_json::from_str(&content)?;
        Ok(Self { entries })
    }

    /// Latest decision for a unit, if any was recorded.
    pub fn decision_for(&self, unit: &str) -> Option<&ReviewEntry> {
        self.entries.iter().rev().find(|e| e.unit == unit)
    }

    pub fn entries(&self) -> &[ReviewEntry] {
        &self.entries
    }

    /// Unit identity key used by the log.
    pub fn unit_key(file: &str, qualified_name: &str) -> String {
        format!("{}::{}", file, qualified_name)
    }
}

//! Project configuration for docguard.
//!
//! A `.docguard.yaml` at the project root sets the docstring style
//! convention, paths to exclude from scans, and the coverage gate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names to search for, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &[".docguard.yaml", "docguard.yaml"];

/// Docstring style convention. Informational metadata: the validator checks
/// convention-independent structural rules; the style is carried into the
/// generator context and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleConvention {
    #[default]
    Google,
    Numpy,
    Rest,
}

impl StyleConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleConvention::Google => "google",
            StyleConvention::Numpy => "numpy",
            StyleConvention::Rest => "rest",
        }
    }
}

impl fmt::Display for StyleConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StyleConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(StyleConvention::Google),
            "numpy" => Ok(StyleConvention::Numpy),
            "rest" | "sphinx" => Ok(StyleConvention::Rest),
            _ => Err(format!("unknown style convention: {}", s)),
        }
    }
}

/// Top-level project configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Docstring style convention (default: google).
    #[serde(default)]
    pub style: StyleConvention,
    /// Glob patterns for paths to exclude from scans
    /// (e.g., "**/migrations/**", "**/build/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Minimum acceptable documentation coverage percentage; `check` exits
    /// non-zero when coverage falls below it.
    #[serde(default)]
    pub min_coverage: Option<f64>,
    /// Whether the validator also checks private (`_name`) units.
    /// Default: false, matching common docstring linters.
    #[serde(default)]
    pub include_private: Option<bool>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Discover a config file in the current directory, falling back to
    /// defaults when none exists.
    pub fn discover() -> anyhow::Result<Self> {
        for name in DEFAULT_CONFIG_NAMES {
            let path = PathBuf::from(name);
            if path.exists() {
                return Self::parse_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Whether the validator should also cover private units.
    pub fn should_include_private(&self) -> bool {
        self.include_private.unwrap_or(false)
    }

    /// Check if a path matches any excluded_paths pattern.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();
        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                if glob.compile_matcher().is_match(&*path_str) {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
style: numpy
excluded_paths:
  - "**/migrations/**"
min_coverage: 80.0
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.style, StyleConvention::Numpy);
        assert_eq!(config.min_coverage, Some(80.0));
        assert!(!config.should_include_private());
    }

    #[test]
    fn test_path_exclusion() {
        let config = Config {
            excluded_paths: vec!["**/migrations/**".to_string()],
            ..Default::default()
        };
        assert!(config.is_path_excluded(Path::new("app/migrations/0001_init.py")));
        assert!(!config.is_path_excluded(Path::new("app/models.py")));
    }

    #[test]
    fn test_style_from_str() {
        assert_eq!("Google".parse::<StyleConvention>().unwrap(), StyleConvention::Google);
        assert_eq!("sphinx".parse::<StyleConvention>().unwrap(), StyleConvention::Rest);
        assert!("markdown".parse::<StyleConvention>().is_err());
    }
}

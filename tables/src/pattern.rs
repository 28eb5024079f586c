use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Represents the kind of table a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    B,
    D,
    CodeFlag,
}

impl TableKind {
    pub fn as_str(&self) -> &str {
        match self {
            TableKind::B => "b",
            TableKind::D => "d",
            TableKind::CodeFlag => "codeflag",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "b" | "tableb" => Some(TableKind::B),
            "d" | "tabled" => Some(TableKind::D),
            "f" | "codeflag" => Some(TableKind::CodeFlag),
            _ => None,
        }
    }
}

/// Metadata extracted from a table filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    pub kind: TableKind,
    /// Master table version (e.g., 35 for BUFRCREX_TableB_en_35.csv)
    pub version: Option<u32>,
    /// Language code (e.g., "en")
    pub language: Option<String>,
    pub filename: String,
}

/// A pattern for matching table filenames
pub trait TableFilePattern: Send + Sync {
    fn matches(&self, filename: &str) -> Option<TableMetadata>;

    /// Glob used to list candidate files in a directory
    fn glob_pattern(&self) -> &str;

    fn description(&self) -> &str;
}

/// WMO distribution files
/// Examples:
/// - BUFRCREX_TableB_en_35.csv
/// - BUFR_TableD_en_40.csv
/// - BUFRCREX_CodeFlag_en_40.csv
#[derive(Debug)]
pub struct WMOPattern {
    regex: Regex,
}

impl Default for WMOPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl WMOPattern {
    pub fn new() -> Self {
        let regex = Regex::new(r"^(?:BUFR(?:CREX)?)_(TableB|TableD|CodeFlag)_([a-z]{2})_(\d+)\.csv$")
            .expect("Invalid regex");

        Self { regex }
    }
}

impl TableFilePattern for WMOPattern {
    fn matches(&self, filename: &str) -> Option<TableMetadata> {
        let caps = self.regex.captures(filename)?;

        let kind = TableKind::from_label(&caps[1])?;
        let language = caps[2].to_string();
        let version = caps[3].parse().ok()?;

        Some(TableMetadata {
            kind,
            version: Some(version),
            language: Some(language),
            filename: filename.to_string(),
        })
    }

    fn glob_pattern(&self) -> &str {
        "BUFR*_*_*.csv"
    }

    fn description(&self) -> &str {
        "WMO tables (BUFR[CREX]_{TableB,TableD,CodeFlag}_en_*.csv)"
    }
}

/// Scanner that tries multiple patterns
pub struct TableScanner {
    patterns: Vec<Box<dyn TableFilePattern>>,
}

impl Default for TableScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl TableScanner {
    pub fn new() -> Self {
        Self {
            patterns: vec![Box::new(WMOPattern::new())],
        }
    }

    pub fn with_patterns(patterns: Vec<Box<dyn TableFilePattern>>) -> Self {
        Self { patterns }
    }

    pub fn add_pattern(&mut self, pattern: Box<dyn TableFilePattern>) {
        self.patterns.push(pattern);
    }

    pub fn match_filename(&self, filename: &str) -> Option<TableMetadata> {
        self.patterns.iter().find_map(|p| p.matches(filename))
    }

    /// Scan a directory for matching files
    pub fn scan_directory<P: AsRef<Path>>(
        &self,
        dir: P,
        kind_filter: Option<TableKind>,
    ) -> Result<Vec<(PathBuf, TableMetadata)>> {
        let dir = dir.as_ref();
        let mut results = Vec::new();

        for pattern in &self.patterns {
            let glob_pattern = dir.join(pattern.glob_pattern());
            let glob_str = glob_pattern
                .to_str()
                .with_context(|| format!("Non UTF-8 table path: {}", glob_pattern.display()))?;

            for entry in glob::glob(glob_str).context("Failed to read glob pattern")? {
                match entry {
                    Ok(path) => {
                        let Some(filename) = path.file_name().and_then(|f| f.to_str()) else {
                            continue;
                        };
                        if let Some(metadata) = pattern.matches(filename) {
                            if kind_filter.is_some_and(|k| k != metadata.kind) {
                                continue;
                            }
                            results.push((path, metadata));
                        }
                    }
                    Err(e) => {
                        warn!("Error reading file entry: {}", e);
                    }
                }
            }
        }

        results.sort_by(|a, b| a.0.cmp(&b.0));
        results.dedup_by(|a, b| a.0 == b.0);

        Ok(results)
    }

    /// Pick the file for `kind` closest to `version`: the exact version,
    /// else the newest older one, else the newest available.
    pub fn select<P: AsRef<Path>>(
        &self,
        dir: P,
        kind: TableKind,
        version: u32,
    ) -> Result<Option<(PathBuf, TableMetadata)>> {
        let candidates = self.scan_directory(dir, Some(kind))?;
        Ok(pick_version(candidates, kind, version))
    }

    pub fn patterns(&self) -> &[Box<dyn TableFilePattern>] {
        &self.patterns
    }
}

fn pick_version(
    candidates: Vec<(PathBuf, TableMetadata)>,
    kind: TableKind,
    version: u32,
) -> Option<(PathBuf, TableMetadata)> {
    let versioned = |c: &(PathBuf, TableMetadata)| c.1.version.unwrap_or(0);

    let older = candidates
        .iter()
        .filter(|c| versioned(c) <= version)
        .max_by_key(|c| versioned(c))
        .cloned();

    let chosen = older.or_else(|| candidates.iter().max_by_key(|c| versioned(c)).cloned())?;

    if versioned(&chosen) != version {
        info!(
            "Table {} version {} not found, falling back to version {}",
            kind.as_str(),
            version,
            versioned(&chosen)
        );
    }
    Some(chosen)
}

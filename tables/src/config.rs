use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::pattern::{TableFilePattern, TableKind, TableMetadata, TableScanner};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    pub name: String,
    pub regex: String,
    pub glob: String,
    pub mapping: FieldMapping,
}

/// Defines which capture group corresponds to which metadata field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Capture group holding the table kind ("b", "d" or "codeflag")
    pub kind_group: usize,

    pub version_group: Option<usize>,

    pub language_group: Option<usize>,
}

/// Runtime pattern compiled from configuration
pub struct ConfigurablePattern {
    name: String,
    regex: Regex,
    glob: String,
    mapping: FieldMapping,
}

impl ConfigurablePattern {
    pub fn from_config(config: &PatternConfig) -> Result<Self> {
        let regex = Regex::new(&config.regex)
            .with_context(|| format!("Invalid regex pattern: {}", config.regex))?;

        Ok(Self {
            name: config.name.clone(),
            regex,
            glob: config.glob.clone(),
            mapping: config.mapping.clone(),
        })
    }
}

impl TableFilePattern for ConfigurablePattern {
    fn matches(&self, filename: &str) -> Option<TableMetadata> {
        let caps = self.regex.captures(filename)?;

        let kind = TableKind::from_label(caps.get(self.mapping.kind_group)?.as_str())?;

        let version = self
            .mapping
            .version_group
            .and_then(|idx| caps.get(idx))
            .and_then(|m| m.as_str().parse().ok());

        let language = self
            .mapping
            .language_group
            .and_then(|idx| caps.get(idx))
            .map(|m| m.as_str().to_string());

        Some(TableMetadata {
            kind,
            version,
            language,
            filename: filename.to_string(),
        })
    }

    fn glob_pattern(&self) -> &str {
        &self.glob
    }

    fn description(&self) -> &str {
        &self.name
    }
}

/// Full configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TablesConfig {
    /// Directory holding the CSV tables
    #[serde(default)]
    pub tables_dir: Option<PathBuf>,

    /// Extra filename patterns tried after the WMO one
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,
}

impl TablesConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: TablesConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    pub fn default_example() -> Self {
        Self {
            tables_dir: Some(PathBuf::from("tables")),
            patterns: vec![PatternConfig {
                name: "Versioned local tables".to_string(),
                regex: r"^local_table([bdf])_v(\d+)\.csv$".to_string(),
                glob: "local_table*.csv".to_string(),
                mapping: FieldMapping {
                    kind_group: 1,
                    version_group: Some(2),
                    language_group: None,
                },
            }],
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn compile_patterns(&self) -> Result<Vec<Box<dyn TableFilePattern>>> {
        let mut patterns: Vec<Box<dyn TableFilePattern>> = Vec::new();

        for config in &self.patterns {
            let pattern = ConfigurablePattern::from_config(config)
                .with_context(|| format!("Failed to compile pattern: {}", config.name))?;
            patterns.push(Box::new(pattern));
        }

        Ok(patterns)
    }

    /// WMO pattern first, then the configured ones.
    pub fn scanner(&self) -> Result<TableScanner> {
        let mut scanner = TableScanner::new();
        for pattern in self.compile_patterns()? {
            scanner.add_pattern(pattern);
        }
        Ok(scanner)
    }
}

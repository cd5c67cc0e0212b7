use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_DATE_FORMATS, DEFAULT_NA_VALUES, DEFAULT_RENAME_MAPPING,
    DISALLOWED_CHARS_PATTERN, ENV_CHUNK_SIZE, ENV_INVALID_EMAIL, OUTPUT_DELIMITER,
    SOURCE_DELIMITER,
};
use crate::error::{CleanerError, Result};
use crate::types::CanonicalField;

/// What happens to rows whose `mail_address` is missing or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidEmailPolicy {
    /// Discard the row; it is only counted in the run summary
    #[default]
    Drop,
    /// Send the row to the garbage output
    Garbage,
}

impl FromStr for InvalidEmailPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(InvalidEmailPolicy::Drop),
            "garbage" => Ok(InvalidEmailPolicy::Garbage),
            other => Err(format!(
                "unknown invalid-email policy '{}' (expected 'drop' or 'garbage')",
                other
            )),
        }
    }
}

impl fmt::Display for InvalidEmailPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidEmailPolicy::Drop => f.write_str("drop"),
            InvalidEmailPolicy::Garbage => f.write_str("garbage"),
        }
    }
}

/// Immutable settings handed to the pipeline at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    /// Rows per chunk
    pub chunk_size: usize,
    /// Field delimiter of the source file
    pub source_delimiter: char,
    /// Field delimiter of the three output files
    pub output_delimiter: char,
    /// Source column name -> canonical column name
    pub rename_mapping: BTreeMap<String, String>,
    /// Fields passed through the character filter
    pub columns_to_clean: Vec<CanonicalField>,
    /// Characters matching this pattern are removed from `columns_to_clean`
    pub disallowed_chars_pattern: String,
    /// chrono formats tried in order for `birthday_on` and `created_at`
    pub date_formats: Vec<String>,
    /// Cell values read as missing
    pub na_values: Vec<String>,
    pub invalid_email_policy: InvalidEmailPolicy,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            source_delimiter: SOURCE_DELIMITER as char,
            output_delimiter: OUTPUT_DELIMITER as char,
            rename_mapping: DEFAULT_RENAME_MAPPING
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            columns_to_clean: vec![CanonicalField::LoginId, CanonicalField::MailAddress],
            disallowed_chars_pattern: DISALLOWED_CHARS_PATTERN.to_string(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            na_values: DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect(),
            invalid_email_policy: InvalidEmailPolicy::Drop,
        }
    }
}

impl CleanerConfig {
    /// Loads a TOML file. Keys left out keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CleanerError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CleanerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `RECORD_CLEANER_*` environment overrides.
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CHUNK_SIZE) {
            self.chunk_size = raw.trim().parse().map_err(|e| {
                CleanerError::Config(format!("{} must be a positive integer: {}", ENV_CHUNK_SIZE, e))
            })?;
        }
        if let Some(raw) = lookup(ENV_INVALID_EMAIL) {
            self.invalid_email_policy = raw.parse().map_err(CleanerError::Config)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_invalid_email_policy(mut self, policy: InvalidEmailPolicy) -> Self {
        self.invalid_email_policy = policy;
        self
    }

    pub fn with_source_delimiter(mut self, delimiter: char) -> Self {
        self.source_delimiter = delimiter;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(CleanerError::Config("chunk_size must be greater than zero".to_string()));
        }
        delimiter_byte(self.source_delimiter)?;
        delimiter_byte(self.output_delimiter)?;
        if self.date_formats.is_empty() {
            return Err(CleanerError::Config("date_formats must not be empty".to_string()));
        }
        regex::Regex::new(&self.disallowed_chars_pattern)?;
        Ok(())
    }

    pub fn source_delimiter_byte(&self) -> Result<u8> {
        delimiter_byte(self.source_delimiter)
    }

    pub fn output_delimiter_byte(&self) -> Result<u8> {
        delimiter_byte(self.output_delimiter)
    }
}

/// The csv crate takes single-byte delimiters.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() && delimiter != '\n' && delimiter != '\r' {
        Ok(delimiter as u8)
    } else {
        Err(CleanerError::Config(format!(
            "delimiter {:?} must be a single ASCII character other than a line break",
            delimiter
        )))
    }
}

use crate::error::{CgifError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default nesting limit for contexts, shared by writer and reader
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration for CGIF output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Indentation added for each nested context
    pub indent: String,

    /// Embed layout comments so positions survive a round trip
    pub write_comments: bool,

    /// Emit type labels and `(subtype ...)` assertions for gen-spec links
    pub export_subtypes: bool,

    /// Maximum context nesting written before giving up
    pub max_depth: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            write_comments: false,
            export_subtypes: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl WriterConfig {
    /// Create config that keeps layout for the editor
    pub fn with_layout() -> Self {
        Self {
            write_comments: true,
            ..Default::default()
        }
    }

    /// Create config for compact, single-indent-free output
    pub fn compact() -> Self {
        Self {
            indent: String::new(),
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_depth == 0 {
            return Err("max_depth must be > 0".to_string());
        }

        if !self.indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(format!(
                "indent must contain only spaces or tabs, got {:?}",
                self.indent
            ));
        }

        Ok(())
    }
}

/// Configuration for reading CGIF text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Let relations name variables defined later in the text
    pub defer_unresolved: bool,

    /// Maximum context nesting accepted
    pub max_depth: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            defer_unresolved: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ReaderConfig {
    /// Create config that requires every variable to be defined first
    pub fn strict() -> Self {
        Self {
            defer_unresolved: false,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_depth == 0 {
            return Err("max_depth must be > 0".to_string());
        }
        Ok(())
    }
}

/// Combined codec configuration, as loaded from a TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub writer: WriterConfig,
    pub reader: ReaderConfig,
}

impl CodecConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CodecConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded codec config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate both sections
    pub fn validate(&self) -> Result<()> {
        self.writer
            .validate()
            .map_err(|e| CgifError::invalid_config(format!("writer: {}", e)))?;
        self.reader
            .validate()
            .map_err(|e| CgifError::invalid_config(format!("reader: {}", e)))?;
        Ok(())
    }
}

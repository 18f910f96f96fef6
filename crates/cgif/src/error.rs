use cg_graph::GraphError;
use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CgifError>;

/// Errors raised while writing or building conceptual graphs
#[derive(Error, Debug)]
pub enum CgifError {
    /// Unresolved bound variable, or a second binding of the same variable
    #[error("Variable error: {0}")]
    Variable(String),

    /// Duplicate type declaration, or a subtype link naming an undeclared type
    #[error("Subtype error: {0}")]
    Subtype(String),

    /// Malformed quoted literal
    #[error("Format error: {0}")]
    Format(String),

    /// Embedded layout payload could not be parsed
    #[error("Layout error: {0}")]
    Layout(String),

    /// Unexpected character or token in CGIF text
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Contexts nested deeper than the configured limit
    #[error("Context nesting exceeds limit of {limit}")]
    DepthLimit { limit: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Graph model rejected an operation
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CgifError {
    /// Create a variable error
    pub fn variable(msg: impl Into<String>) -> Self {
        Self::Variable(msg.into())
    }

    /// Create a subtype error
    pub fn subtype(msg: impl Into<String>) -> Self {
        Self::Subtype(msg.into())
    }

    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a parse error
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<toml::de::Error> for CgifError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

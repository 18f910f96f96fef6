use crate::types::ObjectId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("Object {0} is not a context")]
    NotAContext(ObjectId),

    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    #[error("Layout error: {0}")]
    Layout(String),
}

impl GraphError {
    /// Create an invalid edge error
    pub fn invalid_edge(msg: impl Into<String>) -> Self {
        Self::InvalidEdge(msg.into())
    }

    /// Create a layout error
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }
}

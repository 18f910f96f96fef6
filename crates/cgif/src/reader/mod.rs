//! CGIF text reader.
//!
//! Tokenizes CGIF text and drives a [`ParserBuilder`] with the productions
//! it finds.

mod lexer;
mod parser;
mod token;

pub use lexer::{tokenize, Lexer};
pub use parser::Parser;
pub use token::{Token, TokenKind};

use crate::builder::{ParseOutput, ParserBuilder};
use crate::config::ReaderConfig;
use crate::error::{CgifError, Result};
use cg_graph::ConceptGraph;
use std::path::Path;

/// Parse CGIF text into a new graph
pub fn read(text: &str, config: &ReaderConfig) -> Result<ParseOutput> {
    read_into(ConceptGraph::new(), text, config)
}

/// Parse CGIF text into the root context of an existing graph
pub fn read_into(graph: ConceptGraph, text: &str, config: &ReaderConfig) -> Result<ParseOutput> {
    config.validate().map_err(CgifError::invalid_config)?;

    let mut builder = ParserBuilder::with_graph(graph, config);
    Parser::new(text, &mut builder, config.max_depth)?.parse()?;
    builder.finish()
}

/// Parse a CGIF file
pub fn read_file(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<ParseOutput> {
    let text = std::fs::read_to_string(path.as_ref())?;
    log::debug!("Reading CGIF from {}", path.as_ref().display());
    read(&text, config)
}

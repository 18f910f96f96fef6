//! # CG CGIF
//!
//! Reading and writing conceptual graphs in CGIF, the Conceptual Graph
//! Interchange Format.
//!
//! ## Round-trip contract
//!
//! - Anonymous and coreferent concepts get deterministic, collision-free
//!   names (`x1`, `x2`, ...) on write
//! - Coreference names propagate transitively through coreference lines
//! - Literals are quoted and escaped reversibly; `*`/`?` sigils stay outside
//! - Relation arguments are ordered by their numeric arc labels
//! - Variables bind once; later defining occurrences are ignored
//! - Node layout optionally survives as `/*cglayout: ...*/` comments
//!
//! ## Architecture
//!
//! ```text
//! Write: ConceptGraph
//!     │
//!     ├──> NameGenerator (seeded with names already in the graph)
//!     │
//!     └──> CgifWriter (per context, recursive)
//!          ├─> subtype declarations
//!          ├─> concepts ──> CorefResolver ──> NameTable
//!          └─> relations / actors ──> edge ordering, quoting
//!
//! Read: CGIF text
//!     │
//!     ├──> Lexer (comments attached to the next token)
//!     │
//!     └──> Parser ──> ParserBuilder ──> ConceptGraph + ReferentMap
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cg_cgif::{read, write_to_string, ReaderConfig, WriterConfig};
//!
//! let parsed = read("[Cat: *x1] [Mat: *x2] (On ?x1 ?x2)", &ReaderConfig::default()).unwrap();
//! let text = write_to_string(&parsed.graph, &WriterConfig::default()).unwrap();
//! assert!(text.contains("(On ?x1 ?x2)"));
//! ```

mod builder;
mod config;
mod coref;
mod error;
mod names;
mod ordering;
mod quote;
mod reader;
mod referents;
mod writer;

pub use builder::{extract_layout_comment, first_layout_comment, ParseOutput, ParserBuilder};
pub use config::{CodecConfig, ReaderConfig, WriterConfig, DEFAULT_MAX_DEPTH};
pub use coref::{CorefResolver, NameTable};
pub use error::{CgifError, Result};
pub use names::NameGenerator;
pub use ordering::{sort_input_edges, EdgeOrder};
pub use quote::{needs_quote, quotify, quotify_with_prefix, unquotify, unquotify_with_prefix};
pub use reader::{read, read_file, read_into, tokenize, Lexer, Parser, Token, TokenKind};
pub use referents::{normalize_variable, ReferentMap};
pub use writer::{
    layout_comment, write, write_to_file, write_to_string, CgifWriter, LAYOUT_COMMENT_MARKER,
};

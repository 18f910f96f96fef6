//! # CG Graph
//!
//! In-memory model of conceptual graphs as the CGIF codec sees them.
//!
//! ## Features
//!
//! - **Nested contexts** - concepts that are themselves graphs, optionally negated
//! - **Stable identity** - every object gets an [`ObjectId`] usable as a map key
//! - **Deep traversal** - pre-order iteration across nested contexts, filterable by kind
//! - **Coreference network** - concepts joined by coreference lines (petgraph)
//! - **Layout geometry** - node boxes with an XML fragment form for CGIF comments
//!
//! ## Architecture
//!
//! ```text
//! ConceptGraph (arena, ids in insertion order)
//!     │
//!     ├──> Root context ──> [objects in insertion order]
//!     │                        ├─ Concept / Context ──> [nested objects]
//!     │                        ├─ Relation / Actor
//!     │                        ├─ TypeLabel
//!     │                        └─ Arrow / Coref / GenSpecLink (edges)
//!     │
//!     └──> Incident edge lists per node
//! ```

mod error;
mod graph;
mod layout;
mod types;

pub use error::{GraphError, Result};
pub use graph::DeepIter;
pub use layout::{Layout, MIN_HEIGHT, MIN_WIDTH};
pub use types::{
    Concept, ConceptGraph, Edge, GraphObject, LinkNode, ObjectId, ObjectKind, Payload, TypeLabel,
};

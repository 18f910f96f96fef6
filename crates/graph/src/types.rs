use crate::error::{GraphError, Result};
use crate::layout::Layout;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a graph object, usable as a map key.
///
/// Ids are handed out in insertion order, so comparing two ids compares
/// their creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// The outermost context of every graph
    pub const ROOT: ObjectId = ObjectId(0);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminant of a graph object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Concept,
    /// A concept that is itself a nested graph
    Context,
    Relation,
    Actor,
    TypeLabel,
    GenSpecLink,
    Arrow,
    Coref,
}

impl ObjectKind {
    /// Nodes are everything drawn as a box; the rest are edges
    pub fn is_node(self) -> bool {
        matches!(
            self,
            ObjectKind::Concept
                | ObjectKind::Context
                | ObjectKind::Relation
                | ObjectKind::Actor
                | ObjectKind::TypeLabel
        )
    }

    pub fn is_edge(self) -> bool {
        !self.is_node()
    }
}

/// Concept box: `[Type: referent]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub type_label: String,
    pub referent: String,
    pub negated: bool,
}

impl Concept {
    pub fn new(type_label: impl Into<String>, referent: impl Into<String>) -> Self {
        Self {
            type_label: type_label.into(),
            referent: referent.into(),
            negated: false,
        }
    }

    pub fn negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }
}

/// Relation or actor node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkNode {
    pub label: String,
}

/// Type declaration used by gen-spec links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLabel {
    pub name: String,
}

/// Directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: ObjectId,
    pub to: ObjectId,

    /// Text label; arrows use it for argument position
    pub label: String,
}

impl Edge {
    /// The endpoint on the other side of `node`
    pub fn opposite(&self, node: ObjectId) -> ObjectId {
        if self.to == node {
            self.from
        } else {
            self.to
        }
    }
}

/// Kind-specific data of a graph object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Concept(Concept),
    Relation(LinkNode),
    Actor(LinkNode),
    TypeLabel(TypeLabel),
    /// `from` is the subtype, `to` the supertype
    GenSpecLink(Edge),
    Arrow(Edge),
    Coref(Edge),
}

/// Object stored in a [`ConceptGraph`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphObject {
    pub id: ObjectId,

    /// Context this object was inserted into
    pub owner: ObjectId,

    pub payload: Payload,

    pub layout: Option<Layout>,

    /// Incident edges, in insertion order (nodes only)
    pub edges: Vec<ObjectId>,

    /// Immediate objects when this concept is a subcontext
    pub contents: Option<Vec<ObjectId>>,
}

impl GraphObject {
    pub fn kind(&self) -> ObjectKind {
        match &self.payload {
            Payload::Concept(_) if self.contents.is_some() => ObjectKind::Context,
            Payload::Concept(_) => ObjectKind::Concept,
            Payload::Relation(_) => ObjectKind::Relation,
            Payload::Actor(_) => ObjectKind::Actor,
            Payload::TypeLabel(_) => ObjectKind::TypeLabel,
            Payload::GenSpecLink(_) => ObjectKind::GenSpecLink,
            Payload::Arrow(_) => ObjectKind::Arrow,
            Payload::Coref(_) => ObjectKind::Coref,
        }
    }

    pub fn as_concept(&self) -> Option<&Concept> {
        match &self.payload {
            Payload::Concept(concept) => Some(concept),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match &self.payload {
            Payload::GenSpecLink(edge) | Payload::Arrow(edge) | Payload::Coref(edge) => Some(edge),
            _ => None,
        }
    }

    /// Label text shown for the object
    pub fn text_label(&self) -> &str {
        match &self.payload {
            Payload::Concept(concept) => &concept.type_label,
            Payload::Relation(node) | Payload::Actor(node) => &node.label,
            Payload::TypeLabel(label) => &label.name,
            Payload::GenSpecLink(edge) | Payload::Arrow(edge) | Payload::Coref(edge) => &edge.label,
        }
    }

    pub fn is_context(&self) -> bool {
        self.contents.is_some()
    }
}

/// Conceptual graph with nested contexts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptGraph {
    /// Objects indexed by `id - 1`
    pub(crate) objects: Vec<GraphObject>,

    /// Immediate objects of the root context
    pub(crate) root: Vec<ObjectId>,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            root: Vec::new(),
        }
    }

    /// Insert a plain concept into `ctx`
    pub fn insert_concept(&mut self, ctx: ObjectId, concept: Concept) -> Result<ObjectId> {
        self.insert(ctx, Payload::Concept(concept), None)
    }

    /// Insert a concept that is itself a (possibly negated) nested graph
    pub fn insert_context(&mut self, ctx: ObjectId, concept: Concept) -> Result<ObjectId> {
        self.insert(ctx, Payload::Concept(concept), Some(Vec::new()))
    }

    pub fn insert_relation(&mut self, ctx: ObjectId, label: impl Into<String>) -> Result<ObjectId> {
        self.insert(ctx, Payload::Relation(LinkNode { label: label.into() }), None)
    }

    pub fn insert_actor(&mut self, ctx: ObjectId, label: impl Into<String>) -> Result<ObjectId> {
        self.insert(ctx, Payload::Actor(LinkNode { label: label.into() }), None)
    }

    pub fn insert_type_label(&mut self, ctx: ObjectId, name: impl Into<String>) -> Result<ObjectId> {
        self.insert(ctx, Payload::TypeLabel(TypeLabel { name: name.into() }), None)
    }

    /// Link `subtype` under `supertype`; both must be type labels
    pub fn insert_gen_spec_link(
        &mut self,
        ctx: ObjectId,
        subtype: ObjectId,
        supertype: ObjectId,
    ) -> Result<ObjectId> {
        for id in [subtype, supertype] {
            if self.require(id)?.kind() != ObjectKind::TypeLabel {
                return Err(GraphError::invalid_edge(format!(
                    "gen-spec endpoint {} is not a type label",
                    id
                )));
            }
        }
        self.insert_edge(
            ctx,
            Payload::GenSpecLink(Edge {
                from: subtype,
                to: supertype,
                label: String::new(),
            }),
        )
    }

    /// Directed arrow between a concept and a relation/actor
    pub fn insert_arrow(
        &mut self,
        ctx: ObjectId,
        from: ObjectId,
        to: ObjectId,
        label: impl Into<String>,
    ) -> Result<ObjectId> {
        let from_kind = self.require(from)?.kind();
        let to_kind = self.require(to)?.kind();
        let is_concept = |k: ObjectKind| matches!(k, ObjectKind::Concept | ObjectKind::Context);
        let is_link = |k: ObjectKind| matches!(k, ObjectKind::Relation | ObjectKind::Actor);
        if !((is_concept(from_kind) && is_link(to_kind)) || (is_link(from_kind) && is_concept(to_kind))) {
            return Err(GraphError::invalid_edge(format!(
                "arrow {} -> {} must join a concept and a relation or actor",
                from, to
            )));
        }
        self.insert_edge(
            ctx,
            Payload::Arrow(Edge {
                from,
                to,
                label: label.into(),
            }),
        )
    }

    /// Coreference line between two concepts
    pub fn insert_coref(&mut self, ctx: ObjectId, a: ObjectId, b: ObjectId) -> Result<ObjectId> {
        for id in [a, b] {
            if self.require(id)?.as_concept().is_none() {
                return Err(GraphError::invalid_edge(format!(
                    "coreference endpoint {} is not a concept",
                    id
                )));
            }
        }
        self.insert_edge(
            ctx,
            Payload::Coref(Edge {
                from: a,
                to: b,
                label: String::new(),
            }),
        )
    }

    /// Get object data
    pub fn get(&self, id: ObjectId) -> Option<&GraphObject> {
        let index = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        self.objects.get(index)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GraphObject> {
        let index = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        self.objects.get_mut(index)
    }

    pub fn concept(&self, id: ObjectId) -> Option<&Concept> {
        self.get(id).and_then(GraphObject::as_concept)
    }

    pub fn concept_mut(&mut self, id: ObjectId) -> Option<&mut Concept> {
        match self.get_mut(id).map(|obj| &mut obj.payload) {
            Some(Payload::Concept(concept)) => Some(concept),
            _ => None,
        }
    }

    /// Attach layout geometry to an object
    pub fn set_layout(&mut self, id: ObjectId, layout: Layout) -> Result<()> {
        let obj = self.get_mut(id).ok_or(GraphError::ObjectNotFound(id))?;
        obj.layout = Some(layout);
        Ok(())
    }

    /// Get object count (all kinds, all contexts)
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub(crate) fn require(&self, id: ObjectId) -> Result<&GraphObject> {
        self.get(id).ok_or(GraphError::ObjectNotFound(id))
    }

    pub(crate) fn contents_of(&self, ctx: ObjectId) -> Result<&[ObjectId]> {
        if ctx == ObjectId::ROOT {
            return Ok(&self.root);
        }
        self.require(ctx)?
            .contents
            .as_deref()
            .ok_or(GraphError::NotAContext(ctx))
    }

    fn insert_edge(&mut self, ctx: ObjectId, payload: Payload) -> Result<ObjectId> {
        let (from, to) = match &payload {
            Payload::GenSpecLink(edge) | Payload::Arrow(edge) | Payload::Coref(edge) => (edge.from, edge.to),
            _ => return Err(GraphError::invalid_edge("payload is not an edge")),
        };
        let id = self.insert(ctx, payload, None)?;
        for endpoint in [from, to] {
            if let Some(obj) = self.get_mut(endpoint) {
                if !obj.edges.contains(&id) {
                    obj.edges.push(id);
                }
            }
        }
        Ok(id)
    }

    fn insert(&mut self, ctx: ObjectId, payload: Payload, contents: Option<Vec<ObjectId>>) -> Result<ObjectId> {
        // validate the target before allocating an id
        self.contents_of(ctx)?;

        let id = ObjectId(self.objects.len() as u64 + 1);
        self.objects.push(GraphObject {
            id,
            owner: ctx,
            payload,
            layout: None,
            edges: Vec::new(),
            contents,
        });

        if ctx == ObjectId::ROOT {
            self.root.push(id);
        } else if let Some(list) = self.get_mut(ctx).and_then(|obj| obj.contents.as_mut()) {
            list.push(id);
        }

        Ok(id)
    }
}

impl Default for ConceptGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut graph = ConceptGraph::new();
        let a = graph.insert_concept(ObjectId::ROOT, Concept::new("Cat", "Tom")).unwrap();
        let b = graph.insert_relation(ObjectId::ROOT, "on").unwrap();

        assert!(a < b);
        assert_eq!(graph.object_count(), 2);
        assert_eq!(graph.concept(a).unwrap().referent, "Tom");
        assert_eq!(graph.get(b).unwrap().kind(), ObjectKind::Relation);
        assert!(graph.get(ObjectId::ROOT).is_none());
    }

    #[test]
    fn test_gen_spec_link_requires_type_labels() {
        let mut graph = ConceptGraph::new();
        let cat = graph.insert_type_label(ObjectId::ROOT, "Cat").unwrap();
        let animal = graph.insert_type_label(ObjectId::ROOT, "Animal").unwrap();
        let concept = graph.insert_concept(ObjectId::ROOT, Concept::new("Cat", "")).unwrap();

        let link = graph.insert_gen_spec_link(ObjectId::ROOT, cat, animal).unwrap();
        let edge = graph.get(link).unwrap().as_edge().unwrap();
        assert_eq!((edge.from, edge.to), (cat, animal));

        assert!(matches!(
            graph.insert_gen_spec_link(ObjectId::ROOT, concept, animal),
            Err(GraphError::InvalidEdge(_))
        ));
    }

    #[test]
    fn test_context_kind_and_negation() {
        let mut graph = ConceptGraph::new();
        let ctx = graph
            .insert_context(ObjectId::ROOT, Concept::new("Situation", "").negated(true))
            .unwrap();
        let obj = graph.get(ctx).unwrap();
        assert_eq!(obj.kind(), ObjectKind::Context);
        assert!(obj.as_concept().unwrap().negated);
        assert!(ObjectKind::Context.is_node());
        assert!(ObjectKind::Coref.is_edge());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut graph = ConceptGraph::new();
        let a = graph.insert_concept(ObjectId::ROOT, Concept::new("Cat", "")).unwrap();
        graph.set_layout(a, Layout::new(1.0, 2.0, 30.0, 20.0)).unwrap();

        let json = serde_json::to_string(&graph).unwrap();
        let back: ConceptGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.object_count(), 1);
        assert_eq!(back.get(a).unwrap().layout, Some(Layout::new(1.0, 2.0, 30.0, 20.0)));
    }
}

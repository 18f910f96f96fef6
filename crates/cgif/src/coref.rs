use cg_graph::{ConceptGraph, ObjectId};
use petgraph::graphmap::UnGraphMap;
use std::collections::{HashMap, VecDeque};

/// Coreference names assigned during one write, keyed by object id.
///
/// Names are stored bare (`x1`) or in set form (`{*x1}`).
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: HashMap<ObjectId, String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ObjectId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.names.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn insert(&mut self, id: ObjectId, name: &str) {
        self.names.insert(id, name.to_string());
    }
}

/// Propagates a coreference name to every concept reachable through
/// coreference lines.
pub struct CorefResolver {
    network: UnGraphMap<ObjectId, ObjectId>,
}

impl CorefResolver {
    pub fn new(graph: &ConceptGraph) -> Self {
        Self {
            network: graph.coref_network(),
        }
    }

    /// Assign `name` to `concept` (replacing any earlier name) and to every
    /// concept transitively coreferent with it that has no name yet.
    ///
    /// Breadth-first; concepts that already carry a name are neither
    /// renamed nor expanded. Returns how many concepts were named.
    pub fn register(&self, table: &mut NameTable, concept: ObjectId, name: &str) -> usize {
        table.insert(concept, name);
        let mut named = 1;

        if !self.network.contains_node(concept) {
            return named;
        }

        let mut queue = VecDeque::from([concept]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.network.neighbors(current) {
                if !table.contains(neighbor) {
                    table.insert(neighbor, name);
                    named += 1;
                    queue.push_back(neighbor);
                }
            }
        }

        named
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_graph::Concept;

    #[test]
    fn test_transitive_naming() {
        let mut graph = ConceptGraph::new();
        let a = graph.insert_concept(ObjectId::ROOT, Concept::new("T", "")).unwrap();
        let b = graph.insert_concept(ObjectId::ROOT, Concept::new("T", "")).unwrap();
        let c = graph.insert_concept(ObjectId::ROOT, Concept::new("T", "")).unwrap();
        let lone = graph.insert_concept(ObjectId::ROOT, Concept::new("T", "")).unwrap();
        graph.insert_coref(ObjectId::ROOT, a, b).unwrap();
        graph.insert_coref(ObjectId::ROOT, b, c).unwrap();

        let resolver = CorefResolver::new(&graph);
        let mut table = NameTable::new();
        assert_eq!(resolver.register(&mut table, a, "x1"), 3);

        assert_eq!(table.get(a), Some("x1"));
        assert_eq!(table.get(b), Some("x1"));
        assert_eq!(table.get(c), Some("x1"));
        assert_eq!(table.get(lone), None);
    }

    #[test]
    fn test_named_concepts_are_not_renamed() {
        let mut graph = ConceptGraph::new();
        let a = graph.insert_concept(ObjectId::ROOT, Concept::new("T", "")).unwrap();
        let b = graph.insert_concept(ObjectId::ROOT, Concept::new("T", "")).unwrap();
        let c = graph.insert_concept(ObjectId::ROOT, Concept::new("T", "")).unwrap();
        graph.insert_coref(ObjectId::ROOT, a, b).unwrap();
        graph.insert_coref(ObjectId::ROOT, b, c).unwrap();

        let resolver = CorefResolver::new(&graph);
        let mut table = NameTable::new();
        resolver.register(&mut table, b, "first");
        // re-registering a renames only a; b and c keep their name
        assert_eq!(resolver.register(&mut table, a, "second"), 1);
        assert_eq!(table.get(a), Some("second"));
        assert_eq!(table.get(b), Some("first"));
        assert_eq!(table.get(c), Some("first"));
    }

    #[test]
    fn test_coreference_across_contexts() {
        let mut graph = ConceptGraph::new();
        let outer = graph.insert_concept(ObjectId::ROOT, Concept::new("T", "*x")).unwrap();
        let ctx = graph.insert_context(ObjectId::ROOT, Concept::new("Proposition", "")).unwrap();
        let inner = graph.insert_concept(ctx, Concept::new("T", "")).unwrap();
        graph.insert_coref(ObjectId::ROOT, outer, inner).unwrap();

        let resolver = CorefResolver::new(&graph);
        let mut table = NameTable::new();
        resolver.register(&mut table, outer, "x");
        assert_eq!(table.get(inner), Some("x"));
        assert_eq!(table.len(), 2);
    }
}

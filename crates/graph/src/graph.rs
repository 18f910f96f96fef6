use crate::error::Result;
use crate::types::{ConceptGraph, GraphObject, ObjectId, ObjectKind, Payload};
use petgraph::graphmap::UnGraphMap;
use std::slice;

impl ConceptGraph {
    /// Immediate objects of `ctx`, in insertion order
    pub fn objects_in(&self, ctx: ObjectId) -> Result<impl Iterator<Item = &GraphObject> + '_> {
        let ids = self.contents_of(ctx)?;
        Ok(ids.iter().filter_map(move |&id| self.get(id)))
    }

    /// All objects under `ctx`, descending into nested contexts (pre-order)
    pub fn deep_objects(&self, ctx: ObjectId) -> Result<DeepIter<'_>> {
        let ids = self.contents_of(ctx)?;
        Ok(DeepIter {
            graph: self,
            stack: vec![ids.iter()],
        })
    }

    /// Deep iteration restricted to one kind
    pub fn deep_objects_of_kind(
        &self,
        ctx: ObjectId,
        kind: ObjectKind,
    ) -> Result<impl Iterator<Item = &GraphObject> + '_> {
        Ok(self.deep_objects(ctx)?.filter(move |obj| obj.kind() == kind))
    }

    /// Incident edges of a node (empty for unknown ids)
    pub fn edges_of(&self, id: ObjectId) -> &[ObjectId] {
        self.get(id).map(|obj| obj.edges.as_slice()).unwrap_or_default()
    }

    /// Undirected network of concepts joined by coreference lines.
    ///
    /// Neighbors come back in the order the lines were inserted.
    pub fn coref_network(&self) -> UnGraphMap<ObjectId, ObjectId> {
        let mut network = UnGraphMap::new();

        for obj in &self.objects {
            if let Payload::Coref(edge) = &obj.payload {
                network.add_edge(edge.from, edge.to, obj.id);
            }
        }

        log::debug!(
            "Coreference network: {} concepts, {} lines",
            network.node_count(),
            network.edge_count()
        );

        network
    }

    /// Nesting depth of the deepest context under `ctx` (0 when flat)
    pub fn context_depth(&self, ctx: ObjectId) -> Result<usize> {
        let mut deepest = 0;
        let mut stack = vec![(ctx, 0usize)];
        while let Some((current, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for obj in self.objects_in(current)? {
                if obj.is_context() {
                    stack.push((obj.id, depth + 1));
                }
            }
        }
        Ok(deepest)
    }
}

/// Pre-order iterator over a context and everything nested inside it
pub struct DeepIter<'g> {
    graph: &'g ConceptGraph,
    stack: Vec<slice::Iter<'g, ObjectId>>,
}

impl<'g> Iterator for DeepIter<'g> {
    type Item = &'g GraphObject;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(&id) => {
                    let Some(obj) = self.graph.get(id) else {
                        continue;
                    };
                    if let Some(contents) = obj.contents.as_deref() {
                        self.stack.push(contents.iter());
                    }
                    return Some(obj);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

use cg_graph::{ConceptGraph, ObjectId};

/// How a list of input edges ended up ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOrder {
    /// Every label parsed as an integer; sorted by that value
    Numeric,
    /// At least one label wasn't numeric; sorted by object id
    Identity,
}

/// Sort a node's input edges by their numeric labels.
///
/// Falls back to creation order (ascending id) as soon as one label
/// isn't an integer. Both sorts are stable.
pub fn sort_input_edges(graph: &ConceptGraph, edges: &mut [ObjectId]) -> EdgeOrder {
    let labels: Option<Vec<i64>> = edges
        .iter()
        .map(|&id| graph.get(id).and_then(|obj| obj.text_label().parse::<i64>().ok()))
        .collect();

    match labels {
        Some(values) => {
            let mut keyed: Vec<(i64, ObjectId)> = values.into_iter().zip(edges.iter().copied()).collect();
            keyed.sort_by_key(|&(value, _)| value);
            for (slot, (_, id)) in edges.iter_mut().zip(keyed) {
                *slot = id;
            }
            EdgeOrder::Numeric
        }
        None => {
            edges.sort();
            EdgeOrder::Identity
        }
    }
}

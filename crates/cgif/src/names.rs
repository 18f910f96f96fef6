use cg_graph::{ConceptGraph, ObjectId};
use std::collections::HashSet;

/// Prefix of every generated label name
const BASE_NAME: &str = "x";

/// Generates coreference label names that don't collide with names
/// already used in a graph.
///
/// Only the bare name is produced (`x3`), never the CGIF sigil.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    /// Next suffix to try; always >= 1
    next_digit: u64,
    names: HashSet<String>,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self {
            next_digit: 1,
            names: HashSet::new(),
        }
    }

    /// Create a generator that excludes every label name found in `graph`
    pub fn for_graph(graph: &ConceptGraph) -> Self {
        let mut generator = Self::new();
        generator.add_names(graph);
        generator
    }

    /// Exclude `name` from generation
    pub fn add_name(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Exclude the defining/bound label names of every concept in `graph`,
    /// nested contexts included.
    ///
    /// Referents look like `[quantifier] [*|?|#]name`; only the part after
    /// the last sigil is taken. Referents without a usable sigil are
    /// excluded whole.
    pub fn add_names(&mut self, graph: &ConceptGraph) {
        let Ok(objects) = graph.deep_objects(ObjectId::ROOT) else {
            return;
        };

        for concept in objects.filter_map(|obj| obj.as_concept()) {
            let name = label_name(&concept.referent);
            self.add_name(name);
        }
    }

    /// True if `name` hasn't been generated or excluded
    pub fn is_useable_name(&self, name: &str) -> bool {
        !self.names.contains(name)
    }

    /// True when the referent has no name of its own and needs a generated
    /// one: empty, a lone `*`, or the set placeholder `{*}`
    pub fn is_generic_name(referent: Option<&str>) -> bool {
        let Some(referent) = referent else {
            return true;
        };
        if referent.is_empty() || referent.trim() == "*" {
            return true;
        }
        let squeezed: String = referent.chars().filter(|c| !c.is_whitespace()).collect();
        squeezed == "{*}"
    }

    /// Reset both the exclusion set and the name sequence
    pub fn clear(&mut self) {
        self.names.clear();
        self.next_digit = 1;
    }

    /// Snapshot of the excluded names
    pub fn names(&self) -> HashSet<String> {
        self.names.clone()
    }

    /// Next name not in the exclusion set.
    ///
    /// The name is not registered; call [`NameGenerator::add_name`] if it
    /// must not be handed out again after a [`NameGenerator::clear`].
    pub fn generate_name(&mut self) -> String {
        loop {
            let name = format!("{}{}", BASE_NAME, self.next_digit);
            // wrap around instead of overflowing
            self.next_digit = self.next_digit.checked_add(1).unwrap_or(1);
            if self.is_useable_name(&name) {
                return name;
            }
        }
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Name part of a referent: text after the last `*`, else `?`, else `#`
fn label_name(referent: &str) -> &str {
    let index = referent
        .rfind('*')
        .or_else(|| referent.rfind('?'))
        .or_else(|| referent.rfind('#'));

    match index {
        Some(i) if i + 1 < referent.len() => referent[i + 1..].trim(),
        _ => referent.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_graph::Concept;

    #[test]
    fn test_sequential_names() {
        let mut generator = NameGenerator::new();
        assert_eq!(generator.generate_name(), "x1");
        assert_eq!(generator.generate_name(), "x2");
        assert_eq!(generator.generate_name(), "x3");
    }

    #[test]
    fn test_excluded_names_are_skipped() {
        let mut generator = NameGenerator::new();
        generator.add_name("x2");
        let names: Vec<_> = (0..3).map(|_| generator.generate_name()).collect();
        assert_eq!(names, vec!["x1", "x3", "x4"]);
    }

    #[test]
    fn test_counter_wraps_to_one() {
        let mut generator = NameGenerator::new();
        generator.next_digit = u64::MAX;
        assert_eq!(generator.generate_name(), format!("x{}", u64::MAX));
        assert_eq!(generator.generate_name(), "x1");
    }

    #[test]
    fn test_add_names_from_graph() {
        let mut graph = ConceptGraph::new();
        graph.insert_concept(ObjectId::ROOT, Concept::new("Cat", "*x1")).unwrap();
        graph.insert_concept(ObjectId::ROOT, Concept::new("Cat", "@every *x3")).unwrap();
        let ctx = graph.insert_context(ObjectId::ROOT, Concept::new("Proposition", "")).unwrap();
        graph.insert_concept(ctx, Concept::new("Dog", "?x2")).unwrap();
        graph.insert_concept(ctx, Concept::new("Dog", " Rex ")).unwrap();
        graph.insert_concept(ctx, Concept::new("Dog", "#")).unwrap();

        let generator = NameGenerator::for_graph(&graph);
        let names = generator.names();
        for expected in ["x1", "x2", "x3", "Rex", "#"] {
            assert!(names.contains(expected), "missing {}", expected);
        }

        let mut generator = generator;
        assert_eq!(generator.generate_name(), "x4");
    }

    #[test]
    fn test_is_generic_name() {
        assert!(NameGenerator::is_generic_name(None));
        assert!(NameGenerator::is_generic_name(Some("")));
        assert!(NameGenerator::is_generic_name(Some(" * ")));
        assert!(NameGenerator::is_generic_name(Some("{ * }")));
        assert!(!NameGenerator::is_generic_name(Some("*x1")));
        assert!(!NameGenerator::is_generic_name(Some("{*x1}")));
        assert!(!NameGenerator::is_generic_name(Some("Tom")));
    }

    #[test]
    fn test_clear_resets_sequence() {
        let mut generator = NameGenerator::new();
        generator.add_name("x1");
        assert_eq!(generator.generate_name(), "x2");
        generator.clear();
        assert!(generator.is_useable_name("x1"));
        assert_eq!(generator.generate_name(), "x1");
    }
}

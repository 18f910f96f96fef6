use crate::error::{CgifError, Result};
use cg_graph::ObjectId;
use std::collections::HashMap;

/// Single-assignment table from CGIF variables to the objects they name.
///
/// Keys are normalized to the defining form, so `?x1` and `*x1` are the
/// same variable. Literal referents without a sigil are keyed as `*literal`.
#[derive(Debug, Clone, Default)]
pub struct ReferentMap {
    objects: HashMap<String, ObjectId>,
}

/// Defining form of a variable or literal referent
pub fn normalize_variable(reference: &str) -> String {
    if let Some(rest) = reference.strip_prefix('?') {
        format!("*{}", rest)
    } else if reference.starts_with('*') {
        reference.to_string()
    } else {
        format!("*{}", reference)
    }
}

impl ReferentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object bound to `reference`, if any
    pub fn get(&self, reference: Option<&str>) -> Option<ObjectId> {
        let reference = reference?;
        self.objects.get(&normalize_variable(reference)).copied()
    }

    /// Bind `reference` to `id`; a variable can only be bound once
    pub fn put(&mut self, reference: &str, id: ObjectId) -> Result<()> {
        let key = normalize_variable(reference);
        if self.objects.contains_key(&key) {
            return Err(CgifError::variable(format!(
                "Variable {} already exists.",
                reference
            )));
        }
        self.objects.insert(key, id);
        Ok(())
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.objects.contains_key(&normalize_variable(reference))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Forget every binding so the map can serve another parse
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Bindings as (normalized variable, object) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, ObjectId)> {
        self.objects.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_graph::{Concept, ConceptGraph};

    fn two_ids() -> (ObjectId, ObjectId) {
        let mut graph = ConceptGraph::new();
        let a = graph.insert_concept(ObjectId::ROOT, Concept::new("T", "")).unwrap();
        let b = graph.insert_concept(ObjectId::ROOT, Concept::new("T", "")).unwrap();
        (a, b)
    }

    #[test]
    fn test_bound_and_defining_forms_collide() {
        let (a, b) = two_ids();
        let mut map = ReferentMap::new();
        map.put("*x1", a).unwrap();

        assert_eq!(map.get(Some("?x1")), Some(a));
        assert_eq!(map.get(Some("*x1")), Some(a));
        assert!(matches!(map.put("?x1", b), Err(CgifError::Variable(_))));
        assert_eq!(map.get(Some("*x1")), Some(a));
    }

    #[test]
    fn test_get_is_null_safe() {
        let map = ReferentMap::new();
        assert_eq!(map.get(None), None);
        assert_eq!(map.get(Some("?missing")), None);
    }

    #[test]
    fn test_literal_referents() {
        let (a, _) = two_ids();
        let mut map = ReferentMap::new();
        map.put("Tom", a).unwrap();
        assert_eq!(map.get(Some("Tom")), Some(a));
        assert_eq!(map.get(Some("?Tom")), Some(a));
        assert!(map.contains("*Tom"));
    }

    #[test]
    fn test_clear_allows_rebinding() {
        let (a, b) = two_ids();
        let mut map = ReferentMap::new();
        map.put("*x", a).unwrap();
        map.clear();
        assert!(map.is_empty());
        map.put("*x", b).unwrap();
        assert_eq!(map.get(Some("?x")), Some(b));
    }
}

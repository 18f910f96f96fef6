use crate::config::ReaderConfig;
use crate::error::{CgifError, Result};
use crate::quote::{unquotify, unquotify_with_prefix};
use crate::referents::{normalize_variable, ReferentMap};
use crate::writer::LAYOUT_COMMENT_MARKER;
use cg_graph::{Concept, ConceptGraph, GraphError, Layout, ObjectId, ObjectKind};

/// Result of a finished parse session
#[derive(Debug)]
pub struct ParseOutput {
    pub graph: ConceptGraph,
    pub referents: ReferentMap,
}

/// Which way an argument arrow points relative to its relation/actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// concept -> node
    Input,
    /// node -> concept
    Output,
}

/// What a pending variable will be wired into once it is bound
#[derive(Debug, Clone, Copy)]
enum PendingLink {
    Argument {
        node: ObjectId,
        position: usize,
        direction: Direction,
    },
    Coreference {
        concept: ObjectId,
    },
}

/// Variable that had no binding yet when it was used
#[derive(Debug, Clone)]
struct Pending {
    ctx: ObjectId,
    variable: String,
    key: String,
    link: PendingLink,
}

/// Builds a conceptual graph from parsed CGIF productions.
///
/// Variable bindings are graph-global: one [`ReferentMap`] serves the
/// root and every nested context of the session.
#[derive(Debug)]
pub struct ParserBuilder {
    graph: ConceptGraph,
    referents: ReferentMap,
    defer_unresolved: bool,
    pending: Vec<Pending>,
}

impl ParserBuilder {
    /// Strict builder: every variable must be bound before it is used
    pub fn new() -> Self {
        Self::with_graph(ConceptGraph::new(), &ReaderConfig::strict())
    }

    pub fn with_config(config: &ReaderConfig) -> Self {
        Self::with_graph(ConceptGraph::new(), config)
    }

    /// Build into an existing graph
    pub fn with_graph(graph: ConceptGraph, config: &ReaderConfig) -> Self {
        Self {
            graph,
            referents: ReferentMap::new(),
            defer_unresolved: config.defer_unresolved,
            pending: Vec::new(),
        }
    }

    pub fn graph(&self) -> &ConceptGraph {
        &self.graph
    }

    pub fn referents(&self) -> &ReferentMap {
        &self.referents
    }

    pub fn referents_mut(&mut self) -> &mut ReferentMap {
        &mut self.referents
    }

    /// Variables still waiting for a defining occurrence
    pub fn pending_variables(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(|p| p.variable.as_str())
    }

    /// Concept production.
    ///
    /// The first concept to use a variable binds it; later defining
    /// occurrences of the same name are kept unbound. A bound reference
    /// such as `?x` becomes a coreference line to the binding concept.
    pub fn make_concept(
        &mut self,
        ctx: ObjectId,
        type_label: &str,
        referent: &str,
        layout: Option<&str>,
    ) -> Result<ObjectId> {
        log::debug!(
            "Create concept - type: {} - referent: {} - layout: {:?}",
            type_label,
            referent,
            layout
        );
        self.build_concept(ctx, type_label, referent, false, false, layout)
    }

    /// Concept production for a concept that holds nested productions
    pub fn make_context(
        &mut self,
        ctx: ObjectId,
        type_label: &str,
        referent: &str,
        negated: bool,
        layout: Option<&str>,
    ) -> Result<ObjectId> {
        log::debug!(
            "Create context - type: {} - referent: {} - negated: {}",
            type_label,
            referent,
            negated
        );
        self.build_concept(ctx, type_label, referent, negated, true, layout)
    }

    /// Mark an already built concept as negated
    pub fn negate(&mut self, concept: ObjectId) -> Result<()> {
        self.graph
            .concept_mut(concept)
            .ok_or(GraphError::ObjectNotFound(concept))?
            .negated = true;
        Ok(())
    }

    /// `[Type: NAME]` declaration; names are unique case-insensitively
    /// across the whole graph
    pub fn make_type_label(&mut self, ctx: ObjectId, type_label: &str, layout: Option<&str>) -> Result<ObjectId> {
        log::debug!("Create type label - type: {} - layout: {:?}", type_label, layout);
        let name = unquotify(type_label)?;

        if self.find_type_label(&name)?.is_some() {
            return Err(CgifError::subtype(format!(
                "Type label {} is already declared.",
                name
            )));
        }

        let id = self.graph.insert_type_label(ctx, name)?;
        self.apply_layout(id, layout)?;
        Ok(id)
    }

    /// `(subtype SUB SUPER)` assertion between two declared type labels
    pub fn make_gen_spec_link(
        &mut self,
        ctx: ObjectId,
        subtype: &str,
        supertype: &str,
        layout: Option<&str>,
    ) -> Result<ObjectId> {
        log::debug!("Create subtype link - {} < {}", subtype, supertype);
        let subtype = unquotify(subtype)?;
        let supertype = unquotify(supertype)?;
        let sub = self.find_type_label(&subtype)?;
        let sup = self.find_type_label(&supertype)?;

        let (sub, sup) = match (sub, sup) {
            (Some(sub), Some(sup)) => (sub, sup),
            (sub, sup) => {
                let mut missing = Vec::new();
                if sub.is_none() {
                    missing.push(format!("subtype \"{}\" not found.", subtype));
                }
                if sup.is_none() {
                    missing.push(format!("supertype \"{}\" not found.", supertype));
                }
                return Err(CgifError::subtype(missing.join(" ")));
            }
        };

        let id = self.graph.insert_gen_spec_link(ctx, sub, sup)?;
        self.apply_layout(id, layout)?;
        Ok(id)
    }

    /// Relation production; every variable but the last is an input, the
    /// last one is the output
    pub fn make_relation<S: AsRef<str>>(
        &mut self,
        ctx: ObjectId,
        name: &str,
        variables: &[S],
        layout: Option<&str>,
    ) -> Result<ObjectId> {
        log::debug!("Parsed relation - name: {} - {} arguments", name, variables.len());
        let relation = self.graph.insert_relation(ctx, unquotify(name)?)?;
        self.apply_layout(relation, layout)?;

        for (index, variable) in variables.iter().enumerate() {
            let direction = if index + 1 == variables.len() {
                Direction::Output
            } else {
                Direction::Input
            };
            self.connect(ctx, relation, variable.as_ref(), index + 1, direction)?;
        }

        Ok(relation)
    }

    /// Actor production with explicit input and output lists
    pub fn make_actor<S: AsRef<str>, T: AsRef<str>>(
        &mut self,
        ctx: ObjectId,
        name: &str,
        inputs: &[S],
        outputs: &[T],
        layout: Option<&str>,
    ) -> Result<ObjectId> {
        log::debug!(
            "Parsed actor - name: {} - {} inputs, {} outputs",
            name,
            inputs.len(),
            outputs.len()
        );
        let actor = self.graph.insert_actor(ctx, unquotify(name)?)?;
        self.apply_layout(actor, layout)?;

        let mut position = 0;
        for variable in inputs {
            position += 1;
            self.connect(ctx, actor, variable.as_ref(), position, Direction::Input)?;
        }
        for variable in outputs {
            position += 1;
            self.connect(ctx, actor, variable.as_ref(), position, Direction::Output)?;
        }

        Ok(actor)
    }

    /// End the session; fails if a variable never got its defining occurrence
    pub fn finish(self) -> Result<ParseOutput> {
        if let Some(pending) = self.pending.first() {
            return Err(CgifError::variable(format!(
                "Variable \"{}\" not found.",
                pending.variable
            )));
        }

        log::info!(
            "Built graph: {} objects, {} variables",
            self.graph.object_count(),
            self.referents.len()
        );

        Ok(ParseOutput {
            graph: self.graph,
            referents: self.referents,
        })
    }

    fn build_concept(
        &mut self,
        ctx: ObjectId,
        type_label: &str,
        referent: &str,
        negated: bool,
        context: bool,
        layout: Option<&str>,
    ) -> Result<ObjectId> {
        let type_label = unquotify(type_label)?;
        let referent = unquotify_with_prefix(referent)?;

        // `?x` names an earlier concept, so this one carries no referent itself
        let (stored, reference) = if referent.starts_with('?') {
            (String::new(), Some(referent))
        } else {
            (referent, None)
        };
        let concept = Concept::new(type_label, stored.clone()).negated(negated);

        let id = if context {
            self.graph.insert_context(ctx, concept)?
        } else {
            self.graph.insert_concept(ctx, concept)?
        };

        match reference {
            Some(variable) => self.link(ctx, variable, PendingLink::Coreference { concept: id })?,
            None => self.bind(&stored, id)?,
        }
        self.apply_layout(id, layout)?;
        Ok(id)
    }

    fn bind(&mut self, referent: &str, id: ObjectId) -> Result<()> {
        if referent.is_empty() {
            return Ok(());
        }
        let key = binding_key(referent);
        if self.referents.contains(&key) {
            log::warn!("Variable {} is already bound; keeping the first binding", key);
            return Ok(());
        }
        self.referents.put(&key, id)?;
        self.resolve_pending(&key, id)
    }

    fn resolve_pending(&mut self, key: &str, target: ObjectId) -> Result<()> {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.key == key);
        self.pending = waiting;

        for pending in ready {
            log::debug!("Resolved forward reference {}", pending.variable);
            self.wire(pending.ctx, target, pending.link)?;
        }
        Ok(())
    }

    fn connect(
        &mut self,
        ctx: ObjectId,
        node: ObjectId,
        variable: &str,
        position: usize,
        direction: Direction,
    ) -> Result<()> {
        let variable = unquotify_with_prefix(variable)?;
        self.link(
            ctx,
            variable,
            PendingLink::Argument {
                node,
                position,
                direction,
            },
        )
    }

    /// Wire `link` to the concept bound to `variable`, or park it until
    /// that variable is bound
    fn link(&mut self, ctx: ObjectId, variable: String, link: PendingLink) -> Result<()> {
        match self.referents.get(Some(&variable)) {
            Some(target) => self.wire(ctx, target, link),
            None if self.defer_unresolved => {
                self.pending.push(Pending {
                    ctx,
                    key: normalize_variable(&variable),
                    variable,
                    link,
                });
                Ok(())
            }
            None => Err(CgifError::variable(format!(
                "Variable \"{}\" not found.",
                variable
            ))),
        }
    }

    fn wire(&mut self, ctx: ObjectId, target: ObjectId, link: PendingLink) -> Result<()> {
        match link {
            PendingLink::Argument {
                node,
                position,
                direction,
            } => self.insert_arrow(ctx, node, target, position, direction),
            PendingLink::Coreference { concept } => {
                self.graph.insert_coref(ctx, target, concept)?;
                Ok(())
            }
        }
    }

    fn insert_arrow(
        &mut self,
        ctx: ObjectId,
        node: ObjectId,
        concept: ObjectId,
        position: usize,
        direction: Direction,
    ) -> Result<()> {
        let (from, to) = match direction {
            Direction::Input => (concept, node),
            Direction::Output => (node, concept),
        };
        self.graph.insert_arrow(ctx, from, to, position.to_string())?;
        Ok(())
    }

    fn find_type_label(&self, name: &str) -> Result<Option<ObjectId>> {
        let wanted = name.to_lowercase();
        let found = self
            .graph
            .deep_objects_of_kind(ObjectId::ROOT, ObjectKind::TypeLabel)?
            .find(|obj| obj.text_label().to_lowercase() == wanted)
            .map(|obj| obj.id);
        Ok(found)
    }

    fn apply_layout(&mut self, id: ObjectId, layout: Option<&str>) -> Result<()> {
        let Some(layout) = layout else {
            return Ok(());
        };
        let mut parsed = Layout::parse_xml(layout).map_err(|e| CgifError::Layout(e.to_string()))?;
        parsed.resize_if_necessary();
        self.graph.set_layout(id, parsed)?;
        Ok(())
    }
}

impl Default for ParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Layout payload of a comment, if it carries the layout marker.
///
/// `comment` is the raw comment text including `/*` and `*/`; several
/// comments may be run together.
pub fn extract_layout_comment(comment: Option<&str>) -> Option<String> {
    let comment = comment?;
    let start = comment.find(LAYOUT_COMMENT_MARKER)? + LAYOUT_COMMENT_MARKER.len();
    let rest = &comment[start..];
    let end = rest.find("*/").unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

/// Key a defining referent binds under.
///
/// A labelled referent such as `@every *p` binds its label `*p`. Set
/// referents and sigil-free literals such as `Tom#1` bind as themselves.
fn binding_key(referent: &str) -> String {
    if !referent.trim_start().starts_with('{') {
        if let Some(index) = referent.rfind('*') {
            let label = referent[index + 1..].trim();
            if !label.is_empty() {
                return format!("*{}", label);
            }
        }
    }
    normalize_variable(referent)
}

/// First layout payload found among two candidate comments
pub fn first_layout_comment(first: Option<&str>, second: Option<&str>) -> Option<String> {
    extract_layout_comment(first).or_else(|| extract_layout_comment(second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_graph::Payload;

    const ROOT: ObjectId = ObjectId::ROOT;

    fn arrow_ends(builder: &ParserBuilder, node: ObjectId) -> (Vec<ObjectId>, Vec<ObjectId>) {
        arrow_ends_in(builder.graph(), node)
    }

    fn arrow_ends_in(graph: &ConceptGraph, node: ObjectId) -> (Vec<ObjectId>, Vec<ObjectId>) {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for &edge_id in graph.edges_of(node) {
            if let Some(Payload::Arrow(edge)) = graph.get(edge_id).map(|o| &o.payload) {
                if edge.to == node {
                    inputs.push(edge.from);
                } else {
                    outputs.push(edge.to);
                }
            }
        }
        (inputs, outputs)
    }

    #[test]
    fn test_relation_wiring() {
        let mut builder = ParserBuilder::new();
        let a = builder.make_concept(ROOT, "Cat", "*a", None).unwrap();
        let b = builder.make_concept(ROOT, "Mat", "*b", None).unwrap();
        let c = builder.make_concept(ROOT, "Room", "*c", None).unwrap();

        let near = builder.make_relation(ROOT, "near", &["?a", "?b", "?c"], None).unwrap();

        let (inputs, outputs) = arrow_ends(&builder, near);
        assert_eq!(inputs, vec![a, b]);
        assert_eq!(outputs, vec![c]);
    }

    #[test]
    fn test_unresolved_variable_fails_in_strict_mode() {
        let mut builder = ParserBuilder::new();
        builder.make_concept(ROOT, "Cat", "*a", None).unwrap();
        let err = builder.make_relation(ROOT, "near", &["?a", "?zz"], None).unwrap_err();
        assert!(matches!(err, CgifError::Variable(msg) if msg.contains("?zz")));
    }

    #[test]
    fn test_forward_reference_resolved_when_deferred() {
        let mut builder = ParserBuilder::with_config(&ReaderConfig::default());
        let rel = builder.make_relation(ROOT, "on", &["?a", "?b"], None).unwrap();
        assert_eq!(builder.pending_variables().count(), 2);

        let a = builder.make_concept(ROOT, "Cat", "*a", None).unwrap();
        let b = builder.make_concept(ROOT, "Mat", "*b", None).unwrap();
        assert_eq!(builder.pending_variables().count(), 0);

        let (inputs, outputs) = arrow_ends(&builder, rel);
        assert_eq!(inputs, vec![a]);
        assert_eq!(outputs, vec![b]);
        assert!(builder.finish().is_ok());
    }

    #[test]
    fn test_finish_reports_unresolved_variables() {
        let mut builder = ParserBuilder::with_config(&ReaderConfig::default());
        builder.make_relation(ROOT, "on", &["?ghost"], None).unwrap();
        assert!(matches!(builder.finish(), Err(CgifError::Variable(msg)) if msg.contains("?ghost")));
    }

    #[test]
    fn test_first_binder_wins() {
        let mut builder = ParserBuilder::new();
        let first = builder.make_concept(ROOT, "Cat", "*x", None).unwrap();
        let second = builder.make_concept(ROOT, "Cat", "*x", None).unwrap();

        assert_ne!(first, second);
        assert_eq!(builder.referents().get(Some("?x")), Some(first));
    }

    #[test]
    fn test_quantified_referent_binds_its_label() {
        let mut builder = ParserBuilder::with_config(&ReaderConfig::default());
        let walks = builder.make_relation(ROOT, "walks", &["?p"], None).unwrap();
        let person = builder.make_concept(ROOT, "Person", "\"@every *p\"", None).unwrap();
        let output = builder.finish().unwrap();

        assert_eq!(output.graph.concept(person).unwrap().referent, "@every *p");
        assert_eq!(output.referents.get(Some("?p")), Some(person));
        let (_, outputs) = arrow_ends_in(&output.graph, walks);
        assert_eq!(outputs, vec![person]);
    }

    #[test]
    fn test_binding_keys() {
        assert_eq!(binding_key("*x"), "*x");
        assert_eq!(binding_key("@every *p"), "*p");
        assert_eq!(binding_key("@every * p "), "*p");
        assert_eq!(binding_key("Tom#1"), "*Tom#1");
        assert_eq!(binding_key("Tom"), "*Tom");
        assert_eq!(binding_key("{*x1}"), "*{*x1}");
        assert_eq!(binding_key("@some *"), "*@some *");
    }

    #[test]
    fn test_designator_binds_as_literal() {
        let mut builder = ParserBuilder::new();
        let tom = builder.make_concept(ROOT, "Cat", "\"Tom#1\"", None).unwrap();
        let sits = builder.make_relation(ROOT, "sits", &["\"Tom#1\""], None).unwrap();

        let (_, outputs) = arrow_ends(&builder, sits);
        assert_eq!(outputs, vec![tom]);
    }

    #[test]
    fn test_bound_reference_becomes_coreference() {
        let mut builder = ParserBuilder::with_config(&ReaderConfig::default());
        let pet = builder.make_concept(ROOT, "Pet", "?x1", None).unwrap();
        let animal = builder.make_concept(ROOT, "Animal", "*x1", None).unwrap();
        let output = builder.finish().unwrap();

        assert_eq!(output.graph.concept(pet).unwrap().referent, "");
        let network = output.graph.coref_network();
        assert!(network.contains_edge(animal, pet));

        let mut strict = ParserBuilder::new();
        assert!(matches!(
            strict.make_concept(ROOT, "Pet", "?nobody", None),
            Err(CgifError::Variable(_))
        ));
    }

    #[test]
    fn test_concept_text_is_unquoted() {
        let mut builder = ParserBuilder::new();
        let id = builder
            .make_concept(ROOT, "\"Big City\"", "\"New \\\"York\\\"\"", None)
            .unwrap();
        let concept = builder.graph().concept(id).unwrap();
        assert_eq!(concept.type_label, "Big City");
        assert_eq!(concept.referent, "New \"York\"");

        assert!(matches!(
            builder.make_concept(ROOT, "\"Broken", "x", None),
            Err(CgifError::Format(_))
        ));
    }

    #[test]
    fn test_duplicate_type_label_is_case_insensitive() {
        let mut builder = ParserBuilder::new();
        builder.make_type_label(ROOT, "Person", None).unwrap();
        let ctx = builder.make_context(ROOT, "Proposition", "", false, None).unwrap();
        let err = builder.make_type_label(ctx, "person", None).unwrap_err();
        assert!(matches!(err, CgifError::Subtype(_)));
    }

    #[test]
    fn test_gen_spec_link_reports_missing_sides() {
        let mut builder = ParserBuilder::new();
        builder.make_type_label(ROOT, "Cat", None).unwrap();
        builder.make_type_label(ROOT, "Animal", None).unwrap();

        assert!(builder.make_gen_spec_link(ROOT, "cat", "ANIMAL", None).is_ok());

        let err = builder.make_gen_spec_link(ROOT, "Dog", "Animal", None).unwrap_err();
        assert!(matches!(&err, CgifError::Subtype(msg) if msg.contains("subtype \"Dog\"") && !msg.contains("supertype")));

        let err = builder.make_gen_spec_link(ROOT, "Dog", "Plant", None).unwrap_err();
        assert!(matches!(&err, CgifError::Subtype(msg) if msg.contains("\"Dog\"") && msg.contains("supertype \"Plant\"")));
    }

    #[test]
    fn test_actor_inputs_and_outputs() {
        let mut builder = ParserBuilder::new();
        let a = builder.make_concept(ROOT, "Number", "*a", None).unwrap();
        let b = builder.make_concept(ROOT, "Number", "*b", None).unwrap();
        let sum = builder.make_concept(ROOT, "Number", "*sum", None).unwrap();

        let plus = builder.make_actor(ROOT, "plus", &["?a", "?b"], &["?sum"], None).unwrap();
        let (inputs, outputs) = arrow_ends(&builder, plus);
        assert_eq!(inputs, vec![a, b]);
        assert_eq!(outputs, vec![sum]);
    }

    #[test]
    fn test_layout_is_applied_and_validated() {
        let mut builder = ParserBuilder::new();
        let id = builder
            .make_concept(
                ROOT,
                "Cat",
                "Tom",
                Some(r#"<layout> <rectangle x="3" y="4" width="2" height="50"/> </layout>"#),
            )
            .unwrap();
        let layout = builder.graph().get(id).unwrap().layout.unwrap();
        assert_eq!((layout.x, layout.y), (3.0, 4.0));
        assert_eq!(layout.width, cg_graph::MIN_WIDTH);

        let err = builder.make_concept(ROOT, "Cat", "Tim", Some("<layout/>")).unwrap_err();
        assert!(matches!(err, CgifError::Layout(_)));
    }

    #[test]
    fn test_extract_layout_comment() {
        let comment = "/*cglayout: <layout> <rectangle x=\"1\"/> </layout>*/";
        assert_eq!(
            extract_layout_comment(Some(comment)).as_deref(),
            Some("<layout> <rectangle x=\"1\"/> </layout>")
        );
        assert_eq!(extract_layout_comment(Some("/* plain note */")), None);
        assert_eq!(extract_layout_comment(None), None);

        assert_eq!(
            first_layout_comment(Some("/* note */"), Some("/*cglayout: <b/>*/")).as_deref(),
            Some("<b/>")
        );
        assert_eq!(
            first_layout_comment(Some("/*cglayout: <a/>*/"), Some("/*cglayout: <b/>*/")).as_deref(),
            Some("<a/>")
        );
    }

    #[test]
    fn test_arrows_are_labelled_by_position() {
        let mut builder = ParserBuilder::new();
        builder.make_concept(ROOT, "T", "*a", None).unwrap();
        builder.make_concept(ROOT, "T", "*b", None).unwrap();
        let rel = builder.make_relation(ROOT, "r", &["?b", "?a"], None).unwrap();

        let labels: Vec<_> = builder
            .graph()
            .edges_of(rel)
            .iter()
            .map(|&id| builder.graph().get(id).unwrap().text_label().to_string())
            .collect();
        assert_eq!(labels, vec!["1", "2"]);
    }
}

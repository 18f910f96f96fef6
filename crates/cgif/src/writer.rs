use crate::config::WriterConfig;
use crate::coref::{CorefResolver, NameTable};
use crate::error::{CgifError, Result};
use crate::names::NameGenerator;
use crate::ordering::sort_input_edges;
use crate::quote::{quotify, quotify_with_prefix};
use cg_graph::{ConceptGraph, GraphObject, Layout, ObjectId, ObjectKind, Payload};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Marks a CGIF comment as carrying layout for this codec
pub const LAYOUT_COMMENT_MARKER: &str = "cglayout:";

const LINE_SEPARATOR: &str = "\n";

static INTER_TAG_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s*<").expect("valid regex"));

/// Write `graph` as CGIF to `out`
pub fn write<W: Write>(out: W, graph: &ConceptGraph, config: &WriterConfig) -> Result<()> {
    CgifWriter::new(graph, out, config.clone()).write()?;
    Ok(())
}

/// Render `graph` as a CGIF string
pub fn write_to_string(graph: &ConceptGraph, config: &WriterConfig) -> Result<String> {
    let buf = CgifWriter::new(graph, Vec::new(), config.clone()).write()?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `graph` as CGIF to the file at `path`, replacing its contents
pub fn write_to_file(path: impl AsRef<Path>, graph: &ConceptGraph, config: &WriterConfig) -> Result<()> {
    let file = File::create(path.as_ref())?;
    CgifWriter::new(graph, BufWriter::new(file), config.clone()).write()?;
    log::debug!("Wrote CGIF to {}", path.as_ref().display());
    Ok(())
}

/// One-shot CGIF serializer.
///
/// Name generation state and the coreference name table live only as long
/// as the writer, and [`CgifWriter::write`] consumes it, so nothing leaks
/// from one write into the next.
pub struct CgifWriter<'g, W: Write> {
    graph: &'g ConceptGraph,
    out: W,
    config: WriterConfig,
    names: NameGenerator,
    table: NameTable,
    corefs: CorefResolver,
}

/// Immediate objects of one context, split by kind
#[derive(Default)]
struct Partition {
    /// Concepts in reverse encounter order, then subcontexts in encounter order
    concepts: VecDeque<ObjectId>,
    relations: Vec<ObjectId>,
    actors: Vec<ObjectId>,
    gen_spec_links: Vec<ObjectId>,
}

impl<'g, W: Write> CgifWriter<'g, W> {
    pub fn new(graph: &'g ConceptGraph, out: W, config: WriterConfig) -> Self {
        Self {
            graph,
            out,
            config,
            names: NameGenerator::new(),
            table: NameTable::new(),
            corefs: CorefResolver::new(graph),
        }
    }

    /// Serialize the whole graph and hand back the sink
    pub fn write(mut self) -> Result<W> {
        self.config.validate().map_err(CgifError::invalid_config)?;

        self.names.add_names(self.graph);
        self.write_context(ObjectId::ROOT, "", 0)?;
        self.out.flush()?;

        log::info!(
            "Wrote CGIF: {} objects, {} coreference names",
            self.graph.object_count(),
            self.table.len()
        );

        Ok(self.out)
    }

    fn write_context(&mut self, ctx: ObjectId, indent: &str, depth: usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(CgifError::DepthLimit {
                limit: self.config.max_depth,
            });
        }

        let parts = self.partition(ctx)?;
        log::debug!(
            "Writing context {} (depth {}): {} concepts, {} relations, {} actors, {} subtype links",
            ctx,
            depth,
            parts.concepts.len(),
            parts.relations.len(),
            parts.actors.len(),
            parts.gen_spec_links.len()
        );

        if self.config.export_subtypes {
            self.write_gen_spec_links(&parts.gen_spec_links, indent)?;
        }

        // concepts with explicit labels such as [Number: *x] name their whole
        // coreference set before anything is printed
        for &id in &parts.concepts {
            self.register_explicit_label(id);
        }

        self.write_concepts(&parts.concepts, indent, depth)?;
        self.write_linking_nodes(&parts.relations, indent, false)?;
        self.write_linking_nodes(&parts.actors, indent, true)?;

        Ok(())
    }

    fn partition(&self, ctx: ObjectId) -> Result<Partition> {
        let mut parts = Partition::default();

        for obj in self.graph.objects_in(ctx)? {
            match obj.kind() {
                ObjectKind::Context => parts.concepts.push_back(obj.id),
                ObjectKind::Concept => parts.concepts.push_front(obj.id),
                ObjectKind::Relation => parts.relations.push(obj.id),
                ObjectKind::Actor => parts.actors.push(obj.id),
                ObjectKind::GenSpecLink => parts.gen_spec_links.push(obj.id),
                ObjectKind::TypeLabel | ObjectKind::Arrow | ObjectKind::Coref => {}
            }
        }

        Ok(parts)
    }

    /// Types on one line, then the `(subtype ...)` assertion on the next
    fn write_gen_spec_links(&mut self, links: &[ObjectId], indent: &str) -> Result<()> {
        let graph = self.graph;
        let mut emitted: Vec<&str> = Vec::new();

        for &id in links {
            let Some(edge) = graph.get(id).and_then(GraphObject::as_edge) else {
                continue;
            };
            let (Some(subtype), Some(supertype)) = (graph.get(edge.from), graph.get(edge.to)) else {
                continue;
            };

            let mut types_line = String::from(indent);
            let mut declared = false;
            for label in [subtype, supertype] {
                let name = label.text_label();
                if emitted.contains(&name) {
                    continue;
                }
                types_line.push('[');
                if self.config.write_comments {
                    types_line.push_str(&self.comment(label));
                }
                types_line.push_str("Type: ");
                types_line.push_str(&quotify(name));
                types_line.push_str("] ");
                emitted.push(name);
                declared = true;
            }

            let subtype_line = format!(
                "{}(subtype {} {}) ",
                indent,
                quotify(subtype.text_label()),
                quotify(supertype.text_label())
            );

            if declared {
                write!(self.out, "{}{}", types_line, LINE_SEPARATOR)?;
            }
            write!(self.out, "{}{}", subtype_line, LINE_SEPARATOR)?;
        }

        Ok(())
    }

    /// Register the coreference name carried by an explicit referent such
    /// as `*x`, `@every *x`, `{*x}` or `{*}@3`
    fn register_explicit_label(&mut self, id: ObjectId) {
        let Some(referent) = self.graph.concept(id).map(|c| c.referent.as_str()) else {
            return;
        };
        let Some(index) = referent.find('*') else {
            return;
        };
        if index + 1 >= referent.len() {
            return;
        }

        let coref_name = if referent.contains('{') {
            let squeezed = referent.trim().replace(' ', "");
            if squeezed.starts_with("{*}") {
                // anonymous set: give it a generated name, keep any suffix
                format!("{{*{}}}{}", self.names.generate_name(), &squeezed[3..])
            } else {
                referent.to_string()
            }
        } else {
            referent[index + 1..].trim().to_string()
        };

        if !coref_name.is_empty() {
            self.corefs.register(&mut self.table, id, &coref_name);
        }
    }

    fn write_concepts(&mut self, concepts: &VecDeque<ObjectId>, indent: &str, depth: usize) -> Result<()> {
        if concepts.is_empty() {
            return Ok(());
        }

        let graph = self.graph;
        write!(self.out, "{}", indent)?;

        let mut first = true;
        for &id in concepts {
            let Some(obj) = graph.get(id) else {
                continue;
            };
            let Some(concept) = obj.as_concept() else {
                continue;
            };

            // subcontexts, and every concept when comments are on, start a new line
            if !first && (self.config.write_comments || obj.is_context()) {
                write!(self.out, "{}{}", LINE_SEPARATOR, indent)?;
            }
            first = false;

            write!(self.out, "{}", if concept.negated { "~[" } else { "[" })?;

            if self.config.write_comments {
                let comment = self.comment(obj);
                write!(self.out, " {} ", comment)?;
            }

            let type_label = concept.type_label.trim();
            if !type_label.is_empty() {
                write!(self.out, "{}: ", quotify(type_label))?;
            }

            let referent = self.render_referent(id, &concept.referent);
            write!(self.out, "{}", referent)?;

            if obj.is_context() {
                write!(self.out, "{}", LINE_SEPARATOR)?;
                let nested_indent = format!("{}{}", indent, self.config.indent);
                self.write_context(id, &nested_indent, depth + 1)?;
            }

            write!(self.out, "] ")?;
        }

        Ok(())
    }

    /// Defining label for the first unnamed generic concept of a coreference
    /// set, bound label for the rest, literal text otherwise
    fn render_referent(&mut self, id: ObjectId, referent: &str) -> String {
        if !NameGenerator::is_generic_name(Some(referent)) {
            // `{*}@3` is written under the set name the prescan gave it
            if referent.replace(' ', "").starts_with("{*}") {
                if let Some(name) = self.table.get(id).filter(|name| name.starts_with('{')) {
                    return name.to_string();
                }
            }
            return quotify_with_prefix(referent);
        }

        match self.table.get(id) {
            Some(name) if name.starts_with('{') => name.to_string(),
            Some(name) => format!("?{}", name),
            None => {
                let name = self.names.generate_name();
                if referent.trim_start().starts_with('{') {
                    let set = format!("{{*{}}}", name);
                    self.corefs.register(&mut self.table, id, &set);
                    set
                } else {
                    self.corefs.register(&mut self.table, id, &name);
                    format!("*{}", name)
                }
            }
        }
    }

    /// Relations as `(label in.. out)`, actors as `<label in.. | out..>`
    fn write_linking_nodes(&mut self, nodes: &[ObjectId], indent: &str, actors: bool) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }

        let graph = self.graph;
        write!(self.out, "{}{}", LINE_SEPARATOR, indent)?;

        let mut first = true;
        for &id in nodes {
            let Some(node) = graph.get(id) else {
                continue;
            };

            if !first && self.config.write_comments {
                write!(self.out, "{}{}", LINE_SEPARATOR, indent)?;
            }
            first = false;

            let mut inputs = Vec::new();
            let mut outputs = Vec::new();
            for &edge_id in &node.edges {
                if let Some(Payload::Arrow(edge)) = graph.get(edge_id).map(|e| &e.payload) {
                    if edge.to == id {
                        inputs.push(edge_id);
                    } else {
                        outputs.push(edge_id);
                    }
                }
            }
            sort_input_edges(graph, &mut inputs);

            write!(self.out, "{}", if actors { '<' } else { '(' })?;

            if self.config.write_comments {
                let comment = self.comment(node);
                write!(self.out, " {} ", comment)?;
            }

            write!(self.out, "{}", quotify(node.text_label()))?;

            for &edge_id in &inputs {
                self.write_argument(id, edge_id)?;
            }

            if actors {
                write!(self.out, " |")?;
            }

            for &edge_id in &outputs {
                self.write_argument(id, edge_id)?;
            }

            write!(self.out, "{}", if actors { '>' } else { ')' })?;
        }

        Ok(())
    }

    /// The concept at the far end of an arrow, as a bound label if it has
    /// a coreference name, else as its literal referent
    fn write_argument(&mut self, node: ObjectId, edge_id: ObjectId) -> Result<()> {
        let graph = self.graph;
        let Some(edge) = graph.get(edge_id).and_then(GraphObject::as_edge) else {
            return Ok(());
        };
        let linked = edge.opposite(node);

        let label = match self.table.get(linked) {
            Some(name) => format!("?{}", name),
            None => match graph.concept(linked) {
                Some(concept) => concept.referent.clone(),
                None => return Ok(()),
            },
        };

        write!(self.out, " {}", quotify_with_prefix(&label))?;
        Ok(())
    }

    /// Layout of `obj` as a single-line marked comment
    fn comment(&self, obj: &GraphObject) -> String {
        let xml = obj.layout.unwrap_or_default().to_xml("");
        let xml = xml.replace(LINE_SEPARATOR, "");
        let xml = INTER_TAG_SPACE.replace_all(&xml, "> <");
        format!(" /*{} {}*/ ", LAYOUT_COMMENT_MARKER, xml)
    }
}

/// Layout comment text for a given layout, as the writer embeds it
pub fn layout_comment(layout: &Layout) -> String {
    let xml = layout.to_xml("").replace(LINE_SEPARATOR, "");
    format!("/*{} {}*/", LAYOUT_COMMENT_MARKER, INTER_TAG_SPACE.replace_all(&xml, "> <"))
}

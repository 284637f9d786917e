//! Match templates and parse-tree nodes.
//!
//! The engine treats templates as opaque handles. A [`TemplateRegistry`]
//! answers the questions rule editing needs (tags, class ancestry) and
//! receives the alt-slots summary; a [`NodeFactory`] turns successful
//! matches into caller-owned tree nodes. [`ObjectTable`] implements both in
//! memory.

use std::sync::Arc;

use gramprod_foundation::{Error, ErrorKind, PropId, Result, TemplateId, Value};

use crate::dictionary::MatchQuality;

// =============================================================================
// Service Traits
// =============================================================================

/// Template metadata consumed by rule editing.
pub trait TemplateRegistry {
    /// Returns the template's tag name, if it has one.
    fn tag(&self, template: TemplateId) -> Option<&str>;

    /// Returns true if `template` is `class` or inherits from it.
    fn is_kind_of(&self, template: TemplateId, class: TemplateId) -> bool;

    /// Replaces the template's alt-slots summary: the slots bound by `->` in
    /// the alternatives that build it.
    fn set_alt_slots(&mut self, template: TemplateId, slots: Vec<PropId>);
}

/// A value stored into a node slot.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotValue<N> {
    /// A sub-tree built from a non-terminal match.
    Node(N),
    /// The value of a matched input token (nil for an empty `*`).
    Token(Value),
}

/// Token-range and input metadata attached to every non-terminal node.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchInfo {
    /// First input token index covered (0-based).
    pub first: usize,
    /// Last input token index covered; `first > last` for an empty range.
    pub last: usize,
    /// The caller's input token list.
    pub tokens: Value,
    /// Per-position literal match quality for the whole parse.
    pub token_matches: Arc<[Option<MatchQuality>]>,
}

impl MatchInfo {
    /// Returns true if the node covers no input tokens.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first > self.last
    }
}

/// Builds the caller-owned tree for each successful parse.
pub trait NodeFactory {
    /// Node handle type.
    type Node: Clone;

    /// Creates a new node of the template's class.
    ///
    /// # Errors
    /// Errors propagate out of the parse call unchanged.
    fn instantiate(&mut self, template: TemplateId) -> Result<Self::Node>;

    /// Stores a child into one of the node's slots.
    ///
    /// # Errors
    /// Errors propagate out of the parse call unchanged.
    fn set_slot(&mut self, node: &Self::Node, slot: PropId, value: SlotValue<Self::Node>)
    -> Result<()>;

    /// Attaches range and input metadata.
    ///
    /// # Errors
    /// Errors propagate out of the parse call unchanged.
    fn set_match_info(&mut self, node: &Self::Node, info: MatchInfo) -> Result<()>;
}

// =============================================================================
// Object Table
// =============================================================================

/// Identifier of a node in an [`ObjectTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the raw index of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A registered template class.
#[derive(Clone, Debug)]
pub struct TemplateDef {
    /// Class name, for diagnostics.
    pub name: Arc<str>,
    /// Tag used by tag-based deletion.
    pub tag: Option<Arc<str>>,
    /// Superclass, if any.
    pub parent: Option<TemplateId>,
    /// Slots bound by the alternatives that build this template.
    pub alt_slots: Vec<PropId>,
}

/// A node built by the tree builder.
#[derive(Clone, Debug)]
pub struct ParseNode {
    /// Class of the node.
    pub template: TemplateId,
    /// Slot assignments, in assignment order.
    pub slots: Vec<(PropId, SlotValue<NodeId>)>,
    /// Range and input metadata.
    pub info: Option<MatchInfo>,
}

impl ParseNode {
    /// Returns the value assigned to a slot.
    #[must_use]
    pub fn slot(&self, prop: PropId) -> Option<&SlotValue<NodeId>> {
        self.slots.iter().rev().find(|(p, _)| *p == prop).map(|(_, v)| v)
    }
}

/// In-memory template registry and node store.
#[derive(Clone, Debug, Default)]
pub struct ObjectTable {
    templates: Vec<TemplateDef>,
    nodes: Vec<ParseNode>,
}

impl ObjectTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template class.
    ///
    /// # Panics
    ///
    /// Panics if the number of templates exceeds `u32::MAX`.
    pub fn define_template(&mut self, name: &str, parent: Option<TemplateId>) -> TemplateId {
        let id = TemplateId(u32::try_from(self.templates.len()).expect("too many templates"));
        self.templates.push(TemplateDef {
            name: name.into(),
            tag: None,
            parent,
            alt_slots: Vec::new(),
        });
        id
    }

    /// Registers a template class with a tag.
    pub fn define_tagged(
        &mut self,
        name: &str,
        tag: &str,
        parent: Option<TemplateId>,
    ) -> TemplateId {
        let id = self.define_template(name, parent);
        self.templates[id.index()].tag = Some(tag.into());
        id
    }

    /// Looks up a template.
    #[must_use]
    pub fn template(&self, id: TemplateId) -> Option<&TemplateDef> {
        self.templates.get(id.index())
    }

    /// Returns a template's alt-slots summary.
    #[must_use]
    pub fn alt_slots(&self, id: TemplateId) -> &[PropId] {
        self.template(id).map_or(&[], |t| t.alt_slots.as_slice())
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ParseNode> {
        self.nodes.get(id.index())
    }

    /// Number of nodes built so far.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Discards all nodes. Templates are kept.
    pub fn clear_nodes(&mut self) {
        self.nodes.clear();
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut ParseNode> {
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| Error::internal(format!("dangling node {id:?}")))
    }
}

impl TemplateRegistry for ObjectTable {
    fn tag(&self, template: TemplateId) -> Option<&str> {
        self.template(template)?.tag.as_deref()
    }

    fn is_kind_of(&self, template: TemplateId, class: TemplateId) -> bool {
        let mut current = Some(template);
        // Bounded by the table size so a malformed parent cycle cannot hang.
        for _ in 0..=self.templates.len() {
            match current {
                Some(t) if t == class => return true,
                Some(t) => current = self.template(t).and_then(|d| d.parent),
                None => return false,
            }
        }
        false
    }

    fn set_alt_slots(&mut self, template: TemplateId, slots: Vec<PropId>) {
        if let Some(def) = self.templates.get_mut(template.index()) {
            def.alt_slots = slots;
        }
    }
}

impl NodeFactory for ObjectTable {
    type Node = NodeId;

    fn instantiate(&mut self, template: TemplateId) -> Result<NodeId> {
        if self.template(template).is_none() {
            return Err(Error::new(ErrorKind::UnknownTemplate(template)));
        }
        let id = NodeId(
            u32::try_from(self.nodes.len())
                .map_err(|_| Error::internal("node table is full"))?,
        );
        self.nodes.push(ParseNode {
            template,
            slots: Vec::new(),
            info: None,
        });
        Ok(id)
    }

    fn set_slot(&mut self, node: &NodeId, slot: PropId, value: SlotValue<NodeId>) -> Result<()> {
        self.node_mut(*node)?.slots.push((slot, value));
        Ok(())
    }

    fn set_match_info(&mut self, node: &NodeId, info: MatchInfo) -> Result<()> {
        self.node_mut(*node)?.info = Some(info);
        Ok(())
    }
}

use indextree::{Arena, NodeId};
use smallvec::SmallVec;

pub mod tags;
mod walker;

pub use tags::{TagCategory, TagTable};
pub use walker::TreeWalker;

/// Attribute that marks editor-internal nodes which never count as content.
pub const BOGUS_ATTR: &str = "data-bogus";
/// Attribute that has to stay unique within a document.
pub const ID_ATTR: &str = "id";

pub type Attributes = SmallVec<[(String, String); 4]>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Attributes,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: SmallVec::new(),
        }
    }

    pub fn with_attrs<I>(tag: &str, attrs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut element = Self::new(tag);
        for (name, value) in attrs {
            element.set_attr(&name, value);
        }
        element
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(idx).1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element(Element),
    Text(String),
}

/// Mutable content tree. Nodes live in an arena and are addressed by
/// [`NodeId`]; parent links are arena lookups, never owning pointers.
#[derive(Clone, Debug)]
pub struct Document {
    arena: Arena<NodeData>,
    root: NodeId,
}

impl Document {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData::Document);
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create(&mut self, data: NodeData) -> NodeId {
        self.arena.new_node(data)
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create(NodeData::Element(Element::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeData::Text(text.into()))
    }

    /// Copies the node's own data (tag and attributes, or text) into a new
    /// detached node. Children are not copied.
    pub fn shallow_clone(&mut self, node: NodeId) -> NodeId {
        let data = self.data(node).clone();
        self.create(data)
    }

    pub fn data(&self, node: NodeId) -> &NodeData {
        self.arena[node].get()
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.data(node) {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match self.arena[node].get_mut() {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(Element::tag)
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.data(node), NodeData::Text(_))
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.data(node) {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> bool {
        match self.arena[node].get_mut() {
            NodeData::Text(current) => {
                *current = text.into();
                true
            }
            _ => false,
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attr(name)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) -> bool {
        match self.element_mut(node) {
            Some(element) => {
                element.set_attr(name, value);
                true
            }
            None => false,
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.element_mut(node)?.remove_attr(name)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].parent()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].first_child()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].last_child()
    }

    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].previous_sibling()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].next_sibling()
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.children(&self.arena)
    }

    /// The node itself followed by its ancestors up to and including the root.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.ancestors(&self.arena)
    }

    /// Pre-order traversal of the subtree, starting with the node itself.
    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.descendants(&self.arena)
    }

    pub fn has_children(&self, node: NodeId) -> bool {
        self.first_child(node).is_some()
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.children(node).count()
    }

    pub fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).nth(index)
    }

    /// Position of the node among its siblings.
    pub fn index_of(&self, node: NodeId) -> usize {
        node.preceding_siblings(&self.arena).count().saturating_sub(1)
    }

    /// Character count for text nodes, child count for everything else.
    pub fn len(&self, node: NodeId) -> usize {
        match self.data(node) {
            NodeData::Text(text) => text.chars().count(),
            _ => self.child_count(node),
        }
    }

    /// Whether `node` is `ancestor` or lives somewhere below it.
    pub fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node).any(|candidate| candidate == ancestor)
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        !self.arena[node].is_removed() && self.is_inclusive_descendant(node, self.root)
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        parent.append(child, &mut self.arena);
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        reference.insert_before(node, &mut self.arena);
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        reference.insert_after(node, &mut self.arena);
    }

    pub fn insert_at(&mut self, parent: NodeId, index: usize, node: NodeId) {
        match self.child_at(parent, index) {
            Some(reference) if reference != node => self.insert_before(reference, node),
            Some(_) => {}
            None => self.append(parent, node),
        }
    }

    pub fn detach(&mut self, node: NodeId) {
        node.detach(&mut self.arena);
    }

    /// Removes the node together with its subtree.
    pub fn remove(&mut self, node: NodeId) {
        node.remove_subtree(&mut self.arena);
    }

    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        self.insert_before(old, new);
        self.remove(old);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph_with_text(document: &mut Document, text: &str) -> (NodeId, NodeId) {
        let paragraph = document.create_element("P");
        let text = document.create_text(text);
        document.append(paragraph, text);
        document.append(document.root(), paragraph);
        (paragraph, text)
    }

    #[test]
    fn tags_are_lowercased() {
        let mut document = Document::new();
        let (paragraph, _) = paragraph_with_text(&mut document, "x");
        assert_eq!(document.tag(paragraph), Some("p"));
    }

    #[test]
    fn len_counts_characters_and_children() {
        let mut document = Document::new();
        let (paragraph, text) = paragraph_with_text(&mut document, "grüße");
        assert_eq!(document.len(text), 5);
        assert_eq!(document.len(paragraph), 1);
    }

    #[test]
    fn insert_at_places_node_by_index() {
        let mut document = Document::new();
        let root = document.root();
        let a = document.create_element("p");
        let b = document.create_element("div");
        let c = document.create_element("pre");
        document.append(root, a);
        document.append(root, c);
        document.insert_at(root, 1, b);
        let tags: Vec<_> = document
            .children(root)
            .filter_map(|child| document.tag(child))
            .collect();
        assert_eq!(tags, vec!["p", "div", "pre"]);
        assert_eq!(document.index_of(c), 2);
    }

    #[test]
    fn shallow_clone_keeps_attributes_but_not_children() {
        let mut document = Document::new();
        let (paragraph, _) = paragraph_with_text(&mut document, "x");
        document.set_attr(paragraph, "class", "lead");
        let copy = document.shallow_clone(paragraph);
        assert_eq!(document.attr(copy, "class"), Some("lead"));
        assert!(!document.has_children(copy));
        assert!(!document.is_attached(copy));
    }

    #[test]
    fn replace_swaps_subtrees() {
        let mut document = Document::new();
        let (paragraph, text) = paragraph_with_text(&mut document, "x");
        let heading = document.create_element("h1");
        document.replace(paragraph, heading);
        assert_eq!(document.first_child(document.root()), Some(heading));
        assert!(!document.is_attached(text));
    }

    #[test]
    fn set_attr_overwrites_existing_value() {
        let mut element = Element::new("span");
        element.set_attr("ID", "a");
        element.set_attr("id", "b");
        assert_eq!(element.attrs().len(), 1);
        assert_eq!(element.attr("id"), Some("b"));
        assert_eq!(element.remove_attr("id"), Some("b".to_string()));
        assert_eq!(element.attr("id"), None);
    }
}

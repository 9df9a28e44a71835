use indextree::NodeId;

use super::Document;

/// Cursor over a subtree in document order. The walk never leaves `root`
/// and never yields `root` itself.
pub struct TreeWalker<'a> {
    document: &'a Document,
    root: NodeId,
    current: Option<NodeId>,
}

impl<'a> TreeWalker<'a> {
    pub fn new(document: &'a Document, start: NodeId, root: NodeId) -> Self {
        Self {
            document,
            root,
            current: Some(start),
        }
    }

    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Advances in pre-order: first child, then next sibling, then the
    /// next sibling of the closest ancestor below `root` that has one.
    pub fn next_node(&mut self) -> Option<NodeId> {
        let node = self.current?;
        let next = match self.document.first_child(node) {
            Some(child) => Some(child),
            None => self.next_outside(node),
        };
        self.current = next;
        next
    }

    /// Steps back in reverse pre-order: the deepest last descendant of the
    /// previous sibling, otherwise the parent.
    pub fn prev_node(&mut self) -> Option<NodeId> {
        let node = self.current?;
        if node == self.root {
            self.current = None;
            return None;
        }
        let prev = match self.document.prev_sibling(node) {
            Some(mut sibling) => {
                while let Some(last) = self.document.last_child(sibling) {
                    sibling = last;
                }
                Some(sibling)
            }
            None => self
                .document
                .parent(node)
                .filter(|parent| *parent != self.root),
        };
        self.current = prev;
        prev
    }

    fn next_outside(&self, node: NodeId) -> Option<NodeId> {
        let mut node = node;
        loop {
            if node == self.root {
                return None;
            }
            if let Some(sibling) = self.document.next_sibling(node) {
                return Some(sibling);
            }
            node = self.document.parent(node)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;

    fn texts_forward(document: &Document, start: NodeId, root: NodeId) -> Vec<String> {
        let mut walker = TreeWalker::new(document, start, root);
        let mut out = Vec::new();
        while let Some(node) = walker.next_node() {
            out.push(describe(document, node));
        }
        out
    }

    fn texts_backward(document: &Document, start: NodeId, root: NodeId) -> Vec<String> {
        let mut walker = TreeWalker::new(document, start, root);
        let mut out = Vec::new();
        while let Some(node) = walker.prev_node() {
            out.push(describe(document, node));
        }
        out
    }

    fn describe(document: &Document, node: NodeId) -> String {
        match document.text(node) {
            Some(text) => text.to_string(),
            None => document.tag(node).unwrap_or("#document").to_string(),
        }
    }

    #[test]
    fn walks_forward_through_nested_inline_content() {
        let document = markup::parse_document("<p>a<b>b<i>c</i></b>d</p><p>e</p>").unwrap();
        let paragraph = document.first_child(document.root()).unwrap();
        let first = document.first_child(paragraph).unwrap();
        assert_eq!(
            texts_forward(&document, first, paragraph),
            vec!["b", "b", "i", "c", "d"]
        );
    }

    #[test]
    fn walks_backward_without_leaving_root() {
        let document = markup::parse_document("<p>a<b>b<i>c</i></b>d</p>").unwrap();
        let paragraph = document.first_child(document.root()).unwrap();
        let last = document.last_child(paragraph).unwrap();
        assert_eq!(
            texts_backward(&document, last, paragraph),
            vec!["c", "i", "b", "b", "a"]
        );
    }

    #[test]
    fn childless_root_yields_nothing() {
        let document = markup::parse_document("<p></p>").unwrap();
        let paragraph = document.first_child(document.root()).unwrap();
        assert!(texts_forward(&document, paragraph, paragraph).is_empty());
        assert!(texts_backward(&document, paragraph, paragraph).is_empty());
    }
}

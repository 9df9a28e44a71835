use indextree::NodeId;
use log::trace;

use crate::document::{Document, NodeData, TagCategory, TagTable, TreeWalker};
use crate::selection::{Position, Range};
use crate::viewport::scroll_into_view;

use super::Editor;
use super::inspect::{category_of, is_bogus};

/// First caret-addressable spot inside `root`: the start of its first text,
/// or in front of its first line break or content element.
pub(crate) fn caret_target(document: &Document, tags: &TagTable, root: NodeId) -> Position {
    if !document.has_children(root) {
        return childless_target(document, tags, root);
    }

    let mut walker = TreeWalker::new(document, root, root);
    let mut last = root;
    let mut current = walker.current();
    while let Some(node) = current {
        match document.data(node) {
            NodeData::Text(_) => return Position::new(node, 0),
            NodeData::Element(_) if !is_bogus(document, node) => {
                if matches!(
                    category_of(document, tags, node),
                    Some(TagCategory::Break | TagCategory::Content)
                ) {
                    if let Some(before) = Position::before(document, node) {
                        return before;
                    }
                }
            }
            _ => {}
        }
        last = node;
        current = walker.next_node();
    }
    Position::new(last, 0)
}

fn childless_target(document: &Document, tags: &TagTable, node: NodeId) -> Position {
    if category_of(document, tags, node) != Some(TagCategory::Break) {
        return Position::new(node, 0);
    }
    Position::after(document, node).unwrap_or_else(|| Position::new(node, 0))
}

impl Editor {
    /// Collapses the selection onto the first caret spot inside `root` and
    /// scrolls it into view when the viewport can be measured.
    pub(crate) fn move_to_caret_position(&mut self, root: NodeId) {
        let target = caret_target(&self.document, &self.settings.tags, root);
        self.selection = Range::caret(target);

        let anchor = if self.document.is_text(target.node) {
            target.node
        } else {
            self.document
                .child_at(target.node, target.offset)
                .unwrap_or(target.node)
        };
        if scroll_into_view(self.viewport.as_mut(), &self.document, anchor) {
            trace!("scrolled caret into view");
        }
    }
}

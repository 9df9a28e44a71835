use std::cmp::Ordering;

use indextree::NodeId;

use crate::document::Document;

/// A point in the tree: a character offset inside a text node or a child
/// index inside an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Position directly in front of `node` inside its parent.
    pub fn before(document: &Document, node: NodeId) -> Option<Self> {
        let parent = document.parent(node)?;
        Some(Self::new(parent, document.index_of(node)))
    }

    /// Position directly behind `node` inside its parent.
    pub fn after(document: &Document, node: NodeId) -> Option<Self> {
        let parent = document.parent(node)?;
        Some(Self::new(parent, document.index_of(node) + 1))
    }

    pub fn is_valid(&self, document: &Document) -> bool {
        document.is_attached(self.node) && self.offset <= document.len(self.node)
    }

    /// Child indices from the root down to the node, then the offset.
    fn tree_path(&self, document: &Document) -> Vec<usize> {
        let mut path: Vec<usize> = document
            .ancestors(self.node)
            .take_while(|node| *node != document.root())
            .map(|node| document.index_of(node))
            .collect();
        path.reverse();
        path.push(self.offset);
        path
    }

    /// Document order of two positions in the same tree.
    pub fn compare(&self, other: &Position, document: &Document) -> Ordering {
        if self.node == other.node {
            return self.offset.cmp(&other.offset);
        }
        self.tree_path(document).cmp(&other.tree_path(document))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn caret(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    /// The same range with `start` in front of `end`.
    pub fn ordered(self, document: &Document) -> Self {
        match self.start.compare(&self.end, document) {
            Ordering::Greater => Self::new(self.end, self.start),
            _ => self,
        }
    }
}

use indextree::NodeId;
use log::trace;
use unicode_width::UnicodeWidthChar;

use crate::document::{Document, NodeData, TagCategory, TagTable};

/// Visible vertical window, in the viewport's own units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewRect {
    pub y: i32,
    pub height: i32,
}

/// Measurement and scrolling surface used after the caret moved. Every
/// measurement may fail; callers treat `None` as "leave the view alone".
pub trait Viewport {
    fn bounds(&self) -> Option<ViewRect>;

    fn node_top(&self, document: &Document, node: NodeId) -> Option<i32>;

    /// Height of one line of text.
    fn line_height(&self) -> i32 {
        1
    }

    fn scroll_to(&mut self, y: i32);
}

/// Scrolls so that roughly one line of `node` is visible. Returns whether
/// the view moved.
pub fn scroll_into_view(viewport: &mut dyn Viewport, document: &Document, node: NodeId) -> bool {
    let (Some(view), Some(y)) = (viewport.bounds(), viewport.node_top(document, node)) else {
        trace!("viewport could not be measured, skipping scroll");
        return false;
    };
    let line = viewport.line_height();
    if y < view.y || y + line > view.y + view.height {
        let target = if y < view.y {
            y
        } else {
            y - view.height + line
        };
        viewport.scroll_to(target);
        return true;
    }
    false
}

/// Viewport that cannot measure anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullViewport;

impl Viewport for NullViewport {
    fn bounds(&self) -> Option<ViewRect> {
        None
    }

    fn node_top(&self, _document: &Document, _node: NodeId) -> Option<i32> {
        None
    }

    fn scroll_to(&mut self, _y: i32) {}
}

/// Fixed-width terminal layout: every block starts on a new line, text
/// wraps at `width` display columns and each `<br>` ends a line.
#[derive(Clone, Debug)]
pub struct LineViewport {
    width: usize,
    height: i32,
    scroll: i32,
    tags: TagTable,
}

impl LineViewport {
    pub fn new(width: usize, height: i32) -> Self {
        Self {
            width,
            height,
            scroll: 0,
            tags: TagTable::html(),
        }
    }

    pub fn with_tags(mut self, tags: TagTable) -> Self {
        self.tags = tags;
        self
    }

    pub fn scroll(&self) -> i32 {
        self.scroll
    }

    pub fn resize(&mut self, width: usize, height: i32) {
        self.width = width;
        self.height = height;
    }
}

impl Viewport for LineViewport {
    fn bounds(&self) -> Option<ViewRect> {
        if self.width == 0 || self.height <= 0 {
            return None;
        }
        Some(ViewRect {
            y: self.scroll,
            height: self.height,
        })
    }

    fn node_top(&self, document: &Document, node: NodeId) -> Option<i32> {
        if self.width == 0 || !document.is_attached(node) {
            return None;
        }
        let mut layout = LineLayout {
            document,
            tags: &self.tags,
            width: self.width,
            target: node,
            line: 0,
            column: 0,
            found: None,
        };
        layout.visit(document.root());
        layout.found
    }

    fn scroll_to(&mut self, y: i32) {
        self.scroll = y.max(0);
    }
}

struct LineLayout<'a> {
    document: &'a Document,
    tags: &'a TagTable,
    width: usize,
    target: NodeId,
    line: i32,
    column: usize,
    found: Option<i32>,
}

impl LineLayout<'_> {
    fn visit(&mut self, node: NodeId) {
        if self.found.is_some() {
            return;
        }
        match self.document.data(node) {
            NodeData::Document => self.visit_children(node),
            NodeData::Text(text) => {
                self.mark(node);
                for ch in text.chars() {
                    self.advance(ch.width().unwrap_or(0));
                }
            }
            NodeData::Element(element) => match self.tags.category(element.tag()) {
                TagCategory::Break => {
                    self.mark(node);
                    self.new_line();
                }
                TagCategory::Content => {
                    self.mark(node);
                    self.advance(1);
                }
                category if category.is_block() => {
                    if self.column > 0 {
                        self.new_line();
                    }
                    self.mark(node);
                    let start = self.line;
                    self.visit_children(node);
                    if self.column > 0 || self.line == start {
                        self.new_line();
                    }
                }
                _ => {
                    self.mark(node);
                    self.visit_children(node);
                }
            },
        }
    }

    fn visit_children(&mut self, node: NodeId) {
        let mut child = self.document.first_child(node);
        while let Some(current) = child {
            self.visit(current);
            if self.found.is_some() {
                return;
            }
            child = self.document.next_sibling(current);
        }
    }

    fn mark(&mut self, node: NodeId) {
        if node == self.target {
            self.found = Some(self.line);
        }
    }

    fn advance(&mut self, columns: usize) {
        if self.column > 0 && self.column + columns > self.width {
            self.new_line();
        }
        self.column += columns;
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;

    fn nth_block(document: &Document, index: usize) -> NodeId {
        document.child_at(document.root(), index).unwrap()
    }

    #[test]
    fn blocks_start_on_their_own_lines() {
        let document = markup::parse_document("<p>one</p><p>two<br>three</p><p></p><p>x</p>").unwrap();
        let viewport = LineViewport::new(40, 10);
        assert_eq!(viewport.node_top(&document, nth_block(&document, 0)), Some(0));
        assert_eq!(viewport.node_top(&document, nth_block(&document, 1)), Some(1));
        assert_eq!(viewport.node_top(&document, nth_block(&document, 2)), Some(3));
        assert_eq!(viewport.node_top(&document, nth_block(&document, 3)), Some(4));
    }

    #[test]
    fn wide_characters_wrap_by_display_width() {
        let document = markup::parse_document("<p>日本語日本語</p><p>x</p>").unwrap();
        let viewport = LineViewport::new(4, 10);
        assert_eq!(viewport.node_top(&document, nth_block(&document, 1)), Some(3));
    }

    #[test]
    fn scrolls_down_to_show_node_on_last_line() {
        let source: String = (0..20).map(|idx| format!("<p>{idx}</p>")).collect();
        let document = markup::parse_document(&source).unwrap();
        let mut viewport = LineViewport::new(40, 5);
        assert!(scroll_into_view(&mut viewport, &document, nth_block(&document, 12)));
        assert_eq!(viewport.scroll(), 8);
        assert!(!scroll_into_view(&mut viewport, &document, nth_block(&document, 10)));
        assert!(scroll_into_view(&mut viewport, &document, nth_block(&document, 2)));
        assert_eq!(viewport.scroll(), 2);
    }

    #[test]
    fn unmeasurable_viewport_is_left_alone() {
        let document = markup::parse_document("<p>x</p>").unwrap();
        let mut viewport = NullViewport;
        assert!(!scroll_into_view(&mut viewport, &document, nth_block(&document, 0)));
        let mut zero = LineViewport::new(0, 5);
        assert!(!scroll_into_view(&mut zero, &document, nth_block(&document, 0)));
    }
}

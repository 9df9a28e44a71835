use indextree::NodeId;
use log::{trace, warn};

use crate::document::{Attributes, Document, Element, ID_ATTR, NodeData, TagCategory, TagTable};
use crate::selection::{Position, Range};
use crate::settings::Settings;

use super::content::{insert_node_at, split_text_node};
use super::inspect::{
    can_split_block, category_of, edge_element_child, has_break_after, is_block, is_empty,
    nearest_block,
};

/// Where an empty list item sits inside its list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListItemPosition {
    Sole,
    First,
    Last,
    Middle,
}

pub(crate) enum Wrap {
    Unchanged,
    Wrapped(NodeId),
    /// The host had no children at all; a fresh block was appended to it.
    CreatedEmpty(NodeId),
}

/// Inline formatting found above the caret, outermost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct InlineFormat {
    tag: String,
    attrs: Attributes,
}

impl InlineFormat {
    fn to_element(&self) -> Element {
        Element::with_attrs(&self.tag, self.attrs.iter().cloned())
    }
}

/// Descends from an element into the child the offset points at, so the
/// caret container is never an element that has addressable children.
/// Line breaks and content elements cannot hold the caret; it stays in
/// front of them instead.
pub(crate) fn resolve_caret(document: &Document, tags: &TagTable, caret: Position) -> Position {
    if document.is_text(caret.node) || !document.has_children(caret.node) {
        return caret;
    }
    let index = caret.offset.min(document.child_count(caret.node) - 1);
    let Some(child) = document.child_at(caret.node, index) else {
        return caret;
    };
    let is_void = !document.has_children(child)
        && matches!(
            category_of(document, tags, child),
            Some(TagCategory::Break | TagCategory::Content)
        );
    if is_void {
        Position::new(caret.node, index)
    } else {
        Position::new(child, 0)
    }
}

/// Makes sure loose inline content around the caret sits inside a block
/// that can be split, e.g. `<td>text|<b>x</b></td>` becomes
/// `<td><p>text|<b>x</b></p></td>`.
pub(crate) fn wrap_loose_content(
    document: &mut Document,
    tags: &TagTable,
    caret: &mut Position,
    block_tag: Option<&str>,
    shift: bool,
) -> Wrap {
    let Some(block_tag) = block_tag else {
        return Wrap::Unchanged;
    };
    if shift {
        return Wrap::Unchanged;
    }
    let parent_block = nearest_block(document, tags, caret.node);
    if parent_block.is_some_and(|block| can_split_block(document, tags, block)) {
        return Wrap::Unchanged;
    }
    let host = parent_block.unwrap_or_else(|| document.root());

    if !document.has_children(host) {
        let block = document.create_element(block_tag);
        document.append(host, block);
        trace!("created <{block_tag}> inside empty container");
        return Wrap::CreatedEmpty(block);
    }

    let anchor = if caret.node == host {
        let last = document.child_count(host) - 1;
        document.child_at(host, caret.offset.min(last))
    } else {
        document
            .ancestors(caret.node)
            .find(|node| document.parent(*node) == Some(host))
    };
    let Some(anchor) = anchor else {
        return Wrap::Unchanged;
    };

    let mut start = None;
    let mut cursor = Some(anchor);
    while let Some(node) = cursor {
        if is_block(document, tags, node) {
            break;
        }
        start = Some(node);
        cursor = document.prev_sibling(node);
    }
    let Some(start) = start else {
        return Wrap::Unchanged;
    };

    let start_index = document.index_of(start);
    let block = document.create_element(block_tag);
    document.insert_before(start, block);
    let mut cursor = Some(start);
    while let Some(node) = cursor {
        if is_block(document, tags, node) {
            break;
        }
        cursor = document.next_sibling(node);
        document.append(block, node);
    }
    if caret.node == host {
        *caret = Position::new(block, caret.offset.saturating_sub(start_index));
    }
    trace!("wrapped loose inline content in <{block_tag}>");
    Wrap::Wrapped(block)
}

/// Formatting elements around `container` up to the root, outermost first,
/// with document-unique identifiers dropped.
pub(crate) fn inline_formats(document: &Document, tags: &TagTable, container: NodeId) -> Vec<InlineFormat> {
    let mut formats: Vec<InlineFormat> = document
        .ancestors(container)
        .filter(|node| category_of(document, tags, *node) == Some(TagCategory::Formatting))
        .filter_map(|node| document.element(node))
        .map(|element| InlineFormat {
            tag: element.tag().to_string(),
            attrs: element
                .attrs()
                .iter()
                .filter(|(name, _)| name != ID_ATTR)
                .cloned()
                .collect(),
        })
        .collect();
    formats.reverse();
    formats
}

/// Builds a detached block for the caret to move into: a fresh `tag`
/// element, or a shallow copy of `parent_block` when no tag is given. The
/// inline formatting around the caret is recreated inside it.
pub(crate) fn create_new_block(
    document: &mut Document,
    settings: &Settings,
    container: NodeId,
    parent_block: Option<NodeId>,
    tag: Option<&str>,
) -> NodeId {
    let block = match (tag, parent_block) {
        (Some(tag), _) => document.create_element(tag),
        (None, Some(parent)) => document.shallow_clone(parent),
        (None, None) => document.create_element(crate::settings::DEFAULT_BLOCK_TAG),
    };
    let mut caret_node = block;
    for format in inline_formats(document, &settings.tags, container) {
        let node = document.create(NodeData::Element(format.to_element()));
        document.append(caret_node, node);
        caret_node = node;
    }
    if settings.pad_empty_blocks {
        let br = document.create_element("br");
        document.append(caret_node, br);
    }
    block
}

/// Moves everything from `position` to the end of `ancestor` into a shallow
/// copy of `ancestor` inserted right after it. Elements that are only
/// partially covered are copied along the way, so inline formatting
/// continues on both sides. Returns the copy.
pub(crate) fn split_subtree(document: &mut Document, ancestor: NodeId, position: Position) -> Option<NodeId> {
    if !document.is_inclusive_descendant(position.node, ancestor) {
        warn!("split position is outside of the block being split");
        return None;
    }

    let (mut parent, mut first_right) = match document.text(position.node) {
        Some(text) => {
            let len = text.chars().count();
            let parent = document.parent(position.node)?;
            if position.offset == 0 {
                (parent, Some(position.node))
            } else if position.offset >= len {
                (parent, document.next_sibling(position.node))
            } else {
                (parent, split_text_node(document, position.node, position.offset))
            }
        }
        None => (position.node, document.child_at(position.node, position.offset)),
    };

    loop {
        let copy = document.shallow_clone(parent);
        let mut next = first_right;
        while let Some(node) = next {
            next = document.next_sibling(node);
            document.append(copy, node);
        }
        if parent == ancestor {
            document.insert_after(ancestor, copy);
            return Some(copy);
        }
        let grandparent = document.parent(parent)?;
        document.insert_after(parent, copy);
        first_right = Some(copy);
        parent = grandparent;
    }
}

/// Splits `container` around its descendant `child`: the content before
/// and after it end up in two copies of `container` with `child` lifted out
/// between them. Empty halves are dropped. Returns `child`.
pub(crate) fn split_container(
    document: &mut Document,
    tags: &TagTable,
    container: NodeId,
    child: NodeId,
) -> Option<NodeId> {
    let direct = document
        .ancestors(child)
        .find(|node| document.parent(*node) == Some(container))?;
    document.parent(container)?;

    let left = document.shallow_clone(container);
    let right = document.shallow_clone(container);
    document.remove_attr(right, ID_ATTR);

    let children: Vec<NodeId> = document.children(container).collect();
    let split_at = children.iter().position(|node| *node == direct)?;
    for node in &children[..split_at] {
        document.append(left, *node);
    }
    for node in &children[split_at + 1..] {
        document.append(right, *node);
    }
    if direct != child {
        // Anything wrapped around the child stays in the left half.
        document.append(left, direct);
    }

    document.insert_before(container, left);
    document.insert_before(container, child);
    document.insert_before(container, right);
    document.remove(container);

    if is_empty(document, tags, left) {
        document.remove(left);
    }
    if is_empty(document, tags, right) {
        document.remove(right);
    }
    Some(child)
}

pub(crate) fn list_item_position(document: &Document, list: NodeId, item: NodeId) -> ListItemPosition {
    let first = edge_element_child(document, list, true) == Some(item);
    let last = edge_element_child(document, list, false) == Some(item);
    match (first, last) {
        (true, true) => ListItemPosition::Sole,
        (true, false) => ListItemPosition::First,
        (false, true) => ListItemPosition::Last,
        (false, false) => ListItemPosition::Middle,
    }
}

/// Replaces an empty list item with `new_block` next to, in place of, or in
/// the middle of its list.
pub(crate) fn split_empty_list_item(
    document: &mut Document,
    list: NodeId,
    item: NodeId,
    new_block: NodeId,
) -> ListItemPosition {
    let position = list_item_position(document, list, item);
    if position == ListItemPosition::Middle {
        let after_item = Position::new(list, document.index_of(item) + 1);
        if let Some(tail) = split_subtree(document, list, after_item) {
            document.remove_attr(tail, ID_ATTR);
        }
    }
    document.remove(item);
    match position {
        ListItemPosition::Sole => document.replace(list, new_block),
        ListItemPosition::First => document.insert_before(list, new_block),
        ListItemPosition::Last | ListItemPosition::Middle => document.insert_after(list, new_block),
    }
    position
}

/// Inserts a `<br>` at the caret and returns where the caret goes next.
pub(crate) fn insert_line_break(
    document: &mut Document,
    settings: &Settings,
    caret: Position,
    parent_block: Option<NodeId>,
) -> Option<Position> {
    let tags = &settings.tags;
    let scope = parent_block.unwrap_or_else(|| document.root());
    let mut at = caret;
    let mut extra_break = false;

    let at_text_end = document
        .text(caret.node)
        .is_some_and(|text| caret.offset >= text.chars().count());
    if settings.extra_trailing_break
        && at_text_end
        && !has_break_after(document, tags, caret.node, scope)
    {
        let trailing = document.create_element("br");
        insert_node_at(document, at, trailing);
        at = Position::after(document, trailing)?;
        extra_break = true;
    }

    let br = document.create_element("br");
    insert_node_at(document, at, br);

    let in_pre = parent_block
        .and_then(|block| category_of(document, tags, block))
        == Some(TagCategory::Preformatted);
    if settings.pre_line_separator && in_pre {
        let separator = document.create_text("\r");
        document.insert_before(br, separator);
    }

    if extra_break {
        Position::before(document, br)
    } else {
        Position::after(document, br)
    }
}

/// Removes the selected content, joining the block the selection ends in
/// onto the block it starts in. Returns the collapsed caret.
pub(crate) fn delete_contents(document: &mut Document, tags: &TagTable, range: Range) -> Option<Position> {
    if range.collapsed() {
        return Some(range.start);
    }
    let range = range.ordered(document);

    if range.start.node == range.end.node && document.is_text(range.start.node) {
        let text = document.text(range.start.node)?;
        let from = range.start.offset.min(range.end.offset);
        let to = range.start.offset.max(range.end.offset);
        let kept: String = text
            .chars()
            .take(from)
            .chain(text.chars().skip(to))
            .collect();
        document.set_text(range.start.node, kept);
        return Some(Position::new(range.start.node, from));
    }

    let start_block = nearest_block(document, tags, range.start.node);
    let end_block = nearest_block(document, tags, range.end.node);

    let mut end = boundary_point(document, range.end)?;
    let start_parent = document.parent(range.start.node);
    let splits_start = document
        .text(range.start.node)
        .is_some_and(|text| range.start.offset > 0 && range.start.offset < text.chars().count());
    let start = boundary_point(document, range.start)?;
    if splits_start && start_parent == Some(end.node) {
        // The right half of the start text now sits before the end point.
        end.offset += 1;
    }

    let mut doomed = Vec::new();
    let mut at = start;
    while at != end {
        match document.child_at(at.node, at.offset) {
            Some(child) if document.is_inclusive_descendant(end.node, child) => {
                at = Position::new(child, 0);
            }
            Some(child) => {
                doomed.push(child);
                at = Position::new(at.node, at.offset + 1);
            }
            None => match Position::after(document, at.node) {
                Some(next) => at = next,
                None => {
                    warn!("selection end is not after its start, deleting up to the document end");
                    break;
                }
            },
        }
    }
    for node in doomed {
        document.remove(node);
    }

    if let (Some(start_block), Some(end_block)) = (start_block, end_block) {
        let nested = document.is_inclusive_descendant(start_block, end_block)
            || document.is_inclusive_descendant(end_block, start_block);
        if !nested && document.is_attached(end_block) {
            let moved: Vec<NodeId> = document.children(end_block).collect();
            for node in moved {
                document.append(start_block, node);
            }
            document.remove(end_block);
        }
    }

    let caret = if document.is_attached(start.node) && start.offset <= document.len(start.node) {
        start
    } else {
        Position::new(start_block.unwrap_or_else(|| document.root()), 0)
    };
    Some(caret)
}

/// Turns a position inside text into the equivalent position between
/// nodes, splitting the text when needed.
fn boundary_point(document: &mut Document, position: Position) -> Option<Position> {
    let Some(text) = document.text(position.node) else {
        return Some(position);
    };
    let len = text.chars().count();
    if position.offset == 0 {
        Position::before(document, position.node)
    } else if position.offset >= len {
        Position::after(document, position.node)
    } else {
        split_text_node(document, position.node, position.offset)?;
        Position::after(document, position.node)
    }
}

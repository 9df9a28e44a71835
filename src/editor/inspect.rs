use indextree::NodeId;

use crate::document::{BOGUS_ATTR, Document, NodeData, TagCategory, TagTable, TreeWalker};
use crate::selection::Position;

use super::content::is_collapsible_whitespace;

pub(crate) fn category_of(document: &Document, tags: &TagTable, node: NodeId) -> Option<TagCategory> {
    document.tag(node).map(|tag| tags.category(tag))
}

pub(crate) fn is_block(document: &Document, tags: &TagTable, node: NodeId) -> bool {
    category_of(document, tags, node).is_some_and(TagCategory::is_block)
}

/// Blocks that may be split in two. Table cells, captions and heading
/// groups are blocks but never split, and neither are blocks positioned
/// out of the normal flow.
pub(crate) fn can_split_block(document: &Document, tags: &TagTable, node: NodeId) -> bool {
    match category_of(document, tags, node) {
        Some(TagCategory::TableCell | TagCategory::HeadingGroup) => false,
        Some(category) if category.is_block() => !is_out_of_flow(document, node),
        _ => false,
    }
}

fn is_out_of_flow(document: &Document, node: NodeId) -> bool {
    let Some(style) = document.attr(node, "style") else {
        return false;
    };
    style.split(';').any(|declaration| {
        let Some((name, value)) = declaration.split_once(':') else {
            return false;
        };
        if !name.trim().eq_ignore_ascii_case("position") {
            return false;
        }
        let value = value.trim().to_ascii_lowercase();
        value.starts_with("fixed") || value.starts_with("absolute")
    })
}

/// Closest block at or above `node`. The document root is never a block.
pub(crate) fn nearest_block(document: &Document, tags: &TagTable, node: NodeId) -> Option<NodeId> {
    document
        .ancestors(node)
        .find(|candidate| is_block(document, tags, *candidate))
}

pub(crate) fn is_bogus(document: &Document, node: NodeId) -> bool {
    document.attr(node, BOGUS_ATTR).is_some()
}

fn is_real_content(document: &Document, tags: &TagTable, node: NodeId) -> bool {
    !is_bogus(document, node) && category_of(document, tags, node) == Some(TagCategory::Content)
}

/// A node is empty when it holds no visible text, no content element and at
/// most a single line break. Bogus subtrees are skipped entirely.
pub(crate) fn is_empty(document: &Document, tags: &TagTable, node: NodeId) -> bool {
    let mut breaks = 0;
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        match document.data(current) {
            NodeData::Text(text) => {
                if !is_collapsible_whitespace(text) {
                    return false;
                }
                continue;
            }
            NodeData::Element(element) => {
                if current != node && is_bogus(document, current) {
                    continue;
                }
                match tags.category(element.tag()) {
                    TagCategory::Content => return false,
                    TagCategory::Break => {
                        breaks += 1;
                        if breaks > 1 {
                            return false;
                        }
                    }
                    _ => {}
                }
            }
            NodeData::Document => {}
        }
        stack.extend(document.children(current));
    }
    true
}

/// Whether nothing but whitespace and bogus nodes separates `caret` from the
/// start (`at_start`) or the end of `block`.
pub(crate) fn is_caret_at_block_boundary(
    document: &Document,
    tags: &TagTable,
    caret: Position,
    block: NodeId,
    at_start: bool,
) -> bool {
    let container = caret.node;
    if let Some(text) = document.text(container) {
        let skipped = if at_start {
            text.chars().take(caret.offset).collect::<String>()
        } else {
            text.chars().skip(caret.offset).collect::<String>()
        };
        if !is_collapsible_whitespace(&skipped) {
            return false;
        }
    } else if document.has_children(container) {
        let children: Vec<NodeId> = document.children(container).collect();
        let split = caret.offset.min(children.len());
        let skipped = if at_start {
            &children[..split]
        } else {
            &children[split..]
        };
        if skipped
            .iter()
            .any(|child| has_real_content(document, tags, *child))
        {
            return false;
        }
    } else if !at_start && container != block && is_real_content(document, tags, container) {
        return false;
    }

    for node in document
        .ancestors(container)
        .take_while(|ancestor| *ancestor != block)
    {
        let mut sibling = if at_start {
            document.prev_sibling(node)
        } else {
            document.next_sibling(node)
        };
        while let Some(current) = sibling {
            if has_real_content(document, tags, current) {
                return false;
            }
            sibling = if at_start {
                document.prev_sibling(current)
            } else {
                document.next_sibling(current)
            };
        }
    }
    true
}

/// Visible text or a content element anywhere in the subtree, bogus
/// subtrees excluded.
fn has_real_content(document: &Document, tags: &TagTable, node: NodeId) -> bool {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        match document.data(current) {
            NodeData::Text(text) => {
                if !is_collapsible_whitespace(text) {
                    return true;
                }
            }
            NodeData::Element(_) => {
                if is_bogus(document, current) {
                    continue;
                }
                if is_real_content(document, tags, current) {
                    return true;
                }
                stack.extend(document.children(current));
            }
            NodeData::Document => stack.extend(document.children(current)),
        }
    }
    false
}

/// Looks for a `<br>` at or after `container` inside `root`.
pub(crate) fn has_break_after(
    document: &Document,
    tags: &TagTable,
    container: NodeId,
    root: NodeId,
) -> bool {
    let mut walker = TreeWalker::new(document, container, root);
    let mut current = walker.current();
    while let Some(node) = current {
        if category_of(document, tags, node) == Some(TagCategory::Break) {
            return true;
        }
        current = walker.next_node();
    }
    false
}

/// First or last element child of `parent`, skipping text between items.
pub(crate) fn edge_element_child(document: &Document, parent: NodeId, first: bool) -> Option<NodeId> {
    let mut node = if first {
        document.first_child(parent)
    } else {
        document.last_child(parent)
    };
    while let Some(current) = node {
        if document.is_element(current) {
            return Some(current);
        }
        node = if first {
            document.next_sibling(current)
        } else {
            document.prev_sibling(current)
        };
    }
    None
}

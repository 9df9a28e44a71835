use indextree::NodeId;

use crate::document::Document;
use crate::selection::Position;

/// Whitespace that never renders on its own: spaces, tabs and line feeds.
/// Non-breaking spaces are content.
pub(crate) fn is_collapsible_whitespace(text: &str) -> bool {
    text.chars().all(|ch| matches!(ch, ' ' | '\t' | '\r' | '\n'))
}

pub(crate) fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// Splits a text node at a character offset. The left part stays in place,
/// the right part becomes a new text node right after it and is returned.
pub(crate) fn split_text_node(document: &mut Document, node: NodeId, offset: usize) -> Option<NodeId> {
    let text = document.text(node)?;
    let byte_idx = char_to_byte_idx(text, offset);
    let (left, right) = text.split_at(byte_idx);
    let (left, right) = (left.to_string(), right.to_string());
    document.set_text(node, left);
    let right_node = document.create_text(right);
    document.insert_after(node, right_node);
    Some(right_node)
}

/// Inserts `node` at `position`, splitting a text node when the position
/// falls strictly inside it.
pub(crate) fn insert_node_at(document: &mut Document, position: Position, node: NodeId) {
    let Some(text) = document.text(position.node) else {
        document.insert_at(position.node, position.offset, node);
        return;
    };
    let len = text.chars().count();
    if position.offset == 0 {
        document.insert_before(position.node, node);
    } else if position.offset >= len {
        document.insert_after(position.node, node);
    } else if let Some(right) = split_text_node(document, position.node, position.offset) {
        document.insert_before(right, node);
    }
}

/// Inserts `text` at `position` and returns the caret position behind it.
pub(crate) fn insert_text_at(document: &mut Document, position: Position, text: &str) -> Position {
    let inserted = text.chars().count();
    if let Some(current) = document.text(position.node) {
        let mut updated = current.to_string();
        let byte_idx = char_to_byte_idx(&updated, position.offset);
        updated.insert_str(byte_idx, text);
        document.set_text(position.node, updated);
        return Position::new(position.node, position.offset + inserted);
    }

    let before = position
        .offset
        .checked_sub(1)
        .and_then(|idx| document.child_at(position.node, idx));
    if let Some(previous) = before.filter(|node| document.is_text(*node)) {
        let len = document.len(previous);
        return insert_text_at(document, Position::new(previous, len), text);
    }
    if let Some(next) = document
        .child_at(position.node, position.offset)
        .filter(|node| document.is_text(*node))
    {
        return insert_text_at(document, Position::new(next, 0), text);
    }

    let node = document.create_text(text);
    document.insert_at(position.node, position.offset, node);
    Position::new(node, inserted)
}

/// Strips leading line feeds from the first text reachable by descending
/// through first children, so a split inside preformatted text does not
/// start the new block with an empty line.
pub(crate) fn trim_leading_line_breaks(document: &mut Document, node: NodeId) {
    let mut current = Some(node);
    while let Some(node) = current {
        if let Some(text) = document.text(node) {
            let trimmed = text.trim_start_matches(['\r', '\n']);
            if trimmed.len() != text.len() {
                let trimmed = trimmed.to_string();
                document.set_text(node, trimmed);
            }
        }
        current = document.first_child(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;

    fn first_paragraph(source: &str) -> (Document, NodeId) {
        let document = markup::parse_document(source).unwrap();
        let paragraph = document.first_child(document.root()).unwrap();
        (document, paragraph)
    }

    #[test]
    fn char_to_byte_idx_handles_multibyte_text() {
        assert_eq!(char_to_byte_idx("äbc", 1), 2);
        assert_eq!(char_to_byte_idx("abc", 10), 3);
    }

    #[test]
    fn split_text_node_keeps_left_part_in_place() {
        let (mut document, paragraph) = first_paragraph("<p>größer</p>");
        let text = document.first_child(paragraph).unwrap();
        let right = split_text_node(&mut document, text, 3).unwrap();
        assert_eq!(document.text(text), Some("grö"));
        assert_eq!(document.text(right), Some("ßer"));
        assert_eq!(document.next_sibling(text), Some(right));
    }

    #[test]
    fn insert_node_splits_text_in_the_middle() {
        let (mut document, paragraph) = first_paragraph("<p>abcd</p>");
        let text = document.first_child(paragraph).unwrap();
        let br = document.create_element("br");
        insert_node_at(&mut document, Position::new(text, 2), br);
        assert_eq!(markup::serialize(&document, None), "<p>ab<br>cd</p>");
    }

    #[test]
    fn insert_text_reuses_adjacent_text_nodes() {
        let (mut document, paragraph) = first_paragraph("<p>ab<br></p>");
        let caret = insert_text_at(&mut document, Position::new(paragraph, 1), "c");
        assert_eq!(markup::serialize(&document, None), "<p>abc<br></p>");
        assert_eq!(caret.offset, 3);

        let caret = insert_text_at(&mut document, Position::new(paragraph, 2), "d");
        assert_eq!(markup::serialize(&document, None), "<p>abc<br>d</p>");
        assert_eq!(document.text(caret.node), Some("d"));
    }

    #[test]
    fn trims_line_feeds_only_at_the_start() {
        let (mut document, paragraph) = first_paragraph("<pre>\n\r\nfoo\nbar</pre>");
        trim_leading_line_breaks(&mut document, paragraph);
        assert_eq!(markup::serialize(&document, None), "<pre>foo\nbar</pre>");
    }
}

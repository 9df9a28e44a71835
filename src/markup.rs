//! Minimal HTML-subset reader and writer.
//!
//! A `|` in text position marks a collapsed caret, `[` and `]` mark the
//! start and end of a selection. Literal marker characters are written as
//! numeric character references.

use indextree::NodeId;
use thiserror::Error;

use crate::document::{Document, Element, NodeData};
use crate::selection::{Position, Range};

const VOID_TAGS: &[&str] = &["br", "img", "hr", "input", "embed", "col", "wbr"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEnd(usize),
    #[error("malformed tag at byte {0}")]
    MalformedTag(usize),
    #[error("closing tag </{found}> at byte {at} does not match <{expected}>")]
    MismatchedClose {
        expected: String,
        found: String,
        at: usize,
    },
    #[error("closing tag </{tag}> at byte {at} has no open element")]
    UnexpectedClose { tag: String, at: usize },
    #[error("duplicate selection marker '{marker}' at byte {at}")]
    DuplicateMarker { marker: char, at: usize },
    #[error("selection marker '{marker}' at byte {at} is not balanced")]
    UnbalancedMarker { marker: char, at: usize },
}

#[derive(Debug)]
pub struct Parsed {
    pub document: Document,
    pub selection: Option<Range>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Marker {
    Caret,
    Start,
    End,
}

impl Marker {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '|' => Some(Marker::Caret),
            '[' => Some(Marker::Start),
            ']' => Some(Marker::End),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Marker::Caret => '|',
            Marker::Start => '[',
            Marker::End => ']',
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    document: Document,
    stack: Vec<NodeId>,
    text: String,
    pending: Vec<(Marker, usize, usize)>,
    caret: Option<Position>,
    start: Option<Position>,
    end: Option<Position>,
}

pub fn parse(input: &str) -> Result<Parsed, MarkupError> {
    let document = Document::new();
    let root = document.root();
    let mut parser = Parser {
        input,
        pos: 0,
        document,
        stack: vec![root],
        text: String::new(),
        pending: Vec::new(),
        caret: None,
        start: None,
        end: None,
    };
    parser.run()?;
    parser.finish()
}

/// Parses markup and ignores any selection markers it contains.
pub fn parse_document(input: &str) -> Result<Document, MarkupError> {
    parse(input).map(|parsed| parsed.document)
}

impl Parser<'_> {
    fn run(&mut self) -> Result<(), MarkupError> {
        while let Some(ch) = self.peek() {
            match ch {
                '<' => {
                    self.flush_text()?;
                    self.parse_tag()?;
                }
                '&' => {
                    let decoded = self.parse_entity();
                    self.text.push(decoded);
                }
                _ => {
                    self.pos += ch.len_utf8();
                    match Marker::from_char(ch) {
                        Some(marker) => {
                            let offset = self.text.chars().count();
                            self.pending.push((marker, offset, self.pos - 1));
                        }
                        None => self.text.push(ch),
                    }
                }
            }
        }
        self.flush_text()?;
        if self.stack.len() > 1 {
            return Err(MarkupError::UnexpectedEnd(self.input.len()));
        }
        Ok(())
    }

    fn finish(self) -> Result<Parsed, MarkupError> {
        let selection = match (self.caret, self.start, self.end) {
            (Some(caret), None, None) => Some(Range::caret(caret)),
            (None, Some(start), Some(end)) => Some(Range::new(start, end)),
            (None, None, None) => None,
            (None, Some(_), None) => {
                return Err(MarkupError::UnbalancedMarker {
                    marker: '[',
                    at: self.input.len(),
                });
            }
            (None, None, Some(_)) => {
                return Err(MarkupError::UnbalancedMarker {
                    marker: ']',
                    at: self.input.len(),
                });
            }
            (Some(_), _, _) => {
                return Err(MarkupError::DuplicateMarker {
                    marker: '|',
                    at: self.input.len(),
                });
            }
        };
        Ok(Parsed {
            document: self.document,
            selection,
        })
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn current_parent(&self) -> NodeId {
        self.stack
            .last()
            .copied()
            .unwrap_or_else(|| self.document.root())
    }

    fn flush_text(&mut self) -> Result<(), MarkupError> {
        let parent = self.current_parent();
        let pending = std::mem::take(&mut self.pending);
        if self.text.is_empty() {
            let offset = self.document.child_count(parent);
            for (marker, _, at) in pending {
                self.place_marker(marker, Position::new(parent, offset), at)?;
            }
            return Ok(());
        }
        let text = std::mem::take(&mut self.text);
        let node = self.document.create_text(text);
        self.document.append(parent, node);
        for (marker, offset, at) in pending {
            self.place_marker(marker, Position::new(node, offset), at)?;
        }
        Ok(())
    }

    fn place_marker(
        &mut self,
        marker: Marker,
        position: Position,
        at: usize,
    ) -> Result<(), MarkupError> {
        let slot = match marker {
            Marker::Caret => &mut self.caret,
            Marker::Start => &mut self.start,
            Marker::End => &mut self.end,
        };
        if slot.is_some() {
            return Err(MarkupError::DuplicateMarker {
                marker: marker.as_char(),
                at,
            });
        }
        *slot = Some(position);
        Ok(())
    }

    fn parse_tag(&mut self) -> Result<(), MarkupError> {
        let tag_start = self.pos;
        let close = self.input[tag_start..].find('>').map(|idx| tag_start + idx);
        let Some(close) = close else {
            return Err(MarkupError::UnexpectedEnd(self.input.len()));
        };
        let body = &self.input[tag_start + 1..close];
        self.pos = close + 1;

        if let Some(name) = body.strip_prefix('/') {
            return self.close_element(name.trim(), tag_start);
        }

        let self_closing = body.ends_with('/');
        let body = body.trim_end_matches('/');
        let (name, attrs) = split_tag_body(body).ok_or(MarkupError::MalformedTag(tag_start))?;
        let element = Element::with_attrs(name, attrs);
        let is_void = VOID_TAGS.contains(&element.tag());
        let node = self.document.create(NodeData::Element(element));
        let parent = self.current_parent();
        self.document.append(parent, node);
        if !self_closing && !is_void {
            self.stack.push(node);
        }
        Ok(())
    }

    fn close_element(&mut self, name: &str, at: usize) -> Result<(), MarkupError> {
        let name = name.to_ascii_lowercase();
        if VOID_TAGS.contains(&name.as_str()) {
            return Ok(());
        }
        if self.stack.len() <= 1 {
            return Err(MarkupError::UnexpectedClose { tag: name, at });
        }
        let open = self.current_parent();
        let expected = self.document.tag(open).unwrap_or_default().to_string();
        if expected != name {
            return Err(MarkupError::MismatchedClose {
                expected,
                found: name,
                at,
            });
        }
        self.stack.pop();
        Ok(())
    }

    fn parse_entity(&mut self) -> char {
        let rest = &self.input[self.pos..];
        if let Some(end) = rest.find(';').filter(|end| *end <= 10) {
            if let Some(ch) = decode_entity(&rest[1..end]) {
                self.pos += end + 1;
                return ch;
            }
        }
        self.pos += 1;
        '&'
    }
}

fn split_tag_body(body: &str) -> Option<(&str, Vec<(String, String)>)> {
    let body = body.trim();
    let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
    let name = &body[..name_end];
    if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-') {
        return None;
    }
    let mut attrs = Vec::new();
    let mut rest = body[name_end..].trim_start();
    while !rest.is_empty() {
        let key_end = rest
            .find(|ch: char| ch == '=' || ch.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        if key.is_empty() {
            return None;
        }
        rest = rest[key_end..].trim_start();
        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let quote = after_eq.chars().next()?;
            if quote != '"' && quote != '\'' {
                return None;
            }
            let inner = &after_eq[1..];
            let close = inner.find(quote)?;
            rest = inner[close + 1..].trim_start();
            decode_text(&inner[..close])
        } else {
            String::new()
        };
        attrs.push((key.to_ascii_lowercase(), value));
    }
    Some((name, attrs))
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn decode_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        match tail.find(';').filter(|end| *end <= 10) {
            Some(end) => match decode_entity(&tail[1..end]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Writes the whole document, marking `selection` when given.
pub fn serialize(document: &Document, selection: Option<&Range>) -> String {
    let markers = collect_markers(selection);
    let mut out = String::new();
    write_children(document, document.root(), &markers, &mut out);
    out
}

/// Writes a single node (including its own tag) without selection markers.
pub fn serialize_node(document: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(document, node, &[], &mut out);
    out
}

fn collect_markers(selection: Option<&Range>) -> Vec<(Position, Marker)> {
    match selection {
        None => Vec::new(),
        Some(range) if range.collapsed() => vec![(range.start, Marker::Caret)],
        Some(range) => vec![(range.start, Marker::Start), (range.end, Marker::End)],
    }
}

fn markers_at(markers: &[(Position, Marker)], node: NodeId, offset: usize, out: &mut String) {
    for (position, marker) in markers {
        if position.node == node && position.offset == offset {
            out.push(marker.as_char());
        }
    }
}

fn write_children(
    document: &Document,
    node: NodeId,
    markers: &[(Position, Marker)],
    out: &mut String,
) {
    let mut count = 0;
    for (idx, child) in document.children(node).enumerate() {
        markers_at(markers, node, idx, out);
        write_node(document, child, markers, out);
        count = idx + 1;
    }
    markers_at(markers, node, count, out);
    // Offsets past the end are clamped onto the last slot.
    for (position, marker) in markers {
        if position.node == node && position.offset > count {
            out.push(marker.as_char());
        }
    }
}

fn write_node(document: &Document, node: NodeId, markers: &[(Position, Marker)], out: &mut String) {
    match document.data(node) {
        NodeData::Document => write_children(document, node, markers, out),
        NodeData::Text(text) => {
            let len = text.chars().count();
            for (idx, ch) in text.chars().enumerate() {
                markers_at(markers, node, idx, out);
                push_escaped(ch, out);
            }
            for (position, marker) in markers {
                if position.node == node && position.offset >= len {
                    out.push(marker.as_char());
                }
            }
        }
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(element.tag());
            for (name, value) in element.attrs() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                for ch in value.chars() {
                    match ch {
                        '"' => out.push_str("&quot;"),
                        _ => push_escaped(ch, out),
                    }
                }
                out.push('"');
            }
            out.push('>');
            if VOID_TAGS.contains(&element.tag()) && !document.has_children(node) {
                return;
            }
            write_children(document, node, markers, out);
            out.push_str("</");
            out.push_str(element.tag());
            out.push('>');
        }
    }
}

fn push_escaped(ch: char, out: &mut String) {
    match ch {
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '&' => out.push_str("&amp;"),
        '\u{a0}' => out.push_str("&nbsp;"),
        '|' | '[' | ']' => {
            out.push_str("&#");
            out.push_str(&u32::from(ch).to_string());
            out.push(';');
        }
        _ => out.push(ch),
    }
}

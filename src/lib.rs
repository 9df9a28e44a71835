//! Paragraph-break handling for tree-shaped rich-text documents.
//!
//! The [`editor::Editor`] decides what pressing Enter does at the caret:
//! split the enclosing block, insert a line break, move an empty list item
//! out of its list, or leave the key to someone else.

pub mod document;
pub mod editor;
pub mod history;
pub mod keys;
pub mod markup;
pub mod selection;
pub mod settings;
pub mod viewport;

pub use document::{Document, TagCategory, TagTable};
pub use editor::{BreakAction, BreakOutcome, Command, DeferReason, Editor, ListItemPosition};
pub use keys::BreakKeyEvent;
pub use selection::{Position, Range};
pub use settings::Settings;

use indextree::NodeId;
use log::{debug, trace, warn};

use crate::document::{Document, ID_ATTR, TagCategory};
use crate::history::{Snapshot, UndoHistory};
use crate::keys::BreakKeyEvent;
use crate::selection::{Position, Range};
use crate::settings::{DEFAULT_BLOCK_TAG, Settings};
use crate::viewport::{NullViewport, Viewport};

mod content;
mod cursor;
mod inspect;
mod structure;

pub use structure::ListItemPosition;

use content::{insert_text_at, trim_leading_line_breaks};
use inspect::{can_split_block, category_of, is_caret_at_block_boundary, is_empty, nearest_block};
use structure::{
    Wrap, create_new_block, delete_contents, insert_line_break, resolve_caret, split_container,
    split_empty_list_item, split_subtree, wrap_loose_content,
};

/// What a paragraph-break key press did to the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakOutcome {
    /// The selection was not collapsed; it was deleted and nothing was split.
    DeletedSelection,
    Applied(BreakAction),
    /// Left for the host or another handler.
    Deferred(DeferReason),
}

impl BreakOutcome {
    /// Whether the host should suppress its own handling of the key.
    pub fn handled(&self) -> bool {
        !matches!(self, BreakOutcome::Deferred(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakAction {
    /// An empty block was created in a container that had no children.
    CreatedRootBlock,
    /// An empty list item was turned into a block outside its list.
    ListItem(ListItemPosition),
    LineBreak,
    SplitBlock,
    BlockAfter,
    BlockBefore,
    /// The enclosing container was split around an empty block.
    SplitContainer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferReason {
    DefaultPrevented,
    NestedList,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Delete,
}

pub struct Editor {
    document: Document,
    selection: Range,
    settings: Settings,
    history: UndoHistory,
    viewport: Box<dyn Viewport>,
}

impl Editor {
    /// Starts editing with the caret at the first caret-addressable spot.
    pub fn new(document: Document, settings: Settings) -> Self {
        let root = document.root();
        let mut editor = Self {
            history: UndoHistory::new(settings.undo_levels),
            document,
            selection: Range::caret(Position::new(root, 0)),
            settings,
            viewport: Box::new(NullViewport),
        };
        editor.move_to_caret_position(root);
        editor
    }

    pub fn with_selection(mut self, selection: Range) -> Self {
        self.set_selection(selection);
        self
    }

    pub fn with_viewport(mut self, viewport: Box<dyn Viewport>) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Range {
        self.selection
    }

    /// Ignores ranges that point at detached nodes or past a node's end.
    pub fn set_selection(&mut self, selection: Range) -> bool {
        if !selection.start.is_valid(&self.document) || !selection.end.is_valid(&self.document) {
            warn!("ignoring selection outside of the document");
            return false;
        }
        self.selection = selection;
        true
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn viewport(&self) -> &dyn Viewport {
        self.viewport.as_ref()
    }

    pub fn viewport_mut(&mut self) -> &mut dyn Viewport {
        self.viewport.as_mut()
    }

    /// Key-down hook: handles the paragraph-break key and marks the event
    /// so the host skips its default action.
    pub fn on_key_down(&mut self, event: &mut BreakKeyEvent) -> bool {
        let outcome = self.handle_enter(event);
        if outcome.handled() {
            event.prevent_default();
        }
        outcome.handled()
    }

    pub fn handle_enter(&mut self, event: &BreakKeyEvent) -> BreakOutcome {
        if !self.selection.collapsed() {
            debug!("selection is not collapsed, deleting it instead of breaking");
            self.exec_command(Command::Delete);
            return BreakOutcome::DeletedSelection;
        }
        if event.is_default_prevented() {
            debug!("break key already handled elsewhere");
            return BreakOutcome::Deferred(DeferReason::DefaultPrevented);
        }

        let transaction = self.history.before_change(&self.document, &self.selection);
        let outcome = self.apply_break(event.shift);
        if let BreakOutcome::Applied(action) = outcome {
            debug!("paragraph break applied: {action:?}");
            transaction.commit(&mut self.history, &self.document, &self.selection);
        }
        outcome
    }

    fn apply_break(&mut self, shift: bool) -> BreakOutcome {
        let block_tag = self.settings.block_tag();
        let mut caret = resolve_caret(&self.document, &self.settings.tags, self.selection.start);
        trace!("resolved caret to {caret:?}");

        match wrap_loose_content(
            &mut self.document,
            &self.settings.tags,
            &mut caret,
            block_tag.as_deref(),
            shift,
        ) {
            Wrap::CreatedEmpty(block) => {
                if self.settings.pad_empty_blocks {
                    let br = self.document.create_element("br");
                    self.document.append(block, br);
                }
                self.move_to_caret_position(block);
                return BreakOutcome::Applied(BreakAction::CreatedRootBlock);
            }
            Wrap::Wrapped(block) => trace!("caret content moved into {block:?}"),
            Wrap::Unchanged => {}
        }

        let tags = &self.settings.tags;
        let container = caret.node;
        let parent_block = nearest_block(&self.document, tags, container);
        let container_block = parent_block
            .and_then(|block| self.document.parent(block))
            .and_then(|parent| nearest_block(&self.document, tags, parent));
        let parent_category = parent_block.and_then(|block| category_of(&self.document, tags, block));

        if let Some(item) = parent_block.filter(|_| parent_category == Some(TagCategory::ListItem)) {
            if is_empty(&self.document, tags, item) {
                if let Some(outcome) = self.break_out_of_list(container, item, block_tag.as_deref()) {
                    return outcome;
                }
            }
        }

        if parent_category == Some(TagCategory::Preformatted) && self.settings.break_in_preformatted {
            if !shift {
                return self.insert_break(caret, parent_block);
            }
        } else if (block_tag.is_none() && !shift && parent_category != Some(TagCategory::ListItem))
            || (block_tag.is_some() && shift)
        {
            return self.insert_break(caret, parent_block);
        }

        let Some(parent_block) = parent_block else {
            warn!("caret has no enclosing block, inserting a line break");
            return self.insert_break(caret, None);
        };
        let tag = block_tag.unwrap_or_else(|| DEFAULT_BLOCK_TAG.to_string());

        let tags = &self.settings.tags;
        let (new_block, action) =
            if is_caret_at_block_boundary(&self.document, tags, caret, parent_block, false) {
                self.break_at_end(container, parent_block, container_block, &tag)
            } else if is_caret_at_block_boundary(&self.document, tags, caret, parent_block, true) {
                let block = create_new_block(
                    &mut self.document,
                    &self.settings,
                    container,
                    Some(parent_block),
                    None,
                );
                self.document.insert_before(parent_block, block);
                (block, BreakAction::BlockBefore)
            } else {
                match split_subtree(&mut self.document, parent_block, caret) {
                    Some(tail) => {
                        trim_leading_line_breaks(&mut self.document, tail);
                        (tail, BreakAction::SplitBlock)
                    }
                    None => {
                        warn!("could not split block at caret, inserting a line break");
                        return self.insert_break(caret, Some(parent_block));
                    }
                }
            };

        self.document.remove_attr(new_block, ID_ATTR);
        self.move_to_caret_position(new_block);
        BreakOutcome::Applied(action)
    }

    fn break_at_end(
        &mut self,
        container: NodeId,
        parent_block: NodeId,
        container_block: Option<NodeId>,
        tag: &str,
    ) -> (NodeId, BreakAction) {
        let tags = &self.settings.tags;
        if let Some(outer) = container_block.filter(|outer| {
            self.settings.split_container_on_empty_block
                && can_split_block(&self.document, tags, *outer)
                && is_empty(&self.document, tags, parent_block)
        }) {
            if let Some(lifted) = split_container(&mut self.document, tags, outer, parent_block) {
                return (lifted, BreakAction::SplitContainer);
            }
        }

        let promote = matches!(
            category_of(&self.document, tags, parent_block),
            Some(TagCategory::Heading | TagCategory::Preformatted)
        ) && container_block
            .and_then(|outer| category_of(&self.document, tags, outer))
            != Some(TagCategory::HeadingGroup);
        let block = create_new_block(
            &mut self.document,
            &self.settings,
            container,
            Some(parent_block),
            promote.then_some(tag),
        );
        self.document.insert_after(parent_block, block);
        (block, BreakAction::BlockAfter)
    }

    /// Moves an empty list item out of its list. `None` when the list
    /// context is missing and the regular break logic should run.
    fn break_out_of_list(
        &mut self,
        container: NodeId,
        item: NodeId,
        block_tag: Option<&str>,
    ) -> Option<BreakOutcome> {
        let tags = &self.settings.tags;
        let Some(list) = self
            .document
            .parent(item)
            .filter(|list| category_of(&self.document, tags, *list) == Some(TagCategory::List))
        else {
            warn!("list item is not inside a list");
            return None;
        };
        let nested = self
            .document
            .parent(list)
            .and_then(|outer| category_of(&self.document, tags, outer))
            .is_some_and(|category| matches!(category, TagCategory::List | TagCategory::ListItem));
        if nested {
            debug!("empty item of a nested list, leaving it to list handling");
            return Some(BreakOutcome::Deferred(DeferReason::NestedList));
        }

        let new_block = match block_tag {
            Some(tag) => {
                create_new_block(&mut self.document, &self.settings, container, Some(item), Some(tag))
            }
            None => self.document.create_element("br"),
        };
        let position = split_empty_list_item(&mut self.document, list, item, new_block);
        self.move_to_caret_position(new_block);
        Some(BreakOutcome::Applied(BreakAction::ListItem(position)))
    }

    fn insert_break(&mut self, caret: Position, parent_block: Option<NodeId>) -> BreakOutcome {
        match insert_line_break(&mut self.document, &self.settings, caret, parent_block) {
            Some(position) => self.selection = Range::caret(position),
            None => warn!("line break landed outside the document"),
        }
        BreakOutcome::Applied(BreakAction::LineBreak)
    }

    /// Runs an editing command as its own undo step.
    pub fn exec_command(&mut self, command: Command) -> bool {
        match command {
            Command::Delete => {
                if self.selection.collapsed() {
                    return false;
                }
                let transaction = self.history.before_change(&self.document, &self.selection);
                let Some(caret) = delete_contents(&mut self.document, &self.settings.tags, self.selection)
                else {
                    warn!("could not delete selection");
                    return false;
                };
                self.pad_if_empty(caret.node);
                self.selection = Range::caret(caret);
                transaction.commit(&mut self.history, &self.document, &self.selection);
                true
            }
        }
    }

    fn pad_if_empty(&mut self, node: NodeId) {
        if !self.settings.pad_empty_blocks {
            return;
        }
        let Some(block) = nearest_block(&self.document, &self.settings.tags, node) else {
            return;
        };
        let tags = &self.settings.tags;
        let has_break = self
            .document
            .descendants(block)
            .any(|node| category_of(&self.document, tags, node) == Some(TagCategory::Break));
        if is_empty(&self.document, tags, block) && !has_break {
            let br = self.document.create_element("br");
            self.document.append(block, br);
        }
    }

    /// Types `text` at the caret, replacing a non-collapsed selection.
    pub fn insert_text(&mut self, text: &str) {
        if !self.selection.collapsed() {
            self.exec_command(Command::Delete);
        }
        let transaction = self.history.before_change(&self.document, &self.selection);
        let caret = insert_text_at(&mut self.document, self.selection.start, text);
        self.selection = Range::caret(caret);
        transaction.commit(&mut self.history, &self.document, &self.selection);
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.document = snapshot.document;
        self.selection = snapshot.selection;
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;

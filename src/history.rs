use crate::document::Document;
use crate::selection::Range;

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub document: Document,
    pub selection: Range,
}

impl Snapshot {
    pub fn capture(document: &Document, selection: &Range) -> Self {
        Self {
            document: document.clone(),
            selection: *selection,
        }
    }
}

/// Linear list of committed undo levels with a cursor into it.
#[derive(Clone, Debug)]
pub struct UndoHistory {
    levels: Vec<Snapshot>,
    index: usize,
    limit: usize,
}

/// Opened by [`UndoHistory::before_change`]. Everything mutated between
/// opening and [`Transaction::commit`] becomes one undo step; a dropped
/// transaction records nothing.
#[must_use = "an uncommitted transaction records nothing"]
#[derive(Debug)]
pub struct Transaction {
    base: Snapshot,
}

impl UndoHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            levels: Vec::new(),
            index: 0,
            limit: limit.max(1),
        }
    }

    pub fn before_change(&self, document: &Document, selection: &Range) -> Transaction {
        Transaction {
            base: Snapshot::capture(document, selection),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.levels.len()
    }

    /// Number of committed steps that can be undone.
    pub fn depth(&self) -> usize {
        self.index
    }

    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.levels.get(self.index)
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.levels.get(self.index)
    }

    fn push(&mut self, base: Snapshot, after: Snapshot) -> &Snapshot {
        if self.levels.is_empty() {
            self.levels.push(base);
        } else {
            self.levels.truncate(self.index + 1);
        }
        self.levels.push(after);
        let overflow = self.levels.len().saturating_sub(self.limit + 1);
        if overflow > 0 {
            self.levels.drain(..overflow);
        }
        self.index = self.levels.len() - 1;
        &self.levels[self.index]
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Transaction {
    pub fn commit<'h>(
        self,
        history: &'h mut UndoHistory,
        document: &Document,
        selection: &Range,
    ) -> &'h Snapshot {
        history.push(self.base, Snapshot::capture(document, selection))
    }
}

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// The paragraph-break key press as seen by the editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BreakKeyEvent {
    pub shift: bool,
    default_prevented: bool,
}

impl BreakKeyEvent {
    pub fn new(shift: bool) -> Self {
        Self {
            shift,
            default_prevented: false,
        }
    }

    pub fn enter() -> Self {
        Self::new(false)
    }

    pub fn shift_enter() -> Self {
        Self::new(true)
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Maps a terminal key event; anything but a pressed Enter is `None`.
    pub fn from_key_event(event: &KeyEvent) -> Option<Self> {
        if event.code != KeyCode::Enter || event.kind == KeyEventKind::Release {
            return None;
        }
        Some(Self::new(event.modifiers.contains(KeyModifiers::SHIFT)))
    }
}

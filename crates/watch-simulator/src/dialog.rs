//! Host-rendered dialogs.
//!
//! A dialog opened by the application takes over the buttons until it is
//! answered: Up/Down move the selection, Center confirms, Back dismisses.
//! The submit callback is handed back to the caller instead of being run
//! here, so it executes after the host state is released.

use watch_sdk::ButtonType;

use crate::framebuffer::FrameBuffer;

pub type Submit = extern "C" fn(u8);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    /// OK answers 1, Back answers 0.
    Message { title: String, msg: String },
    /// Center answers the selected index, Back closes without an answer.
    Menu { title: String, items: Vec<String> },
    /// Center answers the selected value, Back closes without an answer.
    Picker { values: Vec<u8> },
}

#[derive(Debug, Clone)]
pub struct Dialog {
    pub kind: DialogKind,
    pub selected: usize,
    pub submit: Submit,
}

/// What a key did to the open dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Still open; redraw it.
    Moved,
    /// Closed with an answer for the submit callback.
    Answer(Submit, u8),
    /// Closed without an answer.
    Dismissed,
    Ignored,
}

impl Dialog {
    pub fn message(title: String, msg: String, submit: Submit) -> Self {
        Self {
            kind: DialogKind::Message { title, msg },
            selected: 0,
            submit,
        }
    }

    pub fn menu(title: String, items: Vec<String>, submit: Submit) -> Self {
        Self {
            kind: DialogKind::Menu { title, items },
            selected: 0,
            submit,
        }
    }

    /// Picker over `values`, preselecting `initial` when present.
    pub fn picker(initial: u8, values: Vec<u8>, submit: Submit) -> Self {
        let selected = values.iter().position(|&v| v == initial).unwrap_or(0);
        Self {
            kind: DialogKind::Picker { values },
            selected,
            submit,
        }
    }

    fn len(&self) -> usize {
        match &self.kind {
            DialogKind::Message { .. } => 1,
            DialogKind::Menu { items, .. } => items.len(),
            DialogKind::Picker { values } => values.len(),
        }
    }

    fn answer(&self) -> Option<u8> {
        match &self.kind {
            DialogKind::Message { .. } => Some(1),
            DialogKind::Menu { items, .. } => {
                (self.selected < items.len()).then_some(self.selected as u8)
            }
            DialogKind::Picker { values } => values.get(self.selected).copied(),
        }
    }

    pub fn on_key(&mut self, key: ButtonType) -> KeyOutcome {
        let len = self.len();
        match key {
            ButtonType::Up if len > 1 => {
                self.selected = (self.selected + len - 1) % len;
                KeyOutcome::Moved
            }
            ButtonType::Down if len > 1 => {
                self.selected = (self.selected + 1) % len;
                KeyOutcome::Moved
            }
            ButtonType::Center => match self.answer() {
                Some(value) => KeyOutcome::Answer(self.submit, value),
                None => KeyOutcome::Dismissed,
            },
            ButtonType::Back => match self.kind {
                DialogKind::Message { .. } => KeyOutcome::Answer(self.submit, 0),
                _ => KeyOutcome::Dismissed,
            },
            _ => KeyOutcome::Ignored,
        }
    }

    /// Draw the dialog box over the application's screen.
    pub fn render(&self, fb: &mut FrameBuffer) {
        const LEFT: u16 = 20;
        const TOP: u16 = 30;
        const RIGHT: u16 = 179;
        const BOTTOM: u16 = 169;
        const ROW_H: u16 = 20;

        fb.draw_rect((LEFT, TOP), (RIGHT, BOTTOM), 0xFF, 1);
        fb.draw_rect((LEFT, TOP), (RIGHT, BOTTOM), 0, 0);

        let rows: Vec<String> = match &self.kind {
            DialogKind::Message { title, msg } => {
                fb.draw_str((LEFT + 6, TOP + 4), title, 16, 0);
                fb.draw_rect_str(msg, (LEFT + 6, TOP + 28), (RIGHT - 6, BOTTOM - 30), 0);
                fb.draw_str((LEFT + 6, BOTTOM - 24), "[OK]  Back", 16, 0);
                return;
            }
            DialogKind::Menu { title, items } => {
                fb.draw_str((LEFT + 6, TOP + 4), title, 16, 0);
                items.clone()
            }
            DialogKind::Picker { values } => values.iter().map(u8::to_string).collect(),
        };

        let visible = usize::from((BOTTOM - TOP - 28) / ROW_H);
        let first = self.selected.saturating_sub(visible.saturating_sub(1));
        for (i, row) in rows.iter().enumerate().skip(first).take(visible) {
            let y = TOP + 28 + (i - first) as u16 * ROW_H;
            let marker = if i == self.selected { "> " } else { "  " };
            fb.draw_str((LEFT + 6, y), &format!("{}{}", marker, row), 16, 0);
        }
    }
}

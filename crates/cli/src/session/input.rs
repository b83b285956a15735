//! Single-line text entry and multi-field forms.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// An editable line of text with a character cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
    placeholder: &'static str,
}

impl TextInput {
    #[must_use]
    pub fn new(placeholder: &'static str) -> Self {
        Self {
            placeholder,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_value(placeholder: &'static str, value: &str) -> Self {
        let mut input = Self::new(placeholder);
        input.set_value(value);
        input
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    /// Cursor position in characters.
    #[must_use]
    pub fn caret(&self) -> usize {
        self.cursor
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    /// Applies an editing key. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let len = self.value.chars().count();

        match key.code {
            KeyCode::Char('u') if ctrl => {
                let end = self.byte_index(self.cursor);
                self.value.replace_range(..end, "");
                self.cursor = 0;
            }
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = len,
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                let at = self.byte_index(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                let at = self.byte_index(self.cursor - 1);
                self.value.remove(at);
                self.cursor -= 1;
            }
            KeyCode::Delete if self.cursor < len => {
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(len),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = len,
            KeyCode::Backspace | KeyCode::Delete => {}
            _ => return false,
        }
        true
    }
}

/// Result of feeding a key to a [`Form`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStep {
    Continue,
    Submit,
}

/// A labelled field of a [`Form`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: &'static str,
    pub input: TextInput,
}

/// An ordered set of text fields with one focused at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub fields: Vec<Field>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Form {
    /// Builds a form from `(label, placeholder)` pairs, prefilled with
    /// `values` where given.
    #[must_use]
    pub fn new(fields: &[(&'static str, &'static str)], values: &[&str]) -> Self {
        let fields = fields
            .iter()
            .enumerate()
            .map(|(i, &(label, placeholder))| Field {
                label,
                input: TextInput::with_value(placeholder, values.get(i).copied().unwrap_or_default()),
            })
            .collect();

        Self {
            fields,
            focus: 0,
            error: None,
        }
    }

    /// Trimmed value of field `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map_or("", |field| field.input.value().trim())
    }

    fn cycle(&mut self, forward: bool) {
        let count = self.fields.len().max(1);
        self.focus = if forward {
            (self.focus + 1) % count
        } else {
            (self.focus + count - 1) % count
        };
    }

    /// Tab and shift+tab cycle focus; enter advances, or submits on the
    /// last field. Anything else edits the focused field.
    pub fn handle_key(&mut self, key: &KeyEvent) -> FormStep {
        match key.code {
            KeyCode::Tab => self.cycle(true),
            KeyCode::BackTab => self.cycle(false),
            KeyCode::Enter if self.focus + 1 >= self.fields.len() => return FormStep::Submit,
            KeyCode::Enter => self.focus += 1,
            _ => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.input.handle_key(key);
                }
            }
        }
        FormStep::Continue
    }
}
